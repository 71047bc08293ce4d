// Copyright 2025 Cowboy AI, LLC.

//! Integration with the outside of the core
//!
//! Key features:
//! - Event bridge from the bus to an external notification sink
//! - Flat notifications built from fact records
//! - Per-kind callback sink and a `tracing` sink

pub mod event_bridge;
pub mod notification_sink;

pub use event_bridge::{BridgeConfig, EventBridge};
pub use notification_sink::{
    CallbackSink, Notification, NotificationCallback, NotificationSink, TracingSink,
};

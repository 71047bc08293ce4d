// Copyright 2025 Cowboy AI, LLC.

//! # Workflow Core
//!
//! Workflow aggregate, event bus and unit of work for a visual workflow
//! editor. Mutations of a workflow graph raise domain events; a unit of work
//! persists the result and only then publishes those events.
//!
//! This crate provides:
//! - **Workflow**: aggregate root over a graph of nodes and port-to-port connections
//! - **Domain Events**: immutable fact records raised by mutations
//! - **Event Bus**: process-wide publish/subscribe registry with bounded history
//! - **Unit of Work**: collect-then-publish boundary over a storage port
//! - **Event Bridge**: forwards selected facts to an external notification sink
//!
//! ## Design Principles
//!
//! 1. **Single entry point**: all graph changes go through the aggregate root
//! 2. **Notify after persist**: no fact is published before its state is saved
//! 3. **Arena + index**: nodes are keyed by id, connections reference ids
//! 4. **Isolation**: a failing subscriber never affects the publisher
//!
//! ## Example
//!
//! ```rust
//! # tokio_test::block_on(async {
//! use std::sync::Arc;
//! use workflow_core::persistence::InMemoryStore;
//! use workflow_core::{EventBus, EventBusConfig, EventKind, Position, UnitOfWork, Workflow};
//!
//! let bus = Arc::new(EventBus::new(EventBusConfig::default()));
//! let store = Arc::new(InMemoryStore::new());
//!
//! let mut workflow = Workflow::new("order intake");
//! let start = workflow.add_node("Start", Position::new(0.0, 0.0), Default::default()).unwrap();
//! let email = workflow.add_node("Email", Position::new(200.0, 0.0), Default::default()).unwrap();
//! workflow.connect(start, "out", email, "in").unwrap();
//!
//! let mut uow = UnitOfWork::new(Arc::clone(&bus), store);
//! uow.track(&mut workflow);
//! uow.commit().await.unwrap();
//!
//! let kinds: Vec<_> = bus.get_history(None, 10).iter().map(|e| e.kind()).collect();
//! assert_eq!(kinds, [EventKind::NodeAdded, EventKind::NodeAdded, EventKind::NodeConnected]);
//! # });
//! ```

#![warn(missing_docs)]

mod entity;
mod errors;
mod event_bus;
mod events;
mod identifiers;
mod unit_of_work;
pub mod integration;
pub mod persistence;
pub mod workflow;

// Re-export core types
pub use entity::{AggregateRoot, TrackedAggregate};
pub use errors::{DomainError, DomainResult};
pub use event_bus::{EventBus, EventBusConfig, EventHandler, SubscriptionId};
pub use events::{
    DomainEvent, EventKind, EventPayload,
    NodeAdded, NodeRemoved, NodeConnected, NodeDisconnected, NodeMoved, NodeConfigUpdated,
    WorkflowStarted, WorkflowCompleted, WorkflowFailed,
    NodeStarted, NodeCompleted, NodeFailed,
};
pub use identifiers::{EventId, NodeId, WorkflowId};
pub use unit_of_work::{CommitReport, UnitOfWork};
pub use workflow::{Connection, NodeConfig, Position, Workflow, WorkflowDocument, WorkflowNode};

// Copyright 2025 Cowboy AI, LLC.

//! Event bridge from the bus to an external notification sink
//!
//! The bridge subscribes to an allowlist of kinds and forwards each
//! delivered fact, flattened into a [`Notification`], to its sink. One
//! notification per fact, in delivery order, with no batching.

use super::notification_sink::{Notification, NotificationSink};
use crate::event_bus::{EventBus, SubscriptionId};
use crate::events::EventKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Configuration for the event bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Kinds forwarded to the sink
    pub kinds: Vec<EventKind>,
}

impl BridgeConfig {
    /// Forward only the given kinds
    pub fn only(kinds: impl IntoIterator<Item = EventKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    /// Forward graph changes only, no execution lifecycle facts
    pub fn graph_changes() -> Self {
        Self::only(EventKind::ALL.into_iter().filter(EventKind::is_graph_change))
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            kinds: EventKind::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Default)]
struct BridgeStats {
    forwarded: AtomicU64,
    failed: AtomicU64,
}

/// Subscription of a [`NotificationSink`] to an [`EventBus`]
///
/// Dropping the bridge detaches it.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use workflow_core::integration::{BridgeConfig, CallbackSink, EventBridge};
/// use workflow_core::{DomainEvent, EventBus, EventBusConfig, EventKind, WorkflowId};
///
/// let bus = Arc::new(EventBus::new(EventBusConfig::default()));
/// let sink = CallbackSink::new().on(EventKind::WorkflowStarted, |_| Ok(()));
/// let bridge = EventBridge::attach(
///     Arc::clone(&bus),
///     Arc::new(sink),
///     BridgeConfig::only([EventKind::WorkflowStarted]),
/// );
///
/// bus.publish(&DomainEvent::workflow_started(WorkflowId::new()));
/// assert_eq!(bridge.forwarded_count(), 1);
/// ```
pub struct EventBridge {
    bus: Arc<EventBus>,
    config: BridgeConfig,
    subscriptions: Vec<(EventKind, SubscriptionId)>,
    stats: Arc<BridgeStats>,
}

impl EventBridge {
    /// Subscribe `sink` to every kind in `config.kinds`
    ///
    /// A kind listed twice is subscribed once.
    pub fn attach(bus: Arc<EventBus>, sink: Arc<dyn NotificationSink>, config: BridgeConfig) -> Self {
        let stats = Arc::new(BridgeStats::default());
        let mut subscriptions: Vec<(EventKind, SubscriptionId)> = Vec::new();

        for &kind in &config.kinds {
            if subscriptions.iter().any(|(k, _)| *k == kind) {
                continue;
            }
            let sink = Arc::clone(&sink);
            let stats = Arc::clone(&stats);
            let id = bus.subscribe(kind, move |event| {
                let notification = Notification::from_event(event)?;
                match sink.notify(&notification) {
                    Ok(()) => {
                        stats.forwarded.fetch_add(1, Ordering::Relaxed);
                        Ok(())
                    }
                    Err(e) => {
                        stats.failed.fetch_add(1, Ordering::Relaxed);
                        Err(e.context(format!(
                            "notification sink rejected {} {}",
                            notification.kind, notification.event_id
                        )))
                    }
                }
            });
            subscriptions.push((kind, id));
        }

        debug!(kinds = subscriptions.len(), "event bridge attached");
        Self {
            bus,
            config,
            subscriptions,
            stats,
        }
    }

    /// Unsubscribe from the bus
    pub fn detach(mut self) {
        self.unsubscribe();
    }

    /// Notifications the sink accepted
    pub fn forwarded_count(&self) -> u64 {
        self.stats.forwarded.load(Ordering::Relaxed)
    }

    /// Notifications the sink rejected
    pub fn failed_count(&self) -> u64 {
        self.stats.failed.load(Ordering::Relaxed)
    }

    /// Bridge configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// True while subscribed to at least one kind
    pub fn is_attached(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    fn unsubscribe(&mut self) {
        if self.subscriptions.is_empty() {
            return;
        }
        for (kind, id) in self.subscriptions.drain(..) {
            self.bus.unsubscribe(kind, id);
        }
        debug!(
            forwarded = self.forwarded_count(),
            failed = self.failed_count(),
            "event bridge detached"
        );
    }
}

impl Drop for EventBridge {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for EventBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBridge")
            .field("config", &self.config)
            .field("attached", &self.is_attached())
            .field("stats", &self.stats)
            .finish()
    }
}

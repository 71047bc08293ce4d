// Copyright 2025 Cowboy AI, LLC.

//! Process-wide publish/subscribe registry for fact records
//!
//! One `RwLock` guards the handler registry and both history rings. The
//! lock is held only to register, unregister, record history and snapshot
//! the handler list; handlers themselves run after it is released, so a
//! handler may subscribe, unsubscribe or publish without deadlocking.
//!
//! Handlers are synchronous and run inline on the publishing thread. A
//! handler that returns `Err` or panics is logged and skipped; the
//! remaining handlers still run and the publisher never sees the failure.

use crate::events::{DomainEvent, EventKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error};

/// Handler invoked for each delivered fact
pub type EventHandler = Arc<dyn Fn(&DomainEvent) -> anyhow::Result<()> + Send + Sync>;

/// Token identifying one registration, returned by `subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Configuration for the event bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventBusConfig {
    /// Events kept per kind
    pub max_history_per_kind: usize,

    /// Events kept across all kinds
    pub max_global_history: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            max_history_per_kind: 100,
            max_global_history: 1000,
        }
    }
}

struct Registration {
    id: SubscriptionId,
    handler: EventHandler,
}

#[derive(Default)]
struct BusState {
    handlers: HashMap<EventKind, Vec<Registration>>,
    wildcard: Vec<Registration>,
    history: VecDeque<DomainEvent>,
    history_by_kind: HashMap<EventKind, VecDeque<DomainEvent>>,
    next_subscription: u64,
    published: u64,
}

impl BusState {
    fn next_id(&mut self) -> SubscriptionId {
        self.next_subscription += 1;
        SubscriptionId(self.next_subscription)
    }

    fn record(&mut self, event: &DomainEvent, config: &EventBusConfig) {
        self.published += 1;
        push_bounded(&mut self.history, event, config.max_global_history);
        push_bounded(
            self.history_by_kind.entry(event.kind()).or_default(),
            event,
            config.max_history_per_kind,
        );
    }

    fn targets(&self, kind: EventKind) -> Vec<(SubscriptionId, EventHandler)> {
        self.handlers
            .get(&kind)
            .into_iter()
            .flatten()
            .chain(self.wildcard.iter())
            .map(|r| (r.id, Arc::clone(&r.handler)))
            .collect()
    }
}

fn push_bounded(ring: &mut VecDeque<DomainEvent>, event: &DomainEvent, capacity: usize) {
    if capacity == 0 {
        return;
    }
    while ring.len() >= capacity {
        ring.pop_front();
    }
    ring.push_back(event.clone());
}

/// Thread-safe publish/subscribe registry keyed by [`EventKind`]
///
/// # Examples
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use workflow_core::{DomainEvent, EventBus, EventBusConfig, EventKind, WorkflowId};
///
/// let bus = EventBus::new(EventBusConfig::default());
/// let seen = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&seen);
/// bus.subscribe(EventKind::WorkflowStarted, move |_| {
///     counter.fetch_add(1, Ordering::SeqCst);
///     Ok(())
/// });
///
/// bus.publish(&DomainEvent::workflow_started(WorkflowId::new()));
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
/// assert_eq!(bus.get_history(None, 10).len(), 1);
/// ```
pub struct EventBus {
    config: EventBusConfig,
    state: RwLock<BusState>,
}

static GLOBAL_BUS: OnceLock<Arc<EventBus>> = OnceLock::new();

impl EventBus {
    /// Create an isolated bus
    pub fn new(config: EventBusConfig) -> Self {
        Self {
            config,
            state: RwLock::new(BusState::default()),
        }
    }

    /// The process-wide bus, created with default config on first use
    pub fn global() -> Arc<EventBus> {
        Arc::clone(GLOBAL_BUS.get_or_init(|| Arc::new(EventBus::new(EventBusConfig::default()))))
    }

    /// Bus configuration
    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    /// Register a handler for one kind
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&DomainEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut state = self.write();
        let id = state.next_id();
        state.handlers.entry(kind).or_default().push(Registration {
            id,
            handler: Arc::new(handler),
        });
        debug!(subscription = %id, event_kind = %kind, "handler subscribed");
        id
    }

    /// Remove a handler registered for `kind`; false if it was not there
    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) -> bool {
        let mut state = self.write();
        let Some(registrations) = state.handlers.get_mut(&kind) else {
            return false;
        };
        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        let removed = registrations.len() != before;
        if registrations.is_empty() {
            state.handlers.remove(&kind);
        }
        removed
    }

    /// Register a handler invoked for every kind
    pub fn subscribe_all<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&DomainEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut state = self.write();
        let id = state.next_id();
        state.wildcard.push(Registration {
            id,
            handler: Arc::new(handler),
        });
        debug!(subscription = %id, "wildcard handler subscribed");
        id
    }

    /// Remove a wildcard handler; false if it was not there
    pub fn unsubscribe_all(&self, id: SubscriptionId) -> bool {
        let mut state = self.write();
        let before = state.wildcard.len();
        state.wildcard.retain(|r| r.id != id);
        state.wildcard.len() != before
    }

    /// Deliver a fact to the kind's handlers, then to wildcard handlers
    pub fn publish(&self, event: &DomainEvent) {
        let kind = event.kind();
        let targets = {
            let mut state = self.write();
            state.record(event, &self.config);
            state.targets(kind)
        };

        debug!(
            event_id = %event.event_id,
            event_kind = %kind,
            handlers = targets.len(),
            "publishing event"
        );

        for (id, handler) in targets {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(
                    subscription = %id,
                    event_id = %event.event_id,
                    event_kind = %kind,
                    error = %e,
                    "event handler failed"
                ),
                Err(payload) => error!(
                    subscription = %id,
                    event_id = %event.event_id,
                    event_kind = %kind,
                    panic = panic_message(payload.as_ref()),
                    "event handler panicked"
                ),
            }
        }
    }

    /// Most recent `limit` events, oldest first, optionally of one kind
    pub fn get_history(&self, kind: Option<EventKind>, limit: usize) -> Vec<DomainEvent> {
        let state = self.read();
        let ring = match kind {
            Some(kind) => match state.history_by_kind.get(&kind) {
                Some(ring) => ring,
                None => return Vec::new(),
            },
            None => &state.history,
        };
        let skip = ring.len().saturating_sub(limit);
        ring.iter().skip(skip).cloned().collect()
    }

    /// Handlers registered for one kind
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.read().handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Wildcard handlers registered
    pub fn wildcard_count(&self) -> usize {
        self.read().wildcard.len()
    }

    /// Total facts ever published, independent of history bounds
    pub fn published_count(&self) -> u64 {
        self.read().published
    }

    /// Drop all history, keep handlers
    pub fn clear_history(&self) {
        let mut state = self.write();
        state.history.clear();
        state.history_by_kind.clear();
    }

    /// Drop all handlers and history
    ///
    /// Subscription ids are not reused after a reset.
    pub fn reset(&self) {
        let mut state = self.write();
        state.handlers.clear();
        state.wildcard.clear();
        state.history.clear();
        state.history_by_kind.clear();
        state.published = 0;
        debug!("event bus reset");
    }

    fn read(&self) -> RwLockReadGuard<'_, BusState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BusState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("EventBus")
            .field("config", &self.config)
            .field("kinds_subscribed", &state.handlers.len())
            .field("wildcard_handlers", &state.wildcard.len())
            .field("history_len", &state.history.len())
            .field("published", &state.published)
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::{NodeId, WorkflowId};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> EventHandler) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_for = Arc::clone(&log);
        let make = move |tag: &str| -> EventHandler {
            let log = Arc::clone(&log_for);
            let tag = tag.to_string();
            Arc::new(move |event: &DomainEvent| -> anyhow::Result<()> {
                log.lock().unwrap().push(format!("{tag}:{}", event.kind()));
                Ok(())
            })
        };
        (log, make)
    }

    #[test]
    fn test_kind_handlers_then_wildcards_in_registration_order() {
        let bus = EventBus::default();
        let (log, make) = recorder();

        let w1 = make("w1");
        bus.subscribe_all(move |e| w1(e));
        let k1 = make("k1");
        bus.subscribe(EventKind::WorkflowStarted, move |e| k1(e));
        let k2 = make("k2");
        bus.subscribe(EventKind::WorkflowStarted, move |e| k2(e));
        let w2 = make("w2");
        bus.subscribe_all(move |e| w2(e));
        let other = make("other");
        bus.subscribe(EventKind::NodeFailed, move |e| other(e));

        bus.publish(&DomainEvent::workflow_started(WorkflowId::new()));

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "k1:WorkflowStarted",
                "k2:WorkflowStarted",
                "w1:WorkflowStarted",
                "w2:WorkflowStarted",
            ]
        );
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = EventBus::default();
        let (log, make) = recorder();
        let h = make("h");
        let id = bus.subscribe(EventKind::WorkflowStarted, move |e| h(e));
        let w = make("w");
        let wid = bus.subscribe_all(move |e| w(e));

        assert!(bus.unsubscribe(EventKind::WorkflowStarted, id));
        assert!(!bus.unsubscribe(EventKind::WorkflowStarted, id));
        assert!(!bus.unsubscribe(EventKind::NodeAdded, wid));
        assert!(bus.unsubscribe_all(wid));
        assert_eq!(bus.handler_count(EventKind::WorkflowStarted), 0);
        assert_eq!(bus.wildcard_count(), 0);

        bus.publish(&DomainEvent::workflow_started(WorkflowId::new()));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failing_and_panicking_handlers_are_isolated() {
        let bus = EventBus::default();
        let (log, make) = recorder();

        bus.subscribe(EventKind::NodeStarted, |_| anyhow::bail!("sink offline"));
        bus.subscribe(EventKind::NodeStarted, |_| panic!("handler bug"));
        let after = make("after");
        bus.subscribe(EventKind::NodeStarted, move |e| after(e));

        bus.publish(&DomainEvent::node_started(WorkflowId::new(), NodeId::new()));

        assert_eq!(*log.lock().unwrap(), vec!["after:NodeStarted"]);
        assert_eq!(bus.published_count(), 1);
    }

    #[test]
    fn test_history_is_bounded_and_filtered() {
        let bus = EventBus::new(EventBusConfig {
            max_history_per_kind: 2,
            max_global_history: 3,
        });
        let wf = WorkflowId::new();
        let events: Vec<_> = (0..4).map(|i| DomainEvent::workflow_completed(wf, i)).collect();
        for event in &events {
            bus.publish(event);
        }
        let failed = DomainEvent::workflow_failed(wf, "x");
        bus.publish(&failed);

        assert_eq!(
            bus.get_history(None, 10),
            vec![events[2].clone(), events[3].clone(), failed.clone()]
        );
        assert_eq!(
            bus.get_history(Some(EventKind::WorkflowCompleted), 10),
            vec![events[2].clone(), events[3].clone()]
        );
        assert_eq!(bus.get_history(None, 1), vec![failed]);
        assert!(bus.get_history(Some(EventKind::NodeAdded), 10).is_empty());
        assert_eq!(bus.published_count(), 5);
    }

    #[test]
    fn test_handler_may_subscribe_during_publish() {
        let bus = Arc::new(EventBus::default());
        let inner = Arc::clone(&bus);
        bus.subscribe(EventKind::WorkflowStarted, move |_| {
            inner.subscribe(EventKind::WorkflowCompleted, |_| Ok(()));
            Ok(())
        });

        bus.publish(&DomainEvent::workflow_started(WorkflowId::new()));
        assert_eq!(bus.handler_count(EventKind::WorkflowCompleted), 1);
    }

    #[test]
    fn test_concurrent_publish_and_subscribe() {
        let bus = Arc::new(EventBus::new(EventBusConfig {
            max_history_per_kind: 10_000,
            max_global_history: 10_000,
        }));
        let wf = WorkflowId::new();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let bus = Arc::clone(&bus);
                scope.spawn(move || {
                    for _ in 0..250 {
                        bus.publish(&DomainEvent::workflow_started(wf));
                    }
                });
            }
            let bus = Arc::clone(&bus);
            scope.spawn(move || {
                for _ in 0..100 {
                    let id = bus.subscribe(EventKind::WorkflowStarted, |_| Ok(()));
                    bus.unsubscribe(EventKind::WorkflowStarted, id);
                }
            });
        });

        assert_eq!(bus.published_count(), 1000);
        assert_eq!(bus.get_history(None, usize::MAX).len(), 1000);
        assert_eq!(bus.handler_count(EventKind::WorkflowStarted), 0);
    }

    #[test]
    fn test_reset_and_clear_history() {
        let bus = EventBus::default();
        bus.subscribe(EventKind::WorkflowStarted, |_| Ok(()));
        bus.subscribe_all(|_| Ok(()));
        bus.publish(&DomainEvent::workflow_started(WorkflowId::new()));

        bus.clear_history();
        assert!(bus.get_history(None, 10).is_empty());
        assert_eq!(bus.handler_count(EventKind::WorkflowStarted), 1);

        let before = bus.subscribe_all(|_| Ok(()));
        bus.reset();
        assert_eq!(bus.wildcard_count(), 0);
        assert_eq!(bus.published_count(), 0);
        let after = bus.subscribe_all(|_| Ok(()));
        assert!(after > before);
    }

    #[test]
    fn test_global_is_shared() {
        let a = EventBus::global();
        let b = EventBus::global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}

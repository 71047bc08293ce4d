// Copyright 2025 Cowboy AI, LLC.

//! Notifications and the sinks that receive them
//!
//! A [`Notification`] is the flat, transport-neutral rendering of one fact.
//! Sinks are owned by the UI or logging layer; this module only defines the
//! contract and two small implementations.

use crate::errors::{DomainError, DomainResult};
use crate::events::{DomainEvent, EventKind};
use crate::identifiers::{EventId, NodeId, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use tracing::info;

/// Flat rendering of one fact for an external sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Kind of the originating fact
    pub kind: EventKind,
    /// Id of the originating fact
    pub event_id: EventId,
    /// When the fact occurred
    pub occurred_at: DateTime<Utc>,
    /// Workflow the fact belongs to
    pub workflow_id: WorkflowId,
    /// Node concerned, for node and connection facts
    pub node_id: Option<NodeId>,
    /// Remaining payload fields; nested objects use dotted keys
    pub fields: Map<String, Value>,
}

impl Notification {
    /// Flatten a fact
    ///
    /// `workflow_id` and `node_id` are lifted out of the payload. Nested
    /// objects such as positions become `position.x` and `position.y`.
    pub fn from_event(event: &DomainEvent) -> DomainResult<Self> {
        let mut envelope = serde_json::to_value(&event.payload)?;
        let data = match envelope.get_mut("data").map(Value::take) {
            Some(Value::Object(data)) => data,
            _ => {
                return Err(DomainError::SerializationError(format!(
                    "payload of {} is not an object",
                    event.kind()
                )))
            }
        };

        let mut fields = Map::new();
        for (key, value) in data {
            if key == "workflow_id" || key == "node_id" {
                continue;
            }
            flatten_into(&mut fields, key, value);
        }

        Ok(Self {
            kind: event.kind(),
            event_id: event.event_id,
            occurred_at: event.occurred_at,
            workflow_id: event.workflow_id(),
            node_id: event.node_id(),
            fields,
        })
    }

    /// Field by flattened key
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

fn flatten_into(out: &mut Map<String, Value>, prefix: String, value: Value) {
    match value {
        Value::Object(inner) if !inner.is_empty() => {
            for (key, value) in inner {
                flatten_into(out, format!("{prefix}.{key}"), value);
            }
        }
        other => {
            out.insert(prefix, other);
        }
    }
}

/// Receiver of bridged notifications
///
/// Called synchronously on the publishing thread, once per fact.
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification
    fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Callback registered for one kind on a [`CallbackSink`]
pub type NotificationCallback = Box<dyn Fn(&Notification) -> anyhow::Result<()> + Send + Sync>;

/// Sink with one callback per kind
///
/// Notifications of a kind without a callback are ignored.
///
/// # Examples
///
/// ```rust
/// use workflow_core::integration::{CallbackSink, Notification, NotificationSink};
/// use workflow_core::{DomainEvent, EventKind, WorkflowId};
///
/// let sink = CallbackSink::new().on(EventKind::WorkflowStarted, |n| {
///     assert_eq!(n.kind, EventKind::WorkflowStarted);
///     Ok(())
/// });
///
/// let event = DomainEvent::workflow_started(WorkflowId::new());
/// sink.notify(&Notification::from_event(&event).unwrap()).unwrap();
/// ```
#[derive(Default)]
pub struct CallbackSink {
    callbacks: HashMap<EventKind, NotificationCallback>,
}

impl CallbackSink {
    /// Create a sink with no callbacks
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the callback for `kind`, replacing any previous one
    pub fn on<F>(mut self, kind: EventKind, callback: F) -> Self
    where
        F: Fn(&Notification) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callbacks.insert(kind, Box::new(callback));
        self
    }

    /// True when a callback exists for `kind`
    pub fn handles(&self, kind: EventKind) -> bool {
        self.callbacks.contains_key(&kind)
    }

    /// Kinds with a callback, in `EventKind::ALL` order
    pub fn registered_kinds(&self) -> Vec<EventKind> {
        EventKind::ALL
            .iter()
            .copied()
            .filter(|k| self.handles(*k))
            .collect()
    }
}

impl NotificationSink for CallbackSink {
    fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        match self.callbacks.get(&notification.kind) {
            Some(callback) => callback(notification),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for CallbackSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSink")
            .field("kinds", &self.registered_kinds())
            .finish()
    }
}

/// Sink that writes each notification as a `tracing` event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        let fields = serde_json::Value::Object(notification.fields.clone());
        info!(
            kind = %notification.kind,
            event_id = %notification.event_id,
            workflow_id = %notification.workflow_id,
            node_id = ?notification.node_id,
            fields = %fields,
            "workflow notification"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{Connection, Position};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_node_added_is_flattened() {
        let wf = WorkflowId::new();
        let node = NodeId::new();
        let event = DomainEvent::node_added(wf, node, "Email", Position::new(3.0, 4.0));

        let n = Notification::from_event(&event).unwrap();
        assert_eq!(n.kind, EventKind::NodeAdded);
        assert_eq!(n.event_id, event.event_id);
        assert_eq!(n.workflow_id, wf);
        assert_eq!(n.node_id, Some(node));
        assert_eq!(n.field("node_type"), Some(&json!("Email")));
        assert_eq!(n.field("position.x"), Some(&json!(3.0)));
        assert_eq!(n.field("position.y"), Some(&json!(4.0)));
        assert!(n.field("workflow_id").is_none());
        assert!(n.field("node_id").is_none());
    }

    #[test]
    fn test_connection_fields_are_kept() {
        let wf = WorkflowId::new();
        let conn = Connection::new(NodeId::new(), "out", NodeId::new(), "in");
        let n = Notification::from_event(&DomainEvent::node_connected(wf, &conn)).unwrap();

        assert_eq!(n.node_id, Some(conn.source_node));
        assert_eq!(n.field("source_port"), Some(&json!("out")));
        assert_eq!(n.field("target_node"), Some(&json!(conn.target_node.to_string())));
    }

    #[test]
    fn test_workflow_fact_has_no_node() {
        let n = Notification::from_event(&DomainEvent::workflow_failed(WorkflowId::new(), "boom"))
            .unwrap();
        assert_eq!(n.node_id, None);
        assert_eq!(n.field("error"), Some(&json!("boom")));
    }

    #[test]
    fn test_callback_sink_dispatches_by_kind() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let sink = CallbackSink::new().on(EventKind::NodeFailed, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(sink.registered_kinds(), vec![EventKind::NodeFailed]);

        let wf = WorkflowId::new();
        let failed = DomainEvent::node_failed(wf, NodeId::new(), "timeout");
        let started = DomainEvent::workflow_started(wf);
        sink.notify(&Notification::from_event(&failed).unwrap()).unwrap();
        sink.notify(&Notification::from_event(&started).unwrap()).unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_tracing_sink_accepts_everything() {
        let event = DomainEvent::workflow_completed(WorkflowId::new(), 12);
        assert!(TracingSink.notify(&Notification::from_event(&event).unwrap()).is_ok());
    }
}

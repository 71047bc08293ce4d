// Copyright (c) 2025 - Cowboy AI, LLC.

//! Domain events for workflow graphs
//!
//! Events represent facts that have occurred. They are immutable values,
//! built once at the point of the mutation that caused them and never
//! changed afterwards. Two events are equal when their id, timestamp and
//! payload are equal.
//!
//! Graph facts (`NodeAdded`, `NodeConnected`, ...) are raised by the
//! [`Workflow`](crate::Workflow) aggregate. Execution lifecycle facts
//! (`WorkflowStarted`, `NodeFailed`, ...) are reported by the step runtime,
//! which lives outside this crate, and travel over the same bus.

use crate::identifiers::{EventId, NodeId, WorkflowId};
use crate::workflow::{Connection, Position};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Tag naming the kind of a fact; the unit of subscription on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum EventKind {
    /// A node was added to a workflow
    NodeAdded,
    /// A node was removed from a workflow
    NodeRemoved,
    /// Two node ports were connected
    NodeConnected,
    /// A connection between two node ports was removed
    NodeDisconnected,
    /// A node changed position on the canvas
    NodeMoved,
    /// One configuration key of a node changed
    NodeConfigUpdated,
    /// A workflow run started
    WorkflowStarted,
    /// A workflow run finished successfully
    WorkflowCompleted,
    /// A workflow run failed
    WorkflowFailed,
    /// A node began executing
    NodeStarted,
    /// A node finished executing
    NodeCompleted,
    /// A node failed while executing
    NodeFailed,
}

impl EventKind {
    /// Every kind, in declaration order
    pub const ALL: [EventKind; 12] = [
        EventKind::NodeAdded,
        EventKind::NodeRemoved,
        EventKind::NodeConnected,
        EventKind::NodeDisconnected,
        EventKind::NodeMoved,
        EventKind::NodeConfigUpdated,
        EventKind::WorkflowStarted,
        EventKind::WorkflowCompleted,
        EventKind::WorkflowFailed,
        EventKind::NodeStarted,
        EventKind::NodeCompleted,
        EventKind::NodeFailed,
    ];

    /// Stable name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::NodeAdded => "NodeAdded",
            EventKind::NodeRemoved => "NodeRemoved",
            EventKind::NodeConnected => "NodeConnected",
            EventKind::NodeDisconnected => "NodeDisconnected",
            EventKind::NodeMoved => "NodeMoved",
            EventKind::NodeConfigUpdated => "NodeConfigUpdated",
            EventKind::WorkflowStarted => "WorkflowStarted",
            EventKind::WorkflowCompleted => "WorkflowCompleted",
            EventKind::WorkflowFailed => "WorkflowFailed",
            EventKind::NodeStarted => "NodeStarted",
            EventKind::NodeCompleted => "NodeCompleted",
            EventKind::NodeFailed => "NodeFailed",
        }
    }

    /// True for kinds raised by graph mutations on the aggregate
    pub fn is_graph_change(&self) -> bool {
        matches!(
            self,
            EventKind::NodeAdded
                | EventKind::NodeRemoved
                | EventKind::NodeConnected
                | EventKind::NodeDisconnected
                | EventKind::NodeMoved
                | EventKind::NodeConfigUpdated
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node added event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeAdded {
    /// The workflow the node was added to
    pub workflow_id: WorkflowId,
    /// The new node
    pub node_id: NodeId,
    /// Opaque step type tag (e.g. "Click", "Start")
    pub node_type: String,
    /// Initial layout position
    pub position: Position,
}

/// Node removed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeRemoved {
    /// The workflow the node was removed from
    pub workflow_id: WorkflowId,
    /// The removed node
    pub node_id: NodeId,
}

/// Ports connected event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeConnected {
    /// The workflow owning both nodes
    pub workflow_id: WorkflowId,
    /// Source node
    pub source_node: NodeId,
    /// Output port on the source node
    pub source_port: String,
    /// Target node
    pub target_node: NodeId,
    /// Input port on the target node
    pub target_port: String,
}

/// Ports disconnected event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeDisconnected {
    /// The workflow owning both nodes
    pub workflow_id: WorkflowId,
    /// Source node
    pub source_node: NodeId,
    /// Output port on the source node
    pub source_port: String,
    /// Target node
    pub target_node: NodeId,
    /// Input port on the target node
    pub target_port: String,
}

/// Node moved event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeMoved {
    /// The workflow owning the node
    pub workflow_id: WorkflowId,
    /// The moved node
    pub node_id: NodeId,
    /// Position before the move
    pub old_position: Position,
    /// Position after the move
    pub new_position: Position,
}

/// Node configuration updated event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeConfigUpdated {
    /// The workflow owning the node
    pub workflow_id: WorkflowId,
    /// The updated node
    pub node_id: NodeId,
    /// Configuration key that changed
    pub key: String,
    /// New value for the key
    pub value: serde_json::Value,
}

/// Workflow run started event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WorkflowStarted {
    /// The workflow being run
    pub workflow_id: WorkflowId,
}

/// Workflow run completed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WorkflowCompleted {
    /// The workflow that finished
    pub workflow_id: WorkflowId,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
}

/// Workflow run failed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WorkflowFailed {
    /// The workflow that failed
    pub workflow_id: WorkflowId,
    /// Error reported by the runtime
    pub error: String,
}

/// Node execution started event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeStarted {
    /// The workflow being run
    pub workflow_id: WorkflowId,
    /// The node that started
    pub node_id: NodeId,
}

/// Node execution completed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeCompleted {
    /// The workflow being run
    pub workflow_id: WorkflowId,
    /// The node that completed
    pub node_id: NodeId,
}

/// Node execution failed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeFailed {
    /// The workflow being run
    pub workflow_id: WorkflowId,
    /// The node that failed
    pub node_id: NodeId,
    /// Error reported by the step
    pub error: String,
}

/// Kind-specific fields of a fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "data")]
pub enum EventPayload {
    /// See [`NodeAdded`]
    NodeAdded(NodeAdded),
    /// See [`NodeRemoved`]
    NodeRemoved(NodeRemoved),
    /// See [`NodeConnected`]
    NodeConnected(NodeConnected),
    /// See [`NodeDisconnected`]
    NodeDisconnected(NodeDisconnected),
    /// See [`NodeMoved`]
    NodeMoved(NodeMoved),
    /// See [`NodeConfigUpdated`]
    NodeConfigUpdated(NodeConfigUpdated),
    /// See [`WorkflowStarted`]
    WorkflowStarted(WorkflowStarted),
    /// See [`WorkflowCompleted`]
    WorkflowCompleted(WorkflowCompleted),
    /// See [`WorkflowFailed`]
    WorkflowFailed(WorkflowFailed),
    /// See [`NodeStarted`]
    NodeStarted(NodeStarted),
    /// See [`NodeCompleted`]
    NodeCompleted(NodeCompleted),
    /// See [`NodeFailed`]
    NodeFailed(NodeFailed),
}

impl EventPayload {
    /// Kind tag of this payload
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::NodeAdded(_) => EventKind::NodeAdded,
            EventPayload::NodeRemoved(_) => EventKind::NodeRemoved,
            EventPayload::NodeConnected(_) => EventKind::NodeConnected,
            EventPayload::NodeDisconnected(_) => EventKind::NodeDisconnected,
            EventPayload::NodeMoved(_) => EventKind::NodeMoved,
            EventPayload::NodeConfigUpdated(_) => EventKind::NodeConfigUpdated,
            EventPayload::WorkflowStarted(_) => EventKind::WorkflowStarted,
            EventPayload::WorkflowCompleted(_) => EventKind::WorkflowCompleted,
            EventPayload::WorkflowFailed(_) => EventKind::WorkflowFailed,
            EventPayload::NodeStarted(_) => EventKind::NodeStarted,
            EventPayload::NodeCompleted(_) => EventKind::NodeCompleted,
            EventPayload::NodeFailed(_) => EventKind::NodeFailed,
        }
    }

    /// Workflow the fact belongs to
    pub fn workflow_id(&self) -> WorkflowId {
        match self {
            EventPayload::NodeAdded(e) => e.workflow_id,
            EventPayload::NodeRemoved(e) => e.workflow_id,
            EventPayload::NodeConnected(e) => e.workflow_id,
            EventPayload::NodeDisconnected(e) => e.workflow_id,
            EventPayload::NodeMoved(e) => e.workflow_id,
            EventPayload::NodeConfigUpdated(e) => e.workflow_id,
            EventPayload::WorkflowStarted(e) => e.workflow_id,
            EventPayload::WorkflowCompleted(e) => e.workflow_id,
            EventPayload::WorkflowFailed(e) => e.workflow_id,
            EventPayload::NodeStarted(e) => e.workflow_id,
            EventPayload::NodeCompleted(e) => e.workflow_id,
            EventPayload::NodeFailed(e) => e.workflow_id,
        }
    }

    /// Node the fact is primarily about, if any
    ///
    /// Connection facts report their source node.
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            EventPayload::NodeAdded(e) => Some(e.node_id),
            EventPayload::NodeRemoved(e) => Some(e.node_id),
            EventPayload::NodeConnected(e) => Some(e.source_node),
            EventPayload::NodeDisconnected(e) => Some(e.source_node),
            EventPayload::NodeMoved(e) => Some(e.node_id),
            EventPayload::NodeConfigUpdated(e) => Some(e.node_id),
            EventPayload::NodeStarted(e) => Some(e.node_id),
            EventPayload::NodeCompleted(e) => Some(e.node_id),
            EventPayload::NodeFailed(e) => Some(e.node_id),
            EventPayload::WorkflowStarted(_)
            | EventPayload::WorkflowCompleted(_)
            | EventPayload::WorkflowFailed(_) => None,
        }
    }
}

/// An immutable fact record
///
/// # Examples
///
/// ```rust
/// use workflow_core::{DomainEvent, EventKind, WorkflowId};
///
/// let workflow_id = WorkflowId::new();
/// let event = DomainEvent::workflow_started(workflow_id);
///
/// assert_eq!(event.kind(), EventKind::WorkflowStarted);
/// assert_eq!(event.workflow_id(), workflow_id);
/// assert_eq!(event.event_type(), "WorkflowStarted");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DomainEvent {
    /// Unique id of this fact
    pub event_id: EventId,
    /// When the fact was recorded
    pub occurred_at: DateTime<Utc>,
    /// Kind-specific fields
    pub payload: EventPayload,
}

impl DomainEvent {
    /// Record a new fact now
    pub fn new(payload: EventPayload) -> Self {
        Self {
            event_id: EventId::new(),
            occurred_at: Utc::now(),
            payload,
        }
    }

    /// Kind tag used for subscriptions
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Get the schema version
    pub fn version(&self) -> &'static str {
        "v1"
    }

    /// Workflow this fact relates to
    pub fn workflow_id(&self) -> WorkflowId {
        self.payload.workflow_id()
    }

    /// Get the aggregate ID this event relates to
    pub fn aggregate_id(&self) -> Uuid {
        self.workflow_id().into()
    }

    /// Node this fact is primarily about, if any
    pub fn node_id(&self) -> Option<NodeId> {
        self.payload.node_id()
    }

    pub(crate) fn node_added(
        workflow_id: WorkflowId,
        node_id: NodeId,
        node_type: &str,
        position: Position,
    ) -> Self {
        Self::new(EventPayload::NodeAdded(NodeAdded {
            workflow_id,
            node_id,
            node_type: node_type.to_string(),
            position,
        }))
    }

    pub(crate) fn node_removed(workflow_id: WorkflowId, node_id: NodeId) -> Self {
        Self::new(EventPayload::NodeRemoved(NodeRemoved {
            workflow_id,
            node_id,
        }))
    }

    pub(crate) fn node_connected(workflow_id: WorkflowId, connection: &Connection) -> Self {
        Self::new(EventPayload::NodeConnected(NodeConnected {
            workflow_id,
            source_node: connection.source_node,
            source_port: connection.source_port.clone(),
            target_node: connection.target_node,
            target_port: connection.target_port.clone(),
        }))
    }

    pub(crate) fn node_disconnected(workflow_id: WorkflowId, connection: &Connection) -> Self {
        Self::new(EventPayload::NodeDisconnected(NodeDisconnected {
            workflow_id,
            source_node: connection.source_node,
            source_port: connection.source_port.clone(),
            target_node: connection.target_node,
            target_port: connection.target_port.clone(),
        }))
    }

    pub(crate) fn node_moved(
        workflow_id: WorkflowId,
        node_id: NodeId,
        old_position: Position,
        new_position: Position,
    ) -> Self {
        Self::new(EventPayload::NodeMoved(NodeMoved {
            workflow_id,
            node_id,
            old_position,
            new_position,
        }))
    }

    pub(crate) fn node_config_updated(
        workflow_id: WorkflowId,
        node_id: NodeId,
        key: &str,
        value: serde_json::Value,
    ) -> Self {
        Self::new(EventPayload::NodeConfigUpdated(NodeConfigUpdated {
            workflow_id,
            node_id,
            key: key.to_string(),
            value,
        }))
    }

    /// A workflow run started
    pub fn workflow_started(workflow_id: WorkflowId) -> Self {
        Self::new(EventPayload::WorkflowStarted(WorkflowStarted { workflow_id }))
    }

    /// A workflow run completed after `duration_ms`
    pub fn workflow_completed(workflow_id: WorkflowId, duration_ms: u64) -> Self {
        Self::new(EventPayload::WorkflowCompleted(WorkflowCompleted {
            workflow_id,
            duration_ms,
        }))
    }

    /// A workflow run failed
    pub fn workflow_failed(workflow_id: WorkflowId, error: impl Into<String>) -> Self {
        Self::new(EventPayload::WorkflowFailed(WorkflowFailed {
            workflow_id,
            error: error.into(),
        }))
    }

    /// A node began executing
    pub fn node_started(workflow_id: WorkflowId, node_id: NodeId) -> Self {
        Self::new(EventPayload::NodeStarted(NodeStarted {
            workflow_id,
            node_id,
        }))
    }

    /// A node finished executing
    pub fn node_completed(workflow_id: WorkflowId, node_id: NodeId) -> Self {
        Self::new(EventPayload::NodeCompleted(NodeCompleted {
            workflow_id,
            node_id,
        }))
    }

    /// A node failed while executing
    pub fn node_failed(workflow_id: WorkflowId, node_id: NodeId, error: impl Into<String>) -> Self {
        Self::new(EventPayload::NodeFailed(NodeFailed {
            workflow_id,
            node_id,
            error: error.into(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_payload() {
        let wf = WorkflowId::new();
        let node = NodeId::new();

        let events = [
            (DomainEvent::workflow_started(wf), EventKind::WorkflowStarted),
            (DomainEvent::workflow_completed(wf, 12), EventKind::WorkflowCompleted),
            (DomainEvent::workflow_failed(wf, "boom"), EventKind::WorkflowFailed),
            (DomainEvent::node_started(wf, node), EventKind::NodeStarted),
            (DomainEvent::node_completed(wf, node), EventKind::NodeCompleted),
            (DomainEvent::node_failed(wf, node, "timeout"), EventKind::NodeFailed),
            (DomainEvent::node_removed(wf, node), EventKind::NodeRemoved),
        ];

        for (event, kind) in events {
            assert_eq!(event.kind(), kind);
            assert_eq!(event.workflow_id(), wf);
            assert_eq!(event.event_type(), kind.as_str());
        }
    }

    #[test]
    fn test_node_id_accessor() {
        let wf = WorkflowId::new();
        let node = NodeId::new();
        assert_eq!(DomainEvent::node_started(wf, node).node_id(), Some(node));
        assert_eq!(DomainEvent::workflow_started(wf).node_id(), None);
    }

    #[test]
    fn test_event_ids_are_unique() {
        let wf = WorkflowId::new();
        let a = DomainEvent::workflow_started(wf);
        let b = DomainEvent::workflow_started(wf);
        assert_ne!(a.event_id, b.event_id);
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn test_payload_is_adjacently_tagged() {
        let wf = WorkflowId::new();
        let event = DomainEvent::workflow_failed(wf, "bad selector");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["payload"]["kind"], "WorkflowFailed");
        assert_eq!(json["payload"]["data"]["error"], "bad selector");

        let back: DomainEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_graph_change_classification() {
        let graph: Vec<_> = EventKind::ALL
            .iter()
            .filter(|k| k.is_graph_change())
            .collect();
        assert_eq!(graph.len(), 6);
        assert!(!EventKind::NodeFailed.is_graph_change());
    }
}

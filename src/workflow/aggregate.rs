// Copyright 2025 Cowboy AI, LLC.

//! Workflow aggregate
//!
//! The workflow owns its nodes in an id-keyed map and its connections as a
//! list of id pairs, so the graph may contain cycles without any ownership
//! cycles. Every mutating method checks its preconditions first and only
//! then touches state, so a rejected call leaves the aggregate and its fact
//! buffer exactly as they were.
//!
//! Facts produced by mutations are buffered, never published. A
//! [`UnitOfWork`](crate::UnitOfWork) drains them after the state has been
//! persisted.

use super::document::{WorkflowDocument, WorkflowSettings};
use super::node::{Connection, NodeConfig, Position, WorkflowNode};
use crate::entity::{AggregateRoot, TrackedAggregate};
use crate::errors::{DomainError, DomainResult};
use crate::events::DomainEvent;
use crate::identifiers::{NodeId, WorkflowId};
use crate::persistence::AggregateRecord;
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

/// Aggregate root for one workflow graph
#[derive(Debug)]
pub struct Workflow {
    id: WorkflowId,
    name: String,
    description: String,
    nodes: IndexMap<NodeId, WorkflowNode>,
    connections: Vec<Connection>,
    settings: WorkflowSettings,
    version: u64,
    pending_events: Vec<DomainEvent>,
}

impl Workflow {
    /// Aggregate type name used in storage records
    pub const AGGREGATE_TYPE: &'static str = "Workflow";

    /// Create an empty workflow with a fresh id
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(WorkflowId::new(), name)
    }

    /// Create an empty workflow with a known id
    pub fn with_id(id: WorkflowId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            nodes: IndexMap::new(),
            connections: Vec::new(),
            settings: WorkflowSettings::new(),
            version: 0,
            pending_events: Vec::new(),
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free text description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Passthrough settings
    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Replace the description; raises no fact
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Set one passthrough setting; raises no fact
    pub fn update_setting(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.settings.insert(key.into(), value);
    }

    // ---- mutations -------------------------------------------------------

    /// Add a node and return its fresh id
    pub fn add_node(
        &mut self,
        node_type: &str,
        position: Position,
        config: NodeConfig,
    ) -> DomainResult<NodeId> {
        if node_type.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "node_type must not be empty".to_string(),
            ));
        }
        require_finite(position)?;

        let mut node_id = NodeId::new();
        while self.nodes.contains_key(&node_id) {
            node_id = NodeId::new();
        }

        self.nodes.insert(
            node_id,
            WorkflowNode::new(node_id, node_type.to_string(), position, config),
        );
        self.record(DomainEvent::node_added(self.id, node_id, node_type, position));
        debug!(workflow_id = %self.id, %node_id, node_type, "node added");
        Ok(node_id)
    }

    /// Remove a node together with every connection touching it
    ///
    /// Raises one `NodeDisconnected` per removed connection, in stored
    /// order, followed by a single `NodeRemoved`.
    pub fn remove_node(&mut self, node_id: NodeId) -> DomainResult<()> {
        if self.nodes.shift_remove(&node_id).is_none() {
            return Err(DomainError::node_not_found(node_id));
        }

        let (removed, kept): (Vec<Connection>, Vec<Connection>) = self
            .connections
            .drain(..)
            .partition(|c| c.references(node_id));
        self.connections = kept;

        for connection in &removed {
            self.record(DomainEvent::node_disconnected(self.id, connection));
        }
        self.record(DomainEvent::node_removed(self.id, node_id));
        debug!(
            workflow_id = %self.id,
            %node_id,
            cascaded = removed.len(),
            "node removed"
        );
        Ok(())
    }

    /// Connect an output port to an input port
    ///
    /// Parallel connections between the same ports are allowed. Cycles
    /// spanning several nodes are not checked here.
    pub fn connect(
        &mut self,
        source_node: NodeId,
        source_port: &str,
        target_node: NodeId,
        target_port: &str,
    ) -> DomainResult<()> {
        self.require_node(source_node)?;
        self.require_node(target_node)?;
        if source_node == target_node {
            return Err(DomainError::ValidationError(format!(
                "node {source_node} cannot be connected to itself"
            )));
        }

        let connection = Connection::new(source_node, source_port, target_node, target_port);
        self.record(DomainEvent::node_connected(self.id, &connection));
        self.connections.push(connection);
        Ok(())
    }

    /// Remove the first connection matching both endpoints and ports
    pub fn disconnect(
        &mut self,
        source_node: NodeId,
        source_port: &str,
        target_node: NodeId,
        target_port: &str,
    ) -> DomainResult<()> {
        let index = self
            .connections
            .iter()
            .position(|c| c.matches(source_node, source_port, target_node, target_port))
            .ok_or_else(|| {
                DomainError::NotFound(format!(
                    "connection {source_node}:{source_port} -> {target_node}:{target_port}"
                ))
            })?;

        let connection = self.connections.remove(index);
        self.record(DomainEvent::node_disconnected(self.id, &connection));
        Ok(())
    }

    /// Move a node on the canvas; raises `NodeMoved`
    pub fn move_node(&mut self, node_id: NodeId, position: Position) -> DomainResult<()> {
        require_finite(position)?;
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or_else(|| DomainError::node_not_found(node_id))?;
        let old_position = node.position();
        node.set_position(position);
        self.record(DomainEvent::node_moved(self.id, node_id, old_position, position));
        Ok(())
    }

    /// Set one configuration key on a node; raises `NodeConfigUpdated`
    pub fn update_node_config(
        &mut self,
        node_id: NodeId,
        key: &str,
        value: serde_json::Value,
    ) -> DomainResult<()> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or_else(|| DomainError::node_not_found(node_id))?;
        node.set_config_value(key.to_string(), value.clone());
        self.record(DomainEvent::node_config_updated(self.id, node_id, key, value));
        Ok(())
    }

    // ---- queries ---------------------------------------------------------

    /// True when the node exists
    pub fn has_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Look up a node
    pub fn get_node(&self, node_id: NodeId) -> DomainResult<&WorkflowNode> {
        self.nodes
            .get(&node_id)
            .ok_or_else(|| DomainError::node_not_found(node_id))
    }

    /// All nodes in insertion order
    pub fn get_all_nodes(&self) -> impl Iterator<Item = &WorkflowNode> {
        self.nodes.values()
    }

    /// Connections leaving a node
    pub fn get_connections_from(&self, node_id: NodeId) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| c.source_node == node_id)
            .collect()
    }

    /// Connections entering a node
    pub fn get_connections_to(&self, node_id: NodeId) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| c.target_node == node_id)
            .collect()
    }

    /// All connections in stored order
    pub fn get_all_connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    // ---- fact buffer -----------------------------------------------------

    /// Drain buffered facts in the order they were raised
    pub fn collect_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// True when facts are waiting to be collected
    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    /// Number of facts waiting to be collected
    pub fn pending_event_count(&self) -> usize {
        self.pending_events.len()
    }

    fn record(&mut self, event: DomainEvent) {
        self.pending_events.push(event);
        self.increment_version();
    }

    fn require_node(&self, node_id: NodeId) -> DomainResult<()> {
        if self.nodes.contains_key(&node_id) {
            Ok(())
        } else {
            Err(DomainError::node_not_found(node_id))
        }
    }

    // ---- serialization ---------------------------------------------------

    /// Snapshot of the node/connection state
    pub fn to_document(&self) -> WorkflowDocument {
        WorkflowDocument {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            nodes: self.nodes.clone(),
            connections: self.connections.clone(),
            settings: self.settings.clone(),
            version: self.version,
        }
    }

    /// Rebuild a workflow from its document
    ///
    /// Loading is not a replay: the result has an empty fact buffer. A
    /// document that breaks a graph invariant is rejected with
    /// [`DomainError::InvariantViolation`].
    pub fn from_document(document: WorkflowDocument) -> DomainResult<Self> {
        for (key, node) in &document.nodes {
            if *key != node.node_id() {
                return Err(DomainError::InvariantViolation(format!(
                    "node keyed {key} carries node_id {}",
                    node.node_id()
                )));
            }
            if node.node_type().trim().is_empty() {
                return Err(DomainError::InvariantViolation(format!(
                    "node {key} has an empty node_type"
                )));
            }
        }

        let known: HashSet<NodeId> = document.nodes.keys().copied().collect();
        for connection in &document.connections {
            for endpoint in [connection.source_node, connection.target_node] {
                if !known.contains(&endpoint) {
                    return Err(DomainError::InvariantViolation(format!(
                        "connection references unknown node {endpoint}"
                    )));
                }
            }
            if connection.source_node == connection.target_node {
                return Err(DomainError::InvariantViolation(format!(
                    "connection loops node {} onto itself",
                    connection.source_node
                )));
            }
        }

        Ok(Self {
            id: document.id,
            name: document.name,
            description: document.description,
            nodes: document.nodes,
            connections: document.connections,
            settings: document.settings,
            version: document.version,
            pending_events: Vec::new(),
        })
    }

    /// Serialize to untyped JSON
    pub fn to_dict(&self) -> DomainResult<serde_json::Value> {
        Ok(serde_json::to_value(self.to_document())?)
    }

    /// Rebuild from untyped JSON
    pub fn from_dict(data: serde_json::Value) -> DomainResult<Self> {
        let document: WorkflowDocument = serde_json::from_value(data)?;
        Self::from_document(document)
    }

    /// Rebuild from a storage record
    pub fn from_record(record: AggregateRecord) -> DomainResult<Self> {
        if record.aggregate_type != Self::AGGREGATE_TYPE {
            return Err(DomainError::ValidationError(format!(
                "record {} is a {}, not a {}",
                record.aggregate_id,
                record.aggregate_type,
                Self::AGGREGATE_TYPE
            )));
        }
        Self::from_dict(record.state)
    }
}

fn require_finite(position: Position) -> DomainResult<()> {
    if position.is_finite() {
        Ok(())
    } else {
        Err(DomainError::ValidationError(format!(
            "position ({}, {}) must have finite coordinates",
            position.x, position.y
        )))
    }
}

impl AggregateRoot for Workflow {
    type Id = WorkflowId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn increment_version(&mut self) {
        self.version += 1;
    }
}

impl TrackedAggregate for Workflow {
    fn aggregate_id(&self) -> Uuid {
        self.id.into()
    }

    fn aggregate_type(&self) -> &'static str {
        Self::AGGREGATE_TYPE
    }

    fn collect_events(&mut self) -> Vec<DomainEvent> {
        Workflow::collect_events(self)
    }

    fn has_pending_events(&self) -> bool {
        Workflow::has_pending_events(self)
    }

    fn pending_event_count(&self) -> usize {
        Workflow::pending_event_count(self)
    }

    fn to_record(&self) -> DomainResult<AggregateRecord> {
        Ok(AggregateRecord {
            aggregate_type: Self::AGGREGATE_TYPE.to_string(),
            aggregate_id: self.id.into(),
            version: self.version,
            state: self.to_dict()?,
        })
    }
}

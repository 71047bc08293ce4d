// Copyright 2025 Cowboy AI, LLC.

//! Nodes, positions and connections of a workflow graph
//!
//! [`Position`] and [`Connection`] are value objects: immutable, compared by
//! value, replaced rather than updated. [`WorkflowNode`] is an entity owned
//! exclusively by its [`Workflow`](super::Workflow).

use crate::identifiers::NodeId;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Free-form per-node configuration
pub type NodeConfig = serde_json::Map<String, serde_json::Value>;

/// 2D canvas coordinate; cosmetic only
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Position {
    /// Create a position
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True when both coordinates are finite numbers
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// One automation step placed in a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WorkflowNode {
    node_id: NodeId,
    node_type: String,
    position: Position,
    #[serde(default)]
    config: NodeConfig,
}

impl WorkflowNode {
    pub(crate) fn new(node_id: NodeId, node_type: String, position: Position, config: NodeConfig) -> Self {
        Self {
            node_id,
            node_type,
            position,
            config,
        }
    }

    /// Identity within the owning workflow
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Opaque step type tag, never empty
    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    /// Layout position
    pub fn position(&self) -> Position {
        self.position
    }

    /// Step configuration
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Single configuration value
    pub fn config_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.config.get(key)
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub(crate) fn set_config_value(&mut self, key: String, value: serde_json::Value) {
        self.config.insert(key, value);
    }
}

/// Directed edge `(source_node, source_port) -> (target_node, target_port)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Connection {
    /// Node the edge leaves
    pub source_node: NodeId,
    /// Output port on the source node
    pub source_port: String,
    /// Node the edge enters
    pub target_node: NodeId,
    /// Input port on the target node
    pub target_port: String,
}

impl Connection {
    /// Create a connection value
    pub fn new(
        source_node: NodeId,
        source_port: impl Into<String>,
        target_node: NodeId,
        target_port: impl Into<String>,
    ) -> Self {
        Self {
            source_node,
            source_port: source_port.into(),
            target_node,
            target_port: target_port.into(),
        }
    }

    /// True when the node is either endpoint
    pub fn references(&self, node_id: NodeId) -> bool {
        self.source_node == node_id || self.target_node == node_id
    }

    /// True when both endpoints and both ports match
    pub fn matches(&self, source_node: NodeId, source_port: &str, target_node: NodeId, target_port: &str) -> bool {
        self.source_node == source_node
            && self.source_port == source_port
            && self.target_node == target_node
            && self.target_port == target_port
    }
}

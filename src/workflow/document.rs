// Copyright 2025 Cowboy AI, LLC.

//! Serialized workflow format
//!
//! ```json
//! {
//!   "id": "…",
//!   "name": "…",
//!   "description": "…",
//!   "nodes": { "<node_id>": { "node_id": "…", "node_type": "…", "position": {"x": 0, "y": 0}, "config": {} } },
//!   "connections": [ { "source_node": "…", "source_port": "…", "target_node": "…", "target_port": "…" } ],
//!   "settings": {},
//!   "version": 0
//! }
//! ```

use super::node::{Connection, WorkflowNode};
use crate::identifiers::{NodeId, WorkflowId};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Passthrough workflow settings
pub type WorkflowSettings = serde_json::Map<String, serde_json::Value>;

/// Persisted representation of a [`Workflow`](super::Workflow)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WorkflowDocument {
    /// Workflow identity
    pub id: WorkflowId,
    /// Display name
    pub name: String,
    /// Free text, passthrough
    #[serde(default)]
    pub description: String,
    /// Nodes keyed by their id, in insertion order
    #[serde(default)]
    pub nodes: IndexMap<NodeId, WorkflowNode>,
    /// Connections in stored order
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// Passthrough settings
    #[serde(default)]
    pub settings: WorkflowSettings,
    /// Aggregate version at the time of saving
    #[serde(default)]
    pub version: u64,
}

impl WorkflowDocument {
    /// JSON Schema describing the document, for external validators
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(WorkflowDocument);
        serde_json::to_value(schema).unwrap_or(serde_json::Value::Null)
    }
}

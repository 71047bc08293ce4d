// Copyright 2025 Cowboy AI, LLC.

//! Workflow graph aggregate
//!
//! - [`Workflow`]: the aggregate root enforcing graph invariants
//! - [`WorkflowNode`], [`Position`], [`Connection`]: what the graph is made of
//! - [`WorkflowDocument`]: the serialized form used by storage

pub mod aggregate;
pub mod document;
pub mod node;

pub use aggregate::Workflow;
pub use document::{WorkflowDocument, WorkflowSettings};
pub use node::{Connection, NodeConfig, Position, WorkflowNode};

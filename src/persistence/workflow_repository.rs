// Copyright 2025 Cowboy AI, LLC.

//! Typed loading of workflows through a storage port
//!
//! There is no save here. State reaches storage only through a
//! [`UnitOfWork`](crate::UnitOfWork), so that facts and state stay in step.

use super::storage_port::{StoragePort, StorageError};
use crate::errors::{DomainError, DomainResult};
use crate::identifiers::WorkflowId;
use crate::workflow::Workflow;
use std::sync::Arc;

/// Loads [`Workflow`] aggregates from a [`StoragePort`]
#[derive(Clone)]
pub struct WorkflowRepository {
    store: Arc<dyn StoragePort>,
}

impl WorkflowRepository {
    /// Wrap a storage port
    pub fn new(store: Arc<dyn StoragePort>) -> Self {
        Self { store }
    }

    /// Load a workflow; the result has no pending facts
    pub async fn load(&self, id: &WorkflowId) -> DomainResult<Workflow> {
        let record = self.store.load(id.into()).await.map_err(|e| match e {
            StorageError::NotFound(_) => DomainError::EntityNotFound {
                entity_type: Workflow::AGGREGATE_TYPE.to_string(),
                id: id.to_string(),
            },
            other => DomainError::InternalError(format!("failed to load workflow {id}: {other}")),
        })?;
        Workflow::from_record(record)
    }

    /// Check if a workflow is stored
    pub async fn exists(&self, id: &WorkflowId) -> DomainResult<bool> {
        self.store
            .exists(id.into())
            .await
            .map_err(|e| DomainError::InternalError(e.to_string()))
    }
}

// Copyright 2025 Cowboy AI, LLC.

//! Error types for workflow operations

use crate::persistence::StorageError;
use thiserror::Error;

/// Errors that can occur while mutating, persisting or loading a workflow
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// Input rejected before any mutation took place
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Entity not found
    #[error("Entity not found: {entity_type} with id {id}")]
    EntityNotFound {
        /// Type of entity that wasn't found
        entity_type: String,
        /// ID that was searched for
        id: String,
    },

    /// Not found error (generic)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invariant violation detected in already-built state
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The storage port rejected a save during commit
    #[error("Persistence failure for aggregate {aggregate_id}: {source}")]
    PersistenceFailure {
        /// Aggregate whose record could not be saved
        aggregate_id: String,
        /// Error reported by the storage port
        #[source]
        source: StorageError,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl DomainError {
    /// Shorthand for a missing node
    pub fn node_not_found(node_id: impl ToString) -> Self {
        DomainError::EntityNotFound {
            entity_type: "WorkflowNode".to_string(),
            id: node_id.to_string(),
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::EntityNotFound { .. } | DomainError::NotFound(_)
        )
    }

    /// Check if this is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            DomainError::ValidationError(_) | DomainError::InvariantViolation(_)
        )
    }

    /// Check if this error came from the storage port during commit
    pub fn is_persistence_failure(&self) -> bool {
        matches!(self, DomainError::PersistenceFailure { .. })
    }
}

// Copyright 2025 Cowboy AI, LLC.

//! Storage port consumed by the unit of work
//!
//! The concrete backing store (file, database, KV bucket) lives outside
//! this crate. It only has to honour this narrow save/load contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors reported by a storage backend
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// No record stored under the requested id
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The backend refused or failed the operation
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Stored bytes could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Serialized aggregate state as handed to a storage backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRecord {
    /// The type of the aggregate
    pub aggregate_type: String,
    /// The aggregate's unique identifier
    pub aggregate_id: Uuid,
    /// The aggregate version at save time
    pub version: u64,
    /// Serialized aggregate state
    pub state: serde_json::Value,
}

/// Record plus bookkeeping kept by backends that track save time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    /// The saved record
    pub record: AggregateRecord,
    /// When the record was last written
    pub saved_at: DateTime<Utc>,
}

/// Narrow save/load contract for aggregate state
///
/// `save` is the only operation in the core that may block or suspend.
#[async_trait]
pub trait StoragePort: Send + Sync {
    /// Durably store the record, replacing any previous one for the same id
    async fn save(&self, record: &AggregateRecord) -> Result<(), StorageError>;

    /// Load the record stored under `aggregate_id`
    ///
    /// Returns [`StorageError::NotFound`] when nothing is stored.
    async fn load(&self, aggregate_id: Uuid) -> Result<AggregateRecord, StorageError>;

    /// Check if a record exists
    async fn exists(&self, aggregate_id: Uuid) -> Result<bool, StorageError> {
        match self.load(aggregate_id).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_malformed_record_is_a_serialization_error() {
        let err: StorageError = serde_json::from_str::<AggregateRecord>("not json")
            .unwrap_err()
            .into();

        assert!(matches!(&err, StorageError::Serialization(msg) if !msg.is_empty()));
        assert!(err.to_string().starts_with("Serialization error: "));
    }

    #[test]
    fn test_record_with_missing_field_is_rejected() {
        let json = serde_json::json!({
            "aggregate_type": "Workflow",
            "aggregate_id": Uuid::new_v4().to_string(),
            "state": {}
        });
        let err = StorageError::from(serde_json::from_value::<AggregateRecord>(json).unwrap_err());

        match err {
            StorageError::Serialization(msg) => assert!(msg.contains("version"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_record_survives_json() {
        let record = AggregateRecord {
            aggregate_type: "Workflow".to_string(),
            aggregate_id: Uuid::new_v4(),
            version: 3,
            state: serde_json::json!({ "name": "wf" }),
        };
        let text = serde_json::to_string(&record).unwrap();
        let back: AggregateRecord = serde_json::from_str(&text).map_err(StorageError::from).unwrap();
        assert_eq!(back, record);
    }
}

// Copyright 2025 Cowboy AI, LLC.

//! In-memory storage backend
//!
//! Used by tests and by embedders that do not need durability. Failures can
//! be injected to exercise the commit failure path.

use super::storage_port::{AggregateRecord, StoragePort, StorageError, StoredRecord};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Map-backed [`StoragePort`]
#[derive(Clone, Default)]
pub struct InMemoryStore {
    records: Arc<RwLock<HashMap<Uuid, StoredRecord>>>,
    failing_ids: Arc<RwLock<HashSet<Uuid>>>,
    fail_next: Arc<AtomicUsize>,
    fail_all: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` saves fail
    pub fn fail_next_saves(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Make every save fail until switched off
    pub fn set_fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Make saves of one particular aggregate fail
    pub async fn fail_on(&self, aggregate_id: Uuid) {
        self.failing_ids.write().await.insert(aggregate_id);
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// True when nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Stored record with its save time
    pub async fn get(&self, aggregate_id: Uuid) -> Option<StoredRecord> {
        self.records.read().await.get(&aggregate_id).cloned()
    }

    async fn should_fail(&self, aggregate_id: Uuid) -> bool {
        if self.fail_all.load(Ordering::SeqCst) {
            return true;
        }
        let consumed = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        consumed || self.failing_ids.read().await.contains(&aggregate_id)
    }
}

#[async_trait]
impl StoragePort for InMemoryStore {
    async fn save(&self, record: &AggregateRecord) -> Result<(), StorageError> {
        if self.should_fail(record.aggregate_id).await {
            return Err(StorageError::Backend(format!(
                "injected failure saving {}",
                record.aggregate_id
            )));
        }

        self.records.write().await.insert(
            record.aggregate_id,
            StoredRecord {
                record: record.clone(),
                saved_at: Utc::now(),
            },
        );
        self.saves.fetch_add(1, Ordering::SeqCst);
        debug!(aggregate_id = %record.aggregate_id, version = record.version, "record saved");
        Ok(())
    }

    async fn load(&self, aggregate_id: Uuid) -> Result<AggregateRecord, StorageError> {
        self.records
            .read()
            .await
            .get(&aggregate_id)
            .map(|stored| stored.record.clone())
            .ok_or_else(|| StorageError::NotFound(aggregate_id.to_string()))
    }
}

// Copyright 2025 Cowboy AI, LLC.

//! Unit of Work
//!
//! Collect-then-publish boundary over one or more aggregates. Facts reach
//! the [`EventBus`] only after every tracked aggregate has been saved
//! through the [`StoragePort`]; a failed save discards them all.
//!
//! `commit` and `rollback` consume the unit. A unit dropped without either
//! (early `?` return, panic unwind) rolls back.

use crate::entity::TrackedAggregate;
use crate::errors::{DomainError, DomainResult};
use crate::event_bus::EventBus;
use crate::events::DomainEvent;
use crate::persistence::StoragePort;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Outcome of a successful commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitReport {
    /// Aggregates written to the storage port
    pub aggregates_saved: usize,
    /// Facts handed to the bus
    pub events_published: usize,
}

/// Transactional boundary tying persistence to publication
///
/// # Examples
///
/// ```rust
/// # tokio_test::block_on(async {
/// use std::sync::Arc;
/// use workflow_core::persistence::InMemoryStore;
/// use workflow_core::{EventBus, EventBusConfig, Position, UnitOfWork, Workflow};
///
/// let bus = Arc::new(EventBus::new(EventBusConfig::default()));
/// let store = Arc::new(InMemoryStore::new());
/// let mut workflow = Workflow::new("onboarding");
///
/// workflow.add_node("Start", Position::default(), Default::default()).unwrap();
///
/// let mut uow = UnitOfWork::new(Arc::clone(&bus), store);
/// uow.track(&mut workflow);
/// let report = uow.commit().await.unwrap();
///
/// assert_eq!(report.events_published, 1);
/// assert_eq!(bus.get_history(None, 10).len(), 1);
/// # });
/// ```
pub struct UnitOfWork<'a> {
    bus: Arc<EventBus>,
    store: Arc<dyn StoragePort>,
    tracked: Vec<&'a mut dyn TrackedAggregate>,
    queued: Vec<DomainEvent>,
    resolved: bool,
}

impl<'a> UnitOfWork<'a> {
    /// Open a unit over a bus and a storage port
    pub fn new(bus: Arc<EventBus>, store: Arc<dyn StoragePort>) -> Self {
        Self {
            bus,
            store,
            tracked: Vec::new(),
            queued: Vec::new(),
            resolved: false,
        }
    }

    /// Track an aggregate; it is harvested and saved on commit
    pub fn track(&mut self, aggregate: &'a mut dyn TrackedAggregate) {
        debug!(
            aggregate_type = aggregate.aggregate_type(),
            aggregate_id = %aggregate.aggregate_id(),
            "aggregate tracked"
        );
        self.tracked.push(aggregate);
    }

    /// Queue a fact not raised by a tracked aggregate
    ///
    /// Queued facts are published after every harvested fact.
    pub fn add_event(&mut self, event: DomainEvent) {
        self.queued.push(event);
    }

    /// True when nothing is tracked and nothing is queued
    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty() && self.queued.is_empty()
    }

    /// Number of tracked aggregates
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Facts that a commit would publish right now
    pub fn pending_event_count(&self) -> usize {
        self.tracked
            .iter()
            .map(|a| a.pending_event_count())
            .sum::<usize>()
            + self.queued.len()
    }

    /// Save every tracked aggregate, then publish all facts in order
    ///
    /// Every record is built before any fact is harvested. If a record
    /// cannot be built, or the first storage failure occurs, nothing is
    /// published and the facts are discarded; every tracked aggregate's
    /// buffer ends up empty.
    pub async fn commit(self) -> DomainResult<CommitReport> {
        let span = info_span!(
            "unit_of_work.commit",
            aggregates = self.tracked.len(),
            queued = self.queued.len()
        );
        self.commit_inner().instrument(span).await
    }

    async fn commit_inner(mut self) -> DomainResult<CommitReport> {
        self.resolved = true;
        let tracked = std::mem::take(&mut self.tracked);
        let queued = std::mem::take(&mut self.queued);

        let records = match tracked
            .iter()
            .map(|aggregate| aggregate.to_record())
            .collect::<DomainResult<Vec<_>>>()
        {
            Ok(records) => records,
            Err(e) => {
                let discarded = queued.len()
                    + tracked
                        .into_iter()
                        .map(|aggregate| aggregate.collect_events().len())
                        .sum::<usize>();
                error!(error = %e, discarded, "commit failed, aggregate not serializable");
                return Err(e);
            }
        };

        let mut facts = Vec::new();
        for aggregate in tracked {
            facts.extend(aggregate.collect_events());
        }
        facts.extend(queued);

        debug!(records = records.len(), facts = facts.len(), "persisting");
        for record in &records {
            if let Err(source) = self.store.save(record).await {
                error!(
                    aggregate_type = %record.aggregate_type,
                    aggregate_id = %record.aggregate_id,
                    error = %source,
                    discarded = facts.len(),
                    "commit failed, no events published"
                );
                return Err(DomainError::PersistenceFailure {
                    aggregate_id: record.aggregate_id.to_string(),
                    source,
                });
            }
        }

        for fact in &facts {
            self.bus.publish(fact);
        }

        let report = CommitReport {
            aggregates_saved: records.len(),
            events_published: facts.len(),
        };
        info!(
            aggregates_saved = report.aggregates_saved,
            events_published = report.events_published,
            "commit succeeded"
        );
        Ok(report)
    }

    /// Discard all pending facts without publishing
    ///
    /// In-memory mutations of tracked aggregates are kept.
    pub fn rollback(mut self) {
        self.discard("rollback");
    }

    fn discard(&mut self, reason: &'static str) {
        self.resolved = true;
        let mut discarded = self.queued.len();
        self.queued.clear();
        for aggregate in self.tracked.drain(..) {
            discarded += aggregate.collect_events().len();
        }
        if discarded > 0 {
            warn!(reason, discarded, "unit of work rolled back");
        } else {
            debug!(reason, "unit of work rolled back");
        }
    }
}

impl Drop for UnitOfWork<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            self.discard("dropped without commit");
        }
    }
}

impl fmt::Debug for UnitOfWork<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("tracked", &self.tracked.len())
            .field("queued", &self.queued.len())
            .field("resolved", &self.resolved)
            .finish()
    }
}

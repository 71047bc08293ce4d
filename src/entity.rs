// Copyright 2025 Cowboy AI, LLC.

//! Aggregate root traits
//!
//! [`AggregateRoot`] is the typed view of a consistency boundary.
//! [`TrackedAggregate`] is the object-safe view a
//! [`UnitOfWork`](crate::UnitOfWork) needs to harvest facts from an aggregate
//! and persist it, whatever its concrete type.

use crate::errors::DomainResult;
use crate::events::DomainEvent;
use crate::persistence::AggregateRecord;
use uuid::Uuid;

/// Marker trait for aggregate roots
///
/// Aggregate roots are the entry points for modifying aggregates.
/// All changes to entities within an aggregate must go through the root.
///
/// # Examples
///
/// ```rust
/// use workflow_core::{AggregateRoot, Position, Workflow};
///
/// let mut workflow = Workflow::new("invoices");
/// assert_eq!(workflow.version(), 0);
///
/// workflow.add_node("Start", Position::new(0.0, 0.0), Default::default()).unwrap();
/// assert_eq!(workflow.version(), 1);
/// ```
pub trait AggregateRoot: Sized {
    /// The type of ID for this aggregate
    type Id: Copy + Eq + Send + Sync;

    /// Get the aggregate's ID
    fn id(&self) -> Self::Id;

    /// Get the aggregate's version for optimistic concurrency
    fn version(&self) -> u64;

    /// Increment the version
    fn increment_version(&mut self);
}

/// An aggregate that buffers facts and can be saved through a storage port
///
/// Implementors never publish their own facts. They hold them until a
/// unit of work drains them with [`collect_events`](Self::collect_events).
pub trait TrackedAggregate: Send {
    /// Identity used as the storage key
    fn aggregate_id(&self) -> Uuid;

    /// Type name stored alongside the state (e.g. "Workflow")
    fn aggregate_type(&self) -> &'static str;

    /// Drain buffered facts in the order they were raised
    fn collect_events(&mut self) -> Vec<DomainEvent>;

    /// True when facts are waiting to be collected
    fn has_pending_events(&self) -> bool;

    /// Number of facts waiting to be collected
    fn pending_event_count(&self) -> usize;

    /// Serialized state to hand to the storage port
    fn to_record(&self) -> DomainResult<AggregateRecord>;
}

// Copyright 2025 Cowboy AI, LLC.

//! # Persistence Layer
//!
//! The core only depends on the [`StoragePort`] contract. Concrete
//! backends are external collaborators; [`InMemoryStore`] ships for tests
//! and non-durable embedding.
//!
//! ## Components
//!
//! - **Storage port**: save/load of serialized aggregate records
//! - **In-memory store**: map-backed port with failure injection
//! - **Workflow repository**: typed loading of workflows

pub mod in_memory;
pub mod storage_port;
pub mod workflow_repository;

pub use in_memory::InMemoryStore;
pub use storage_port::{AggregateRecord, StoragePort, StorageError, StoredRecord};
pub use workflow_repository::WorkflowRepository;

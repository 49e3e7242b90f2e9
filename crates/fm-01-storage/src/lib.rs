//! # Relational Storage and Transaction Coordination (fm-01)
//!
//! Authoritative persistence for forms, accounts and their derived rows,
//! plus the coordinator that turns committed primary writes into
//! post-commit hook deliveries.
//!
//! ## Architecture
//!
//! ```text
//! Primary writer ──→ UnitOfWork ──→ StoreTransaction ──→ commit
//!                        │                                   │
//!                        └── notify ──→ Dispatcher ←── commit/flush
//!                                           │
//!                                           ▼
//!                         Derived handlers ──→ derived() transactions
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Serial ids | One sequence per table, never reused |
//! | Unique usernames | Rejected synchronously on insert |
//! | Valid windows | `available_from <= available_to` on every form write |
//! | Atomic commit | A transaction's rows become visible all at once or not at all |
//! | Post-commit hooks | No hook of a transaction runs before it commits |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Tables, errors, fault injection
//! - `ports/` - Snapshot persistence port
//! - `adapters/` - In-memory and file-backed snapshots, data directory lock
//! - `service/` - Store, transactions, coordinator
//!
//! ## Usage
//!
//! ```ignore
//! use fm_01_storage::{RelationalStore, TransactionCoordinator};
//!
//! let coordinator = TransactionCoordinator::new(Arc::new(RelationalStore::in_memory()), dispatcher);
//! let mut uow = coordinator.begin()?;
//! let form = uow.create_form(new_form)?;
//! let receipt = uow.commit()?;
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapters::{FileSnapshotStore, InMemorySnapshotStore};
pub use domain::errors::StoreError;
pub use domain::faults::FaultOp;
pub use domain::tables::{Table, TableCounts, Tables};
pub use ports::outbound::SnapshotStore;
pub use service::{
    CommitReceipt, RelationalStore, StoreTransaction, TransactionCoordinator, UnitOfWork,
};

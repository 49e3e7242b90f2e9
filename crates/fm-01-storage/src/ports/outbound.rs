//! # Outbound Ports (Driven Ports)
//!
//! Dependencies required by the relational store.

use crate::domain::errors::StoreError;
use crate::domain::tables::Tables;

/// Durable home of the committed tables.
///
/// `save` is called once per commit with the full post-commit state and
/// must be atomic: after a crash, `load` returns either the previous or
/// the new snapshot, never a mix.
///
/// Production: `FileSnapshotStore`
/// Testing: `InMemorySnapshotStore`
pub trait SnapshotStore: Send + Sync {
    /// Read the last committed snapshot, if any.
    fn load(&self) -> Result<Option<Tables>, StoreError>;

    /// Replace the committed snapshot.
    fn save(&self, tables: &Tables) -> Result<(), StoreError>;

    /// Human-readable location for logs.
    fn describe(&self) -> String;
}

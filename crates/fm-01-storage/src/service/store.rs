//! # Relational Store
//!
//! Committed tables behind a single-writer lock.
//!
//! ## Transaction Model
//!
//! - `begin` takes the writer lock and clones the committed tables into a
//!   private working copy
//! - Writes go to the working copy only
//! - `commit` persists the working copy through the `SnapshotStore`, then
//!   swaps it in; readers see either the old or the new state
//! - Dropping an uncommitted transaction discards the working copy

use crate::adapters::memory::InMemorySnapshotStore;
use crate::domain::errors::StoreError;
use crate::domain::faults::{FaultOp, FaultPlan};
use crate::domain::tables::{Table, TableCounts, Tables};
use crate::ports::outbound::SnapshotStore;
use crate::service::transaction::StoreTransaction;
use parking_lot::{Mutex, RwLock};
use shared_types::TransactionId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::ThreadId;
use tracing::info;

/// In-process relational store.
pub struct RelationalStore {
    pub(crate) committed: RwLock<Tables>,
    pub(crate) writer: Mutex<()>,
    pub(crate) writer_owner: Mutex<Option<ThreadId>>,
    pub(crate) faults: Mutex<FaultPlan>,
    pub(crate) snapshots: Box<dyn SnapshotStore>,
    pub(crate) commits: AtomicU64,
}

impl RelationalStore {
    /// Open a store over `snapshots`, loading the last committed state.
    pub fn open(snapshots: Box<dyn SnapshotStore>) -> Result<Self, StoreError> {
        let tables = snapshots.load()?.unwrap_or_default();
        info!(
            persistence = %snapshots.describe(),
            forms = tables.forms.len(),
            accounts = tables.accounts.len(),
            "Relational store opened"
        );
        Ok(Self {
            committed: RwLock::new(tables),
            writer: Mutex::new(()),
            writer_owner: Mutex::new(None),
            faults: Mutex::new(FaultPlan::default()),
            snapshots,
            commits: AtomicU64::new(0),
        })
    }

    /// Empty store without durable persistence.
    pub fn in_memory() -> Self {
        Self {
            committed: RwLock::new(Tables::default()),
            writer: Mutex::new(()),
            writer_owner: Mutex::new(None),
            faults: Mutex::new(FaultPlan::default()),
            snapshots: Box::new(InMemorySnapshotStore::new()),
            commits: AtomicU64::new(0),
        }
    }

    /// Start a transaction. Blocks while another thread holds the writer.
    ///
    /// # Errors
    ///
    /// - `StoreError::TransactionInProgress` - this thread already holds it
    pub fn begin(&self) -> Result<StoreTransaction<'_>, StoreError> {
        let me = std::thread::current().id();
        if *self.writer_owner.lock() == Some(me) {
            return Err(StoreError::TransactionInProgress);
        }

        let guard = self.writer.lock();
        *self.writer_owner.lock() = Some(me);
        let working = self.committed.read().clone();
        Ok(StoreTransaction::new(self, TransactionId::new(), working, guard))
    }

    /// Run `f` against the committed tables.
    pub fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        f(&self.committed.read())
    }

    /// Clone of the committed tables.
    pub fn snapshot(&self) -> Tables {
        self.committed.read().clone()
    }

    pub fn counts(&self) -> TableCounts {
        self.committed.read().counts()
    }

    /// Number of transactions committed since open.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }

    pub fn persistence(&self) -> String {
        self.snapshots.describe()
    }

    // =========================================================================
    // Fault injection
    // =========================================================================

    /// Fail the next `count` inserts into `table`.
    pub fn fail_next_inserts(&self, table: Table, count: u32) {
        self.faults.lock().arm(table, FaultOp::Insert, count);
    }

    /// Fail the next `count` deletes from `table`.
    pub fn fail_next_deletes(&self, table: Table, count: u32) {
        self.faults.lock().arm(table, FaultOp::Delete, count);
    }

    pub fn clear_faults(&self) {
        self.faults.lock().clear();
    }
}

//! # Time-Bounded Delivery Ledger
//!
//! Remembers which `(entity, operation, transaction)` triples have already
//! been enqueued so a committed mutation never fires the same handlers
//! twice, no matter how many times `notify` is called for it.
//!
//! ## Retention
//!
//! - Entries are kept for `retention_secs` after they were recorded
//! - Expired entries are garbage-collected every `gc_interval_secs`
//! - Entries of a rolled-back transaction are dropped immediately

use crate::events::{EntityRef, Operation};
use shared_types::TransactionId;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors from ledger operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// This mutation was already enqueued.
    #[error("{operation} of {entity} in {tx} was already delivered")]
    AlreadyDelivered {
        entity: EntityRef,
        operation: Operation,
        tx: TransactionId,
    },
}

/// Deduplication key of one committed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeliveryKey {
    pub entity: EntityRef,
    pub operation: Operation,
    pub tx: TransactionId,
}

/// Time-bounded record of delivered mutations.
pub struct DeliveryLedger {
    /// Map of key -> timestamp when it was first recorded.
    entries: HashMap<DeliveryKey, u64>,

    /// How long an entry stays in the ledger.
    retention_secs: u64,

    /// Last garbage collection timestamp.
    last_gc: u64,

    /// Garbage collection interval in seconds.
    gc_interval_secs: u64,
}

impl DeliveryLedger {
    /// Default retention: one hour.
    pub const DEFAULT_RETENTION: u64 = 3600;

    /// Default garbage collection interval.
    pub const DEFAULT_GC_INTERVAL: u64 = 60;

    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Self::DEFAULT_RETENTION, Self::DEFAULT_GC_INTERVAL)
    }

    #[must_use]
    pub fn with_config(retention_secs: u64, gc_interval_secs: u64) -> Self {
        Self {
            entries: HashMap::new(),
            retention_secs,
            last_gc: Self::current_timestamp(),
            gc_interval_secs,
        }
    }

    /// Record `key`, rejecting it if already present.
    pub fn record(&mut self, key: DeliveryKey) -> Result<(), LedgerError> {
        self.record_at(key, Self::current_timestamp())
    }

    /// Record `key` as seen at `now` (seconds since epoch).
    ///
    /// # Errors
    ///
    /// - `LedgerError::AlreadyDelivered` - the key is still retained
    pub fn record_at(&mut self, key: DeliveryKey, now: u64) -> Result<(), LedgerError> {
        if now.saturating_sub(self.last_gc) > self.gc_interval_secs {
            self.garbage_collect(now);
            self.last_gc = now;
        }

        if self.entries.contains_key(&key) {
            return Err(LedgerError::AlreadyDelivered {
                entity: key.entity,
                operation: key.operation,
                tx: key.tx,
            });
        }

        self.entries.insert(key, now);
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, key: &DeliveryKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop every entry recorded under `tx`. Returns how many were removed.
    pub fn forget_transaction(&mut self, tx: TransactionId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.tx != tx);
        before - self.entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn garbage_collect(&mut self, now: u64) {
        let expiry_threshold = now.saturating_sub(self.retention_secs);
        self.entries.retain(|_, &mut ts| ts > expiry_threshold);
    }

    fn current_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

impl Default for DeliveryLedger {
    fn default() -> Self {
        Self::new()
    }
}

//! # Re-entrancy Guard
//!
//! Tracks which `(entity, operation)` chains are currently running so a
//! handler whose side effects would notify the same key again cannot loop.
//!
//! Handlers run on the thread that flushes, so a chain is identified by
//! that thread. A notify from any other thread belongs to a different
//! mutation and is never matched.

use crate::events::{EntityRef, Operation};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread::ThreadId;

/// Key of a running handler chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InFlightKey {
    pub thread: ThreadId,
    pub entity: EntityRef,
    pub operation: Operation,
}

impl InFlightKey {
    /// Key for a chain run by the calling thread.
    #[must_use]
    pub fn on_current_thread(entity: EntityRef, operation: Operation) -> Self {
        Self {
            thread: std::thread::current().id(),
            entity,
            operation,
        }
    }
}

/// Shared set of running chains.
#[derive(Debug, Default, Clone)]
pub struct InFlightSet {
    inner: Arc<Mutex<HashSet<InFlightKey>>>,
}

impl InFlightSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, key: &InFlightKey) -> bool {
        self.inner.lock().contains(key)
    }

    /// Whether any thread runs a chain for `(entity, operation)`.
    #[must_use]
    pub fn is_running(&self, entity: EntityRef, operation: Operation) -> bool {
        self.inner
            .lock()
            .iter()
            .any(|key| key.entity == entity && key.operation == operation)
    }

    /// Mark `key` as running until the returned guard is dropped.
    ///
    /// Returns `None` if a chain for `key` is already running.
    #[must_use]
    pub fn enter(&self, key: InFlightKey) -> Option<InFlightGuard> {
        if !self.inner.lock().insert(key) {
            return None;
        }
        Some(InFlightGuard {
            set: Arc::clone(&self.inner),
            key,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Removes its key from the set on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    set: Arc<Mutex<HashSet<InFlightKey>>>,
    key: InFlightKey,
}

impl InFlightGuard {
    #[must_use]
    pub fn key(&self) -> InFlightKey {
        self.key
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.lock().remove(&self.key);
    }
}

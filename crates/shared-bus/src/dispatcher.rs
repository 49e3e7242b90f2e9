//! # Event Dispatcher
//!
//! Post-commit hook dispatch for primary-entity mutations.
//!
//! ## Lifecycle of a hook
//!
//! ```text
//! open_transaction(tx)
//!     notify(tx, event) ──→ ledger check ──→ one pending hook per handler
//!     defer(tx, callback) ─────────────────→ pending callback
//! commit(tx) ──→ pending hooks move to the ready queue
//! flush()    ──→ ready hooks run in order, failures are reported
//! rollback(tx) ──→ pending hooks are discarded
//! ```
//!
//! Handlers run synchronously inside `flush`, in registration order, on the
//! thread that flushes. A flush triggered from inside a running handler
//! (its own derived commit) does not recurse: the outer loop drains it.

use crate::events::{EntityEvent, EntityKind, EntityRef, HookKey, Operation};
use crate::guard::{InFlightKey, InFlightSet};
use crate::handler::{DeferredCallback, EventHandler, HandlerId, HookError, Registration};
use crate::ledger::{DeliveryKey, DeliveryLedger};
use crate::DEFAULT_FAILURE_LOG_CAPACITY;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use shared_types::TransactionId;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::ThreadId;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Errors from dispatcher bookkeeping.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The transaction was never opened, or already committed/rolled back.
    #[error("Transaction {0} is not open")]
    UnknownTransaction(TransactionId),

    /// `open_transaction` was called twice for the same id.
    #[error("Transaction {0} is already open")]
    TransactionAlreadyOpen(TransactionId),
}

/// Result of a `notify` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The mutation was recorded; `hooks` handler invocations are pending.
    Enqueued { hooks: usize },
    /// The mutation was already recorded for this transaction.
    Duplicate,
    /// A handler chain for this entity and operation is running.
    Suppressed,
}

/// One failed hook invocation, kept for operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookFailure {
    pub handler: String,
    pub entity: Option<EntityRef>,
    pub operation: Option<Operation>,
    pub tx: TransactionId,
    pub error: HookError,
    pub at: DateTime<Utc>,
}

/// Outcome of a `flush` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Hooks that completed successfully.
    pub fired: usize,
    /// Hooks that returned an error.
    pub failures: Vec<HookFailure>,
    /// `true` when called from inside a running flush; nothing ran here.
    pub nested: bool,
}

impl FlushReport {
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: FlushReport) {
        self.fired += other.fired;
        self.failures.extend(other.failures);
    }
}

/// Dispatcher tuning.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// How long delivered mutations are remembered for deduplication.
    pub ledger_retention_secs: u64,
    /// Ledger garbage collection interval.
    pub ledger_gc_interval_secs: u64,
    /// Number of failures kept for `recent_failures`.
    pub failure_log_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            ledger_retention_secs: DeliveryLedger::DEFAULT_RETENTION,
            ledger_gc_interval_secs: DeliveryLedger::DEFAULT_GC_INTERVAL,
            failure_log_capacity: DEFAULT_FAILURE_LOG_CAPACITY,
        }
    }
}

/// Monotonic dispatcher counters.
#[derive(Debug, Default)]
pub struct DispatchStats {
    notified: AtomicU64,
    enqueued: AtomicU64,
    duplicates: AtomicU64,
    suppressed: AtomicU64,
    fired: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of `DispatchStats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStatsSnapshot {
    pub notified: u64,
    pub enqueued: u64,
    pub duplicates: u64,
    pub suppressed: u64,
    pub fired: u64,
    pub failed: u64,
}

impl DispatchStats {
    #[must_use]
    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        DispatchStatsSnapshot {
            notified: self.notified.load(Ordering::Relaxed),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            fired: self.fired.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// The transaction-scoped hook interface the store coordinator drives.
pub trait TransactionHooks: Send + Sync {
    /// Start collecting hooks for `tx`.
    fn open_transaction(&self, tx: TransactionId) -> Result<(), DispatchError>;

    /// Record a mutation observed inside `tx`.
    fn notify(&self, tx: TransactionId, event: EntityEvent)
        -> Result<NotifyOutcome, DispatchError>;

    /// Register a callback to run after `tx` commits.
    fn defer(
        &self,
        tx: TransactionId,
        label: &str,
        callback: DeferredCallback,
    ) -> Result<(), DispatchError>;

    /// `tx` committed durably; its hooks become ready. Returns how many.
    fn commit(&self, tx: TransactionId) -> Result<usize, DispatchError>;

    /// `tx` was rolled back; its hooks are discarded. Returns how many.
    fn rollback(&self, tx: TransactionId) -> usize;

    /// Run every ready hook.
    fn flush(&self) -> FlushReport;

    /// Number of hooks waiting in the ready queue.
    fn ready_len(&self) -> usize;
}

enum PendingHook {
    Handler {
        tx: TransactionId,
        registration: Registration,
        event: Arc<EntityEvent>,
    },
    Callback {
        tx: TransactionId,
        label: String,
        callback: DeferredCallback,
    },
}

#[derive(Default)]
struct QueueState {
    /// Hooks of transactions that have not committed yet.
    open: HashMap<TransactionId, Vec<PendingHook>>,
    /// Hooks of committed transactions, in commit order.
    ready: VecDeque<PendingHook>,
}

/// In-process dispatcher with post-commit, at-most-once delivery.
pub struct EventDispatcher {
    registrations: RwLock<Vec<Registration>>,
    queue: Mutex<QueueState>,
    ledger: Mutex<DeliveryLedger>,
    in_flight: InFlightSet,
    failures: Mutex<VecDeque<HookFailure>>,
    flush_lock: Mutex<()>,
    flush_owner: Mutex<Option<ThreadId>>,
    next_handler_id: AtomicU64,
    stats: DispatchStats,
    config: DispatchConfig,
}

impl EventDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DispatchConfig::default())
    }

    #[must_use]
    pub fn with_config(config: DispatchConfig) -> Self {
        Self {
            registrations: RwLock::new(Vec::new()),
            queue: Mutex::new(QueueState::default()),
            ledger: Mutex::new(DeliveryLedger::with_config(
                config.ledger_retention_secs,
                config.ledger_gc_interval_secs,
            )),
            in_flight: InFlightSet::new(),
            failures: Mutex::new(VecDeque::new()),
            flush_lock: Mutex::new(()),
            flush_owner: Mutex::new(None),
            next_handler_id: AtomicU64::new(1),
            stats: DispatchStats::default(),
            config,
        }
    }

    /// Register `handler` for `(kind, operation)`.
    ///
    /// Handlers for the same key run in registration order.
    pub fn register(
        &self,
        kind: EntityKind,
        operation: Operation,
        handler: Arc<dyn EventHandler>,
    ) -> HandlerId {
        let id = HandlerId(self.next_handler_id.fetch_add(1, Ordering::Relaxed));
        let key = HookKey::new(kind, operation);
        debug!(handler = handler.name(), %key, %id, "Handler registered");
        self.registrations.write().push(Registration { id, key, handler });
        id
    }

    /// Remove a handler. Hooks already pending for it still run.
    pub fn unregister(&self, id: HandlerId) -> bool {
        let mut registrations = self.registrations.write();
        let before = registrations.len();
        registrations.retain(|registration| registration.id != id);
        registrations.len() != before
    }

    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.registrations.read().len()
    }

    #[must_use]
    pub fn stats(&self) -> DispatchStatsSnapshot {
        self.stats.snapshot()
    }

    /// Failures kept for operators, oldest first.
    #[must_use]
    pub fn recent_failures(&self) -> Vec<HookFailure> {
        self.failures.lock().iter().cloned().collect()
    }

    /// Drain the failure log.
    pub fn take_failures(&self) -> Vec<HookFailure> {
        self.failures.lock().drain(..).collect()
    }

    /// Whether a handler chain for `(entity, operation)` is running on any
    /// thread.
    #[must_use]
    pub fn is_in_flight(&self, entity: EntityRef, operation: Operation) -> bool {
        self.in_flight.is_running(entity, operation)
    }

    fn next_ready(&self) -> Option<PendingHook> {
        self.queue.lock().ready.pop_front()
    }

    fn run(&self, hook: PendingHook, report: &mut FlushReport) {
        match hook {
            PendingHook::Handler {
                tx,
                registration,
                event,
            } => {
                let entity = event.entity();
                let operation = event.operation();
                let _guard = self
                    .in_flight
                    .enter(InFlightKey::on_current_thread(entity, operation));
                match registration.handler.handle(&event) {
                    Ok(()) => {
                        self.stats.fired.fetch_add(1, Ordering::Relaxed);
                        report.fired += 1;
                        debug!(
                            handler = registration.handler.name(),
                            %entity,
                            %operation,
                            %tx,
                            "Post-commit hook fired"
                        );
                    }
                    Err(err) => self.record_failure(
                        report,
                        HookFailure {
                            handler: registration.handler.name().to_string(),
                            entity: Some(entity),
                            operation: Some(operation),
                            tx,
                            error: err,
                            at: Utc::now(),
                        },
                    ),
                }
            }
            PendingHook::Callback {
                tx,
                label,
                callback,
            } => match callback() {
                Ok(()) => {
                    self.stats.fired.fetch_add(1, Ordering::Relaxed);
                    report.fired += 1;
                    debug!(%label, %tx, "Deferred callback ran");
                }
                Err(err) => self.record_failure(
                    report,
                    HookFailure {
                        handler: label,
                        entity: None,
                        operation: None,
                        tx,
                        error: err,
                        at: Utc::now(),
                    },
                ),
            },
        }
    }

    fn record_failure(&self, report: &mut FlushReport, failure: HookFailure) {
        self.stats.failed.fetch_add(1, Ordering::Relaxed);
        error!(
            handler = %failure.handler,
            entity = ?failure.entity,
            tx = %failure.tx,
            error = %failure.error,
            "Post-commit hook failed; primary mutation stays committed"
        );

        let mut log = self.failures.lock();
        if self.config.failure_log_capacity > 0 {
            while log.len() >= self.config.failure_log_capacity {
                log.pop_front();
            }
            log.push_back(failure.clone());
        }
        report.failures.push(failure);
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the flush owner when the flush loop exits.
struct FlushOwner<'a>(&'a Mutex<Option<ThreadId>>);

impl Drop for FlushOwner<'_> {
    fn drop(&mut self) {
        *self.0.lock() = None;
    }
}

impl TransactionHooks for EventDispatcher {
    fn open_transaction(&self, tx: TransactionId) -> Result<(), DispatchError> {
        let mut queue = self.queue.lock();
        if queue.open.contains_key(&tx) {
            return Err(DispatchError::TransactionAlreadyOpen(tx));
        }
        queue.open.insert(tx, Vec::new());
        Ok(())
    }

    fn notify(
        &self,
        tx: TransactionId,
        event: EntityEvent,
    ) -> Result<NotifyOutcome, DispatchError> {
        self.stats.notified.fetch_add(1, Ordering::Relaxed);

        let entity = event.entity();
        let operation = event.operation();

        // Only the chain running on this thread is re-entrant; other threads
        // carry independent mutations.
        if self
            .in_flight
            .contains(&InFlightKey::on_current_thread(entity, operation))
        {
            self.stats.suppressed.fetch_add(1, Ordering::Relaxed);
            debug!(%entity, %operation, %tx, "Re-entrant notify suppressed");
            return Ok(NotifyOutcome::Suppressed);
        }

        let key = DeliveryKey {
            entity,
            operation,
            tx,
        };

        let mut queue = self.queue.lock();
        let mut ledger = self.ledger.lock();
        if ledger.contains(&key) {
            self.stats.duplicates.fetch_add(1, Ordering::Relaxed);
            debug!(%entity, %operation, %tx, "Duplicate notify ignored");
            return Ok(NotifyOutcome::Duplicate);
        }

        let Some(pending) = queue.open.get_mut(&tx) else {
            return Err(DispatchError::UnknownTransaction(tx));
        };

        if ledger.record(key).is_err() {
            self.stats.duplicates.fetch_add(1, Ordering::Relaxed);
            return Ok(NotifyOutcome::Duplicate);
        }
        drop(ledger);

        let event = Arc::new(event);
        let matching: Vec<Registration> = self
            .registrations
            .read()
            .iter()
            .filter(|registration| registration.matches(&event))
            .cloned()
            .collect();
        let hooks = matching.len();

        pending.extend(matching.into_iter().map(|registration| PendingHook::Handler {
            tx,
            registration,
            event: Arc::clone(&event),
        }));

        self.stats.enqueued.fetch_add(hooks as u64, Ordering::Relaxed);
        debug!(%entity, %operation, %tx, hooks, "Mutation recorded");
        Ok(NotifyOutcome::Enqueued { hooks })
    }

    fn defer(
        &self,
        tx: TransactionId,
        label: &str,
        callback: DeferredCallback,
    ) -> Result<(), DispatchError> {
        let mut queue = self.queue.lock();
        let pending = queue
            .open
            .get_mut(&tx)
            .ok_or(DispatchError::UnknownTransaction(tx))?;
        pending.push(PendingHook::Callback {
            tx,
            label: label.to_string(),
            callback,
        });
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn commit(&self, tx: TransactionId) -> Result<usize, DispatchError> {
        let mut queue = self.queue.lock();
        let pending = queue
            .open
            .remove(&tx)
            .ok_or(DispatchError::UnknownTransaction(tx))?;
        let count = pending.len();
        queue.ready.extend(pending);
        debug!(%tx, hooks = count, "Transaction committed, hooks ready");
        Ok(count)
    }

    fn rollback(&self, tx: TransactionId) -> usize {
        let discarded = self
            .queue
            .lock()
            .open
            .remove(&tx)
            .map(|pending| pending.len())
            .unwrap_or(0);
        self.ledger.lock().forget_transaction(tx);
        if discarded > 0 {
            warn!(%tx, discarded, "Transaction rolled back, pending hooks discarded");
        }
        discarded
    }

    fn flush(&self) -> FlushReport {
        let me = std::thread::current().id();
        if *self.flush_owner.lock() == Some(me) {
            debug!("Nested flush left to the running flush loop");
            return FlushReport {
                nested: true,
                ..FlushReport::default()
            };
        }

        let _serial = self.flush_lock.lock();
        *self.flush_owner.lock() = Some(me);
        let _owner = FlushOwner(&self.flush_owner);

        let mut report = FlushReport::default();
        while let Some(hook) = self.next_ready() {
            self.run(hook, &mut report);
        }
        report
    }

    fn ready_len(&self) -> usize {
        self.queue.lock().ready.len()
    }
}

#[cfg(test)]
mod tests;

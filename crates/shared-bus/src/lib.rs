//! # Shared Bus - Post-Commit Event Dispatcher
//!
//! Propagates primary-entity mutations to derived-state handlers.
//!
//! ## Delivery Rules
//!
//! - Handlers fire only after the owning transaction commits
//! - One delivery per `(entity, operation, transaction)`, however many
//!   times the mutation is notified
//! - Handlers for the same key fire in registration order
//! - A handler failure is logged and reported, never rolled back into
//!   the primary mutation
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐   notify()    ┌──────────────┐
//! │ Coordinator  │ ────────────→ │  Dispatcher  │
//! │              │   commit()    │              │
//! │              │ ────────────→ │ ready queue  │
//! └──────────────┘   flush()     └──────┬───────┘
//!                                       │ handle()
//!                                       ▼
//!                              ┌──────────────────┐
//!                              │ Derived handlers │
//!                              └──────────────────┘
//! ```
//!
//! ## Loop Protection
//!
//! - **Delivery Ledger:** time-bounded dedup of delivered mutations
//! - **In-Flight Guard:** re-notification of a running chain is dropped

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod dispatcher;
pub mod events;
pub mod guard;
pub mod handler;
pub mod ledger;

// Re-export main types
pub use dispatcher::{
    DispatchConfig, DispatchError, DispatchStatsSnapshot, EventDispatcher, FlushReport,
    HookFailure, NotifyOutcome, TransactionHooks,
};
pub use events::{EntityEvent, EntityKind, EntityRef, EntitySnapshot, HookKey, Operation};
pub use guard::{InFlightGuard, InFlightKey, InFlightSet};
pub use handler::{DeferredCallback, EventHandler, HandlerId, HookError, Registration};
pub use ledger::{DeliveryKey, DeliveryLedger, LedgerError};

/// Failures retained for operators by default.
pub const DEFAULT_FAILURE_LOG_CAPACITY: usize = 256;

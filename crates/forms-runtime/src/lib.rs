//! # Forms Runtime Library
//!
//! Wires the store, the dispatcher and the derived-state subsystems into a
//! single runtime. The `forms-runtime` binary is the operator CLI.
//!
//! ## Architectural Patterns
//!
//! - **Post-commit hooks**: Derived state follows primary writes through the
//!   shared dispatcher, never inside the primary transaction
//! - **Hexagonal Architecture**: Subsystems define ports; adapters wire them
//!   to the relational store
//!
//! ## Modules
//!
//! - `container/` - Configuration and subsystem construction
//! - `wiring/` - Handler registration
//! - `runtime` - The primary write API
//! - `status` - Counters and invariant check
//! - `demo` - End-to-end scenario

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod container;
pub mod demo;
pub mod errors;
pub mod runtime;
pub mod status;
pub mod wiring;

pub use container::{ConfigError, RuntimeConfig, StorageConfig, SubsystemContainer};
pub use demo::{run_demo, DemoOutcome, DemoStep};
pub use errors::RuntimeError;
pub use runtime::{FormsRuntime, IssuedTokens, RepairSummary};
pub use status::{check_invariants, StatusReport, Violation};
pub use wiring::{register_hooks, WiredHooks};

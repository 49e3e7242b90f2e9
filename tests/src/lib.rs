//! # Forms Signals Test Suite
//!
//! Cross-crate tests run against a fully wired `FormsRuntime`.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── integration/      # End-to-end flows
//! │   ├── scenario.rs       # Form creation and account lifecycle walkthrough
//! │   ├── idempotence.rs    # Duplicate notifications, concurrent writers
//! │   └── persistence.rs    # File-backed restart and repair
//! │
//! └── properties/       # Randomized transition sequences
//!     └── eligibility.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p fm-tests
//! cargo test -p fm-tests properties::
//! ```

pub mod fixtures;
pub mod integration;
pub mod properties;

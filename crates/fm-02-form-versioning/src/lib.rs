//! # Form Versioning (fm-02)
//!
//! The Version Manager: every created form receives exactly one initial
//! version, linked through an append-only history row, with one default
//! page "General" at sequence 1.
//!
//! ## Architecture
//!
//! ```text
//! Form.Created (post-commit) ──→ VersionManager ──→ derived transaction
//!                                                    ├─ FormVersion
//!                                                    ├─ FormVersionHistory
//!                                                    ├─ Page "General"/1
//!                                                    └─ PageVersionHistory
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | One initial version | At most one per committed form creation |
//! | All or nothing | The four rows commit together or not at all |
//! | Creation only | `Form.Updated` never creates a version |
//! | Append-only | Explicit versions add one history row and no page |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Errors and the repair report
//! - `ports/` - `FormHistoryApi`
//! - `service/` - `VersioningService` and the `VersionManager` hook

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::errors::VersioningError;
pub use domain::repair::{RepairError, RepairReport};
pub use ports::inbound::FormHistoryApi;
pub use service::{InitialVersion, VersionManager, VersioningService};

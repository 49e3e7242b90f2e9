//! # Shared Types Crate
//!
//! Domain rows, identifiers and validation errors shared by every crate in
//! the workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types are defined here.
//! - **History Is The Link**: Forms reach their versions, and versions
//!   their pages, only through append-only history rows.
//! - **Eligibility Is Derived**: `Account::is_eligible` is the only
//!   predicate the credential lifecycle looks at.

pub mod entities;
pub mod errors;
pub mod ids;

pub use entities::*;
pub use errors::*;
pub use ids::*;

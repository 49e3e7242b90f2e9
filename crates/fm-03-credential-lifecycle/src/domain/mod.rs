//! Domain layer for the credential lifecycle.

pub mod eligibility;
pub mod errors;
pub mod report;

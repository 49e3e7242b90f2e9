//! # Domain Layer
//!
//! Versioning errors and the corrective repair report.

pub mod errors;
pub mod repair;

//! # Error Types
//!
//! Validation errors raised before a primary write reaches the store.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors for malformed primary-entity payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The availability window ends before it starts.
    #[error("Availability window is inverted: {from} is after {to}")]
    InvertedWindow { from: NaiveDate, to: NaiveDate },

    /// A required text field is empty.
    #[error("Field `{field}` must not be empty")]
    EmptyField { field: &'static str },

    /// A text field exceeds its column width.
    #[error("Field `{field}` exceeds {max} characters")]
    FieldTooLong { field: &'static str, max: usize },

    /// Page sequence numbers start at 1.
    #[error("Page sequence must be at least 1, got {sequence}")]
    InvalidSequence { sequence: u32 },
}

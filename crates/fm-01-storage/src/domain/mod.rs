//! # Domain Layer
//!
//! Table layout, store errors and fault injection.

pub mod errors;
pub mod faults;
pub mod tables;

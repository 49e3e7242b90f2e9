//! Randomized properties.

pub mod eligibility;

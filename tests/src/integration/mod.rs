//! End-to-end flows through the wired runtime.

pub mod idempotence;
pub mod persistence;
pub mod scenario;

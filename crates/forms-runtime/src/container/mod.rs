//! # Subsystem Container
//!
//! Holds the store, the dispatcher and the derived-state services with
//! their adapters wired in.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, RuntimeConfig, StorageConfig};
pub use subsystems::SubsystemContainer;

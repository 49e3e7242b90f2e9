//! # Adapters
//!
//! Snapshot persistence implementations.

pub mod file;
#[cfg(feature = "locking")]
pub mod lock;
pub mod memory;

pub use file::FileSnapshotStore;
#[cfg(feature = "locking")]
pub use lock::{DataDirLock, LockError};
pub use memory::InMemorySnapshotStore;

//! # Application Service
//!
//! The relational store, its transactions and the coordinator that ties
//! primary writes to post-commit hooks.

mod coordinator;
mod store;
mod transaction;


pub use coordinator::{CommitReceipt, TransactionCoordinator, UnitOfWork};
pub use store::RelationalStore;
pub use transaction::StoreTransaction;

//! # Domain Errors
//!
//! Error types for the table store and the transaction coordinator.
//!
//! Constraint and validation failures are returned synchronously to the
//! writer; the transaction they occurred in is rolled back and no hooks
//! fire for it.

use crate::domain::tables::Table;
use shared_bus::DispatchError;
use shared_types::{
    AccountId, ApplicationId, CategoryId, FormId, PageId, TransactionId, ValidationError,
    VersionId,
};
use thiserror::Error;

/// Errors from store and coordinator operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Field-level validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    #[error("Form not found: {0}")]
    FormNotFound(FormId),

    #[error("Version not found: {0}")]
    VersionNotFound(VersionId),

    #[error("Page not found: {0}")]
    PageNotFound(PageId),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Application not found: {0}")]
    ApplicationNotFound(ApplicationId),

    /// Usernames are unique across accounts.
    #[error("Username already taken: {0}")]
    DuplicateUsername(String),

    /// Token strings are unique across access and refresh tokens.
    #[error("Token value already issued")]
    DuplicateToken,

    /// A fault armed with `fail_next_*` fired.
    #[error("Injected {operation} failure on table {table}")]
    InjectedFault {
        table: Table,
        operation: &'static str,
    },

    /// The calling thread already holds the writer.
    #[error("A transaction is already open on this thread")]
    TransactionInProgress,

    /// The unit of work already committed or rolled back.
    #[error("Transaction {0} is closed")]
    TransactionClosed(TransactionId),

    /// Dispatcher bookkeeping rejected the transaction.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Snapshot could not be written or read.
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    /// Data directory is held by another process.
    #[error("Data directory locked: {message}")]
    Locked { message: String },
}

impl StoreError {
    /// Whether the error is a constraint or validation failure of the
    /// caller's input, as opposed to an infrastructure failure.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            StoreError::Validation(_)
                | StoreError::CategoryNotFound(_)
                | StoreError::FormNotFound(_)
                | StoreError::VersionNotFound(_)
                | StoreError::PageNotFound(_)
                | StoreError::AccountNotFound(_)
                | StoreError::ApplicationNotFound(_)
                | StoreError::DuplicateUsername(_)
                | StoreError::DuplicateToken
        )
    }

    pub(crate) fn persistence(err: impl std::fmt::Display) -> Self {
        StoreError::Persistence {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_classified() {
        assert!(StoreError::DuplicateUsername("ana".into()).is_rejection());
        assert!(!StoreError::TransactionInProgress.is_rejection());
        assert!(!StoreError::InjectedFault {
            table: Table::Page,
            operation: "insert"
        }
        .is_rejection());
    }

    #[test]
    fn test_fault_display() {
        let err = StoreError::InjectedFault {
            table: Table::AccessToken,
            operation: "delete",
        };
        assert_eq!(err.to_string(), "Injected delete failure on table access_token");
    }
}

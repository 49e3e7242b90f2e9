//! # Domain Errors

use fm_01_storage::StoreError;
use shared_bus::HookError;
use shared_types::{FormId, VersionId};
use thiserror::Error;

/// Errors from version history operations.
#[derive(Debug, Error)]
pub enum VersioningError {
    #[error("Form not found: {0}")]
    FormNotFound(FormId),

    #[error("Version not found: {0}")]
    VersionNotFound(VersionId),

    /// The derived transaction failed and was rolled back.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<VersioningError> for HookError {
    fn from(err: VersioningError) -> Self {
        HookError::DerivedWrite(err.to_string())
    }
}

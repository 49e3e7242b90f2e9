//! # Runtime Errors

use crate::container::ConfigError;
use fm_01_storage::StoreError;
use fm_02_form_versioning::VersioningError;
use fm_03_credential_lifecycle::CredentialError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Versioning(#[from] VersioningError),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

//! # Domain Errors

use chrono::{DateTime, Utc};
use fm_01_storage::StoreError;
use shared_bus::HookError;
use shared_types::AccountId;
use thiserror::Error;

/// Errors from revocation and token-store access.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// The revocation transaction failed and was rolled back.
    #[error("Token store error: {0}")]
    Store(#[from] StoreError),
}

impl From<CredentialError> for HookError {
    fn from(err: CredentialError) -> Self {
        let message = err.to_string();
        match err {
            CredentialError::Store(inner) if !inner.is_rejection() => {
                HookError::Unavailable(message)
            }
            _ => HookError::DerivedWrite(message),
        }
    }
}

/// Why a presented access token was refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("Unknown access token")]
    UnknownToken,

    #[error("Access token expired at {expires}")]
    Expired { expires: DateTime<Utc> },

    #[error("Token owner {0} no longer exists")]
    AccountNotFound(AccountId),

    /// Checked on every request, independent of revocation.
    #[error("Account {0} is not eligible for web access")]
    Ineligible(AccountId),

    #[error("Token lookup failed: {0}")]
    Lookup(String),
}

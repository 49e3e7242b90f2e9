//! # Inbound Ports (Driving Ports)

use crate::domain::errors::{AuthorizationError, CredentialError};
use crate::domain::report::{PendingRevocation, RevocationReport, RevokedTokens};
use chrono::{DateTime, Utc};
use serde::Serialize;
use shared_types::{AccountId, ApplicationId};

/// The owner of an accepted access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizedAccount {
    pub account: AccountId,
    pub username: String,
    pub application: ApplicationId,
    pub scope: String,
    pub expires: DateTime<Utc>,
}

/// Primary API of the Credential Lifecycle Manager.
pub trait CredentialLifecycleApi {
    /// Delete every token of `account` now, whatever its eligibility.
    ///
    /// A failure is queued for `retry_pending`.
    fn revoke_account(&self, account: AccountId) -> Result<RevokedTokens, CredentialError>;

    /// Retry every queued revocation.
    fn retry_pending(&self) -> RevocationReport;

    /// Revocations still waiting for a retry.
    fn pending(&self) -> Vec<PendingRevocation>;

    /// Revoke the tokens of every ineligible account that still holds any.
    fn sweep(&self) -> Result<RevocationReport, CredentialError>;

    /// Accept `token` only if it exists, is unexpired and its owner is
    /// currently eligible.
    ///
    /// ## Errors
    ///
    /// - `UnknownToken`: No such access token
    /// - `Expired`: Past its expiry
    /// - `Ineligible`: Owner inactive or without web access
    fn authorize(&self, token: &str) -> Result<AuthorizedAccount, AuthorizationError>;
}

//! Outbound (Driven) ports for the credential lifecycle.

use crate::domain::errors::CredentialError;
use chrono::{DateTime, Utc};
use shared_types::{AccessToken, Account, AccountId, TokenRef};

/// Where access and refresh tokens live.
pub trait TokenStore: Send + Sync {
    /// Every access and refresh token of `account`.
    fn tokens_for_account(&self, account: AccountId) -> Result<Vec<TokenRef>, CredentialError>;

    /// Delete `tokens` in one transaction. Returns the number removed.
    ///
    /// Either every listed token is gone afterwards or none is.
    fn delete_tokens(&self, tokens: &[TokenRef]) -> Result<usize, CredentialError>;

    /// Delete every token of `account`. Returns the tokens removed.
    ///
    /// The default lists, then deletes, so a token issued in between
    /// survives. Stores that can do both in one transaction override it.
    fn revoke_all(&self, account: AccountId) -> Result<Vec<TokenRef>, CredentialError> {
        let tokens = self.tokens_for_account(account)?;
        if !tokens.is_empty() {
            self.delete_tokens(&tokens)?;
        }
        Ok(tokens)
    }
}

/// Account and token lookups for authorization and the sweep.
pub trait AccountDirectory: Send + Sync {
    fn account(&self, id: AccountId) -> Result<Option<Account>, CredentialError>;

    fn access_token(&self, token: &str) -> Result<Option<AccessToken>, CredentialError>;

    /// Accounts that are ineligible yet still own tokens.
    fn ineligible_accounts_with_tokens(&self) -> Result<Vec<AccountId>, CredentialError>;
}

/// Time source for token expiry checks.
///
/// Abstracted to allow testing with deterministic time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed time for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

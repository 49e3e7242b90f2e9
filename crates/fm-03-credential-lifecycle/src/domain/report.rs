//! # Revocation Reports
//!
//! Bookkeeping for revocations that failed after the account update had
//! already committed, and the report of the corrective sweep.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared_types::{AccountId, TokenRef};

/// Tokens removed by one revocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RevokedTokens {
    pub access: usize,
    pub refresh: usize,
}

impl RevokedTokens {
    /// Split `tokens` by kind.
    #[must_use]
    pub fn of(tokens: &[TokenRef]) -> Self {
        let access = tokens
            .iter()
            .filter(|token| matches!(token, TokenRef::Access(_)))
            .count();
        Self {
            access,
            refresh: tokens.len() - access,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.access + self.refresh
    }
}

/// A revocation that must be retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingRevocation {
    pub account: AccountId,
    pub attempts: u32,
    pub first_failed_at: DateTime<Utc>,
    pub last_error: String,
}

impl PendingRevocation {
    pub fn new(account: AccountId, error: impl Into<String>) -> Self {
        Self {
            account,
            attempts: 1,
            first_failed_at: Utc::now(),
            last_error: error.into(),
        }
    }

    /// Record another failed attempt.
    pub fn failed_again(&mut self, error: impl Into<String>) {
        self.attempts += 1;
        self.last_error = error.into();
    }
}

/// A failed revocation within a sweep or retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevocationFailure {
    pub account: AccountId,
    pub message: String,
}

/// Result of `sweep` or `retry_pending`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RevocationReport {
    /// Accounts examined
    pub accounts_scanned: u64,
    /// Accounts whose tokens were removed
    pub accounts_revoked: Vec<AccountId>,
    /// Tokens removed across all accounts
    pub tokens: RevokedTokens,
    /// Failures (non-fatal, left pending)
    pub errors: Vec<RevocationFailure>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl RevocationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_successful(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_revoked(&mut self, account: AccountId, tokens: RevokedTokens) {
        if tokens.total() > 0 {
            self.accounts_revoked.push(account);
        }
        self.tokens.access += tokens.access;
        self.tokens.refresh += tokens.refresh;
    }

    pub fn add_error(&mut self, account: AccountId, message: impl Into<String>) {
        self.errors.push(RevocationFailure {
            account,
            message: message.into(),
        });
    }
}

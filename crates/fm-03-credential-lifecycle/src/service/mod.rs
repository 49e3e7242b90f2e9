//! # Credential Lifecycle Service
//!
//! Revokes tokens on eligibility loss, queues failed revocations for
//! retry, and authorizes access tokens against current eligibility.

mod handler;


use crate::domain::eligibility::Eligibility;
use crate::domain::errors::{AuthorizationError, CredentialError};
use crate::domain::report::{PendingRevocation, RevocationReport, RevokedTokens};
use crate::ports::inbound::{AuthorizedAccount, CredentialLifecycleApi};
use crate::ports::outbound::{AccountDirectory, Clock, SystemClock, TokenStore};
use forms_telemetry::{
    metric_add, metric_inc, PENDING_REVOCATIONS, REPAIRS, REVOCATION_FAILURES, TOKENS_REVOKED,
};
use parking_lot::Mutex;
use shared_types::AccountId;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Handler for `Account.Updated` plus the corrective operations.
pub struct CredentialLifecycleManager {
    tokens: Arc<dyn TokenStore>,
    directory: Arc<dyn AccountDirectory>,
    clock: Arc<dyn Clock>,
    pending: Mutex<BTreeMap<AccountId, PendingRevocation>>,
}

impl CredentialLifecycleManager {
    pub const NAME: &'static str = "credential_lifecycle";

    pub fn new(tokens: Arc<dyn TokenStore>, directory: Arc<dyn AccountDirectory>) -> Self {
        Self {
            tokens,
            directory,
            clock: Arc::new(SystemClock),
            pending: Mutex::new(BTreeMap::new()),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    fn revoke_tokens(&self, account: AccountId) -> Result<RevokedTokens, CredentialError> {
        let tokens = self.tokens.revoke_all(account)?;
        if tokens.is_empty() {
            debug!(account_id = %account, "No tokens to revoke");
        }
        Ok(RevokedTokens::of(&tokens))
    }

    fn record_failure(&self, account: AccountId, err: &CredentialError) {
        metric_inc!(REVOCATION_FAILURES);
        let mut pending = self.pending.lock();
        pending
            .entry(account)
            .and_modify(|entry| entry.failed_again(err.to_string()))
            .or_insert_with(|| PendingRevocation::new(account, err.to_string()));
        PENDING_REVOCATIONS.set(pending.len() as f64);
        warn!(account_id = %account, error = %err, "Revocation failed, queued for retry");
    }

    fn clear_pending(&self, account: AccountId) {
        let mut pending = self.pending.lock();
        if pending.remove(&account).is_some() {
            PENDING_REVOCATIONS.set(pending.len() as f64);
        }
    }

    fn revoke_into(&self, account: AccountId, report: &mut RevocationReport) {
        match self.revoke_account(account) {
            Ok(revoked) => report.add_revoked(account, revoked),
            Err(err) => report.add_error(account, err.to_string()),
        }
    }
}

impl CredentialLifecycleApi for CredentialLifecycleManager {
    fn revoke_account(&self, account: AccountId) -> Result<RevokedTokens, CredentialError> {
        match self.revoke_tokens(account) {
            Ok(revoked) => {
                self.clear_pending(account);
                if revoked.total() > 0 {
                    metric_add!(TOKENS_REVOKED, &["access"], revoked.access);
                    metric_add!(TOKENS_REVOKED, &["refresh"], revoked.refresh);
                    info!(
                        account_id = %account,
                        access = revoked.access,
                        refresh = revoked.refresh,
                        "Tokens revoked"
                    );
                }
                Ok(revoked)
            }
            Err(CredentialError::AccountNotFound(id)) => {
                self.clear_pending(account);
                Err(CredentialError::AccountNotFound(id))
            }
            Err(err) => {
                self.record_failure(account, &err);
                Err(err)
            }
        }
    }

    fn retry_pending(&self) -> RevocationReport {
        let start = Instant::now();
        let accounts: Vec<AccountId> = self.pending.lock().keys().copied().collect();
        let mut report = RevocationReport::new();
        report.accounts_scanned = accounts.len() as u64;

        for account in accounts {
            self.revoke_into(account, &mut report);
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        if report.accounts_scanned > 0 {
            info!(
                retried = report.accounts_scanned,
                failed = report.errors.len(),
                "Pending revocations retried"
            );
        }
        report
    }

    fn pending(&self) -> Vec<PendingRevocation> {
        self.pending.lock().values().cloned().collect()
    }

    fn sweep(&self) -> Result<RevocationReport, CredentialError> {
        let start = Instant::now();
        let mut report = RevocationReport::new();

        let mut accounts = self.directory.ineligible_accounts_with_tokens()?;
        for account in self.pending.lock().keys() {
            if !accounts.contains(account) {
                accounts.push(*account);
            }
        }
        report.accounts_scanned = accounts.len() as u64;

        for account in accounts {
            self.revoke_into(account, &mut report);
        }

        metric_add!(REPAIRS, &["credentials"], report.accounts_revoked.len());
        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            scanned = report.accounts_scanned,
            revoked = report.accounts_revoked.len(),
            tokens = report.tokens.total(),
            errors = report.errors.len(),
            "Credential sweep finished"
        );
        Ok(report)
    }

    fn authorize(&self, token: &str) -> Result<AuthorizedAccount, AuthorizationError> {
        let lookup = |err: CredentialError| AuthorizationError::Lookup(err.to_string());

        let access = self
            .directory
            .access_token(token)
            .map_err(lookup)?
            .ok_or(AuthorizationError::UnknownToken)?;
        if access.is_expired(self.clock.now()) {
            return Err(AuthorizationError::Expired {
                expires: access.expires,
            });
        }

        let account = self
            .directory
            .account(access.account)
            .map_err(lookup)?
            .ok_or(AuthorizationError::AccountNotFound(access.account))?;
        if !Eligibility::of(&account).is_eligible() {
            debug!(account_id = %account.id, "Token refused, account ineligible");
            return Err(AuthorizationError::Ineligible(account.id));
        }

        Ok(AuthorizedAccount {
            account: account.id,
            username: account.username,
            application: access.application,
            scope: access.scope,
            expires: access.expires,
        })
    }
}

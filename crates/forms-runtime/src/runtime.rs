//! # Forms Runtime
//!
//! The primary write API. Every call runs in its own unit of work: the row
//! write commits first, then the ready hooks are flushed. Derived-state
//! failures never surface in the caller's result; they are counted and kept
//! in the dispatcher's failure log for `status` and `repair`.

use crate::container::{RuntimeConfig, StorageConfig, SubsystemContainer};
use crate::errors::RuntimeError;
use crate::status::{check_invariants, FailureSummary, StatusReport};
use crate::wiring::{register_hooks, WiredHooks};
use chrono::{Duration, Utc};
use fm_01_storage::{StoreError, UnitOfWork};
use fm_02_form_versioning::{FormHistoryApi, RepairReport};
use fm_03_credential_lifecycle::{
    AuthorizationError, AuthorizedAccount, CredentialLifecycleApi, RevocationReport,
};
use forms_telemetry::{
    metric_add, metric_inc, time_histogram, FLUSH_DURATION, HOOKS_FIRED, HOOK_FAILURES,
};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use shared_bus::{FlushReport, HookFailure, TransactionHooks};
use shared_types::{
    AccessToken, Account, AccountId, AccountPatch, Application, ApplicationId, Category,
    ClientType, Form, FormId, FormPatch, FormVersion, FormVersionHistory, GrantType, NewAccount,
    NewForm, Page, RefreshToken, VersionId,
};
use tracing::{info, warn};

/// Length of generated token values.
pub const TOKEN_LENGTH: usize = 40;

/// An access token and the refresh token bound to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedTokens {
    pub access: AccessToken,
    pub refresh: RefreshToken,
}

/// Result of `repair`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairSummary {
    pub versions: RepairReport,
    pub credentials: RevocationReport,
}

impl RepairSummary {
    pub fn is_successful(&self) -> bool {
        self.versions.is_successful() && self.credentials.is_successful()
    }
}

pub struct FormsRuntime {
    container: SubsystemContainer,
    hooks: WiredHooks,
}

impl FormsRuntime {
    /// Build the subsystems and wire the hooks.
    pub fn new(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        let container = SubsystemContainer::new(config)?;
        let hooks = register_hooks(&container);
        info!(
            flush_on_commit = container.config.flush_on_commit,
            "Forms runtime ready"
        );
        Ok(Self { container, hooks })
    }

    /// A runtime over an empty in-memory store.
    pub fn ephemeral() -> Result<Self, RuntimeError> {
        Self::new(RuntimeConfig {
            storage: StorageConfig::ephemeral(),
            ..RuntimeConfig::default()
        })
    }

    pub fn container(&self) -> &SubsystemContainer {
        &self.container
    }

    pub fn hooks(&self) -> WiredHooks {
        self.hooks
    }

    // =========================================================================
    // Primary writes
    // =========================================================================

    /// Run `op` in one unit of work, commit, then flush if configured.
    ///
    /// An error from `op` rolls back every write it made; no hook fires.
    pub fn transaction<T>(
        &self,
        op: impl FnOnce(&mut UnitOfWork<'_>) -> Result<T, StoreError>,
    ) -> Result<T, RuntimeError> {
        let mut uow = self.container.coordinator.begin()?;
        let value = op(&mut uow)?;
        uow.commit()?;
        if self.container.config.flush_on_commit {
            self.flush();
        }
        Ok(value)
    }

    pub fn create_category(&self, name: &str) -> Result<Category, RuntimeError> {
        self.transaction(|uow| uow.create_category(name))
    }

    pub fn create_form(&self, new: NewForm) -> Result<Form, RuntimeError> {
        self.transaction(|uow| uow.create_form(new))
    }

    pub fn update_form(&self, id: FormId, patch: &FormPatch) -> Result<Form, RuntimeError> {
        self.transaction(|uow| uow.update_form(id, patch))
    }

    pub fn create_account(&self, new: NewAccount) -> Result<Account, RuntimeError> {
        self.transaction(|uow| uow.create_account(new))
    }

    pub fn update_account(
        &self,
        id: AccountId,
        patch: &AccountPatch,
    ) -> Result<Account, RuntimeError> {
        self.transaction(|uow| uow.update_account(id, patch))
    }

    pub fn create_application(
        &self,
        name: &str,
        client_type: ClientType,
        grant_type: GrantType,
    ) -> Result<Application, RuntimeError> {
        self.transaction(|uow| uow.create_application(name, client_type, grant_type))
    }

    /// Issue an access token valid for `ttl` and its refresh token.
    pub fn issue_tokens(
        &self,
        account: AccountId,
        application: ApplicationId,
        ttl: Duration,
        scope: &str,
    ) -> Result<IssuedTokens, RuntimeError> {
        self.transaction(|uow| {
            let access = uow.issue_access_token(
                account,
                application,
                generate_token(),
                Utc::now() + ttl,
                scope.to_string(),
            )?;
            let refresh =
                uow.issue_refresh_token(account, application, generate_token(), Some(access.id))?;
            Ok(IssuedTokens { access, refresh })
        })
    }

    // =========================================================================
    // History and credentials
    // =========================================================================

    pub fn list_versions(&self, form: FormId) -> Result<Vec<FormVersion>, RuntimeError> {
        Ok(self.container.versioning.list_versions(form)?)
    }

    pub fn current_version(&self, form: FormId) -> Result<Option<FormVersion>, RuntimeError> {
        Ok(self.container.versioning.current_version(form)?)
    }

    pub fn list_pages(&self, version: VersionId) -> Result<Vec<Page>, RuntimeError> {
        Ok(self.container.versioning.list_pages(version)?)
    }

    pub fn append_version(&self, form: FormId) -> Result<FormVersionHistory, RuntimeError> {
        Ok(self.container.versioning.append_version(form)?)
    }

    pub fn add_page(&self, version: VersionId, name: &str) -> Result<Page, RuntimeError> {
        Ok(self.container.versioning.add_page(version, name)?)
    }

    /// Tokens currently held by `account`.
    pub fn token_count(&self, account: AccountId) -> usize {
        self.container
            .store
            .read(|tables| tables.tokens_for_account(account).len())
    }

    pub fn authorize(&self, token: &str) -> Result<AuthorizedAccount, AuthorizationError> {
        self.container.credentials.authorize(token)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Run every ready hook.
    pub fn flush(&self) -> FlushReport {
        let report = {
            let _timer = time_histogram!(FLUSH_DURATION);
            self.container.coordinator.flush_pending_hooks()
        };
        record_flush(&report);
        report
    }

    pub fn recent_failures(&self) -> Vec<HookFailure> {
        self.container.dispatcher.recent_failures()
    }

    /// Flush, then re-run both corrective tools.
    pub fn repair(&self) -> Result<RepairSummary, RuntimeError> {
        self.flush();
        let versions = self.container.versioning.repair()?;
        let credentials = self.container.credentials.sweep()?;
        let summary = RepairSummary {
            versions,
            credentials,
        };
        info!(
            forms_repaired = summary.versions.repaired(),
            accounts_revoked = summary.credentials.accounts_revoked.len(),
            successful = summary.is_successful(),
            "Repair finished"
        );
        Ok(summary)
    }

    pub fn status(&self) -> StatusReport {
        let store = &self.container.store;
        let dispatcher = &self.container.dispatcher;
        StatusReport {
            persistence: store.persistence(),
            commits: store.commit_count(),
            tables: store.counts(),
            dispatch: dispatcher.stats(),
            handlers: dispatcher.handler_count(),
            ready_hooks: dispatcher.ready_len(),
            recent_failures: dispatcher
                .recent_failures()
                .iter()
                .map(FailureSummary::from)
                .collect(),
            pending_revocations: self.container.credentials.pending(),
            violations: store.read(check_invariants),
        }
    }
}

fn record_flush(report: &FlushReport) {
    metric_add!(HOOKS_FIRED, report.fired);
    for failure in &report.failures {
        metric_inc!(HOOK_FAILURES, &[failure.handler.as_str()]);
    }
    if !report.is_clean() {
        warn!(
            fired = report.fired,
            failed = report.failed(),
            "Flush finished with hook failures"
        );
    }
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fm_01_storage::Table;
    use shared_types::{FormStatus, SubmissionMode};

    fn new_form(category: Category) -> NewForm {
        NewForm {
            category: category.id,
            name: "Enrollment".into(),
            description: "Fall intake".into(),
            available_from: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            available_to: NaiveDate::from_ymd_opt(2026, 12, 15).unwrap(),
            status: FormStatus::Active,
            submission_mode: SubmissionMode::Online,
        }
    }

    fn account_with_tokens(runtime: &FormsRuntime, username: &str) -> AccountId {
        let account = runtime
            .create_account(NewAccount::new(username, username, "a@example.com", "hash"))
            .unwrap();
        let app = runtime
            .create_application(
                &format!("{username}-app"),
                ClientType::Public,
                GrantType::AuthorizationCode,
            )
            .unwrap();
        runtime
            .issue_tokens(account.id, app.id, Duration::hours(1), "forms")
            .unwrap();
        account.id
    }

    #[test]
    fn test_create_form_versions_it() {
        let runtime = FormsRuntime::ephemeral().unwrap();
        let category = runtime.create_category("Admissions").unwrap();
        let form = runtime.create_form(new_form(category)).unwrap();

        let versions = runtime.list_versions(form.id).unwrap();
        assert_eq!(versions.len(), 1);
        let pages = runtime.list_pages(versions[0].id).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_default());
        assert!(runtime.status().is_healthy());
    }

    #[test]
    fn test_invalid_form_rolls_back() {
        let runtime = FormsRuntime::ephemeral().unwrap();
        let category = runtime.create_category("Admissions").unwrap();
        let mut new = new_form(category);
        new.available_to = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();

        assert!(matches!(
            runtime.create_form(new),
            Err(RuntimeError::Store(StoreError::Validation(_)))
        ));
        let status = runtime.status();
        assert_eq!(status.tables.forms, 0);
        assert_eq!(status.tables.versions, 0);
        assert_eq!(status.dispatch.fired, 0);
    }

    #[test]
    fn test_issued_tokens_are_distinct_and_authorized() {
        let runtime = FormsRuntime::ephemeral().unwrap();
        let account = runtime
            .create_account(NewAccount::new("alice", "Alice", "a@example.com", "hash"))
            .unwrap();
        let app = runtime
            .create_application("portal", ClientType::Confidential, GrantType::Password)
            .unwrap();
        let issued = runtime
            .issue_tokens(account.id, app.id, Duration::minutes(5), "forms")
            .unwrap();

        assert_eq!(issued.access.token.len(), TOKEN_LENGTH);
        assert_ne!(issued.access.token, issued.refresh.token);
        assert_eq!(issued.refresh.access_token, Some(issued.access.id));
        assert_eq!(
            runtime.authorize(&issued.access.token).unwrap().account,
            account.id
        );
    }

    #[test]
    fn test_deactivation_revokes_tokens() {
        let runtime = FormsRuntime::ephemeral().unwrap();
        let alice = account_with_tokens(&runtime, "alice");
        assert_eq!(runtime.token_count(alice), 2);

        runtime
            .update_account(alice, &AccountPatch::active(false))
            .unwrap();
        assert_eq!(runtime.token_count(alice), 0);
    }

    #[test]
    fn test_hooks_wait_for_flush_when_not_flushing_on_commit() {
        let runtime = FormsRuntime::new(RuntimeConfig {
            storage: StorageConfig::ephemeral(),
            flush_on_commit: false,
            ..RuntimeConfig::default()
        })
        .unwrap();
        let category = runtime.create_category("Admissions").unwrap();
        let form = runtime.create_form(new_form(category)).unwrap();

        assert!(runtime.list_versions(form.id).unwrap().is_empty());
        assert_eq!(runtime.status().ready_hooks, 1);

        let report = runtime.flush();
        assert_eq!(report.fired, 1);
        assert_eq!(runtime.list_versions(form.id).unwrap().len(), 1);
    }

    #[test]
    fn test_version_appended_before_flush_still_gets_default_page() {
        let runtime = FormsRuntime::new(RuntimeConfig {
            storage: StorageConfig::ephemeral(),
            flush_on_commit: false,
            ..RuntimeConfig::default()
        })
        .unwrap();
        let category = runtime.create_category("Admissions").unwrap();
        let form = runtime.create_form(new_form(category)).unwrap();
        let appended = runtime.append_version(form.id).unwrap();

        assert_eq!(runtime.flush().fired, 1);

        let versions = runtime.list_versions(form.id).unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].id, appended.version);
        let pages = runtime.list_pages(appended.version).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_default());

        let summary = runtime.repair().unwrap();
        assert_eq!(summary.versions.repaired(), 0);
        assert!(runtime.status().violations.is_empty());
    }

    #[test]
    fn test_repair_fixes_both_subsystems() {
        let runtime = FormsRuntime::ephemeral().unwrap();
        let store = runtime.container().store.clone();
        let category = runtime.create_category("Admissions").unwrap();
        let alice = account_with_tokens(&runtime, "alice");

        store.fail_next_inserts(Table::Page, 1);
        let form = runtime.create_form(new_form(category)).unwrap();
        store.fail_next_deletes(Table::AccessToken, 1);
        runtime
            .update_account(alice, &AccountPatch::web_access(false))
            .unwrap();

        let status = runtime.status();
        assert_eq!(status.recent_failures.len(), 2);
        assert_eq!(status.violations.len(), 2);
        assert_eq!(status.pending_revocations.len(), 1);

        let summary = runtime.repair().unwrap();
        assert!(summary.is_successful());
        assert_eq!(summary.versions.forms_repaired, vec![form.id]);
        assert_eq!(summary.credentials.accounts_revoked, vec![alice]);

        let status = runtime.status();
        assert!(status.violations.is_empty());
        assert!(status.pending_revocations.is_empty());
    }

    #[test]
    fn test_failed_transaction_leaves_nothing() {
        let runtime = FormsRuntime::ephemeral().unwrap();
        let result = runtime.transaction(|uow| {
            let category = uow.create_category("Admissions")?;
            uow.create_form(new_form(category))?;
            uow.create_account(NewAccount::new("", "", "", ""))
        });

        assert!(result.is_err());
        let status = runtime.status();
        assert_eq!(status.tables.forms, 0);
        assert_eq!(status.tables.categories, 0);
        assert_eq!(status.dispatch.fired, 0);
    }
}

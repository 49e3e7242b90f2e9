//! # Runtime Status
//!
//! Table counts, dispatcher counters and an invariant check over the
//! committed tables.
//!
//! ## Checked Invariants
//!
//! | Violation | Meaning |
//! |-----------|---------|
//! | `FormWithoutVersion` | A committed form has no history row |
//! | `MissingDefaultPage` | A form's first version lacks "General"/1 |
//! | `IneligibleWithTokens` | An ineligible account still owns tokens |
//!
//! Each of them is corrected by `repair`.

use chrono::{DateTime, Utc};
use fm_01_storage::{TableCounts, Tables};
use fm_03_credential_lifecycle::PendingRevocation;
use serde::Serialize;
use shared_bus::{DispatchStatsSnapshot, HookFailure};
use shared_types::{AccountId, FormId, TransactionId, VersionId};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    FormWithoutVersion { form: FormId },
    MissingDefaultPage { form: FormId, version: VersionId },
    IneligibleWithTokens { account: AccountId, tokens: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::FormWithoutVersion { form } => write!(f, "{form} has no version"),
            Violation::MissingDefaultPage { form, version } => {
                write!(f, "{form}: initial {version} has no default page")
            }
            Violation::IneligibleWithTokens { account, tokens } => {
                write!(f, "{account} is ineligible but holds {tokens} token(s)")
            }
        }
    }
}

/// Check every derived-state invariant against `tables`.
pub fn check_invariants(tables: &Tables) -> Vec<Violation> {
    let mut violations = Vec::new();

    for form in tables.forms.keys().copied() {
        let Some(initial) = tables.versions_for_form(form).first().copied() else {
            violations.push(Violation::FormWithoutVersion { form });
            continue;
        };
        let has_default = tables
            .pages_for_version(initial.id)
            .iter()
            .any(|page| page.is_default());
        if !has_default {
            violations.push(Violation::MissingDefaultPage {
                form,
                version: initial.id,
            });
        }
    }

    for account in tables.ineligible_accounts_with_tokens() {
        violations.push(Violation::IneligibleWithTokens {
            account,
            tokens: tables.tokens_for_account(account).len(),
        });
    }

    violations
}

/// A hook failure, flattened for output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureSummary {
    pub handler: String,
    pub tx: TransactionId,
    pub error: String,
    pub at: DateTime<Utc>,
}

impl From<&HookFailure> for FailureSummary {
    fn from(failure: &HookFailure) -> Self {
        Self {
            handler: failure.handler.clone(),
            tx: failure.tx,
            error: failure.error.to_string(),
            at: failure.at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub persistence: String,
    /// Store commits since the runtime started
    pub commits: u64,
    pub tables: TableCounts,
    pub dispatch: DispatchStatsSnapshot,
    pub handlers: usize,
    /// Hooks of committed transactions not yet run
    pub ready_hooks: usize,
    pub recent_failures: Vec<FailureSummary>,
    pub pending_revocations: Vec<PendingRevocation>,
    pub violations: Vec<Violation>,
}

impl StatusReport {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.violations.is_empty() && self.pending_revocations.is_empty()
    }
}

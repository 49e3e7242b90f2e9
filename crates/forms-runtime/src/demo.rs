//! # End-to-End Scenario
//!
//! Drives one form creation and an account through every eligibility
//! transition, recording what each step expected and what it observed.

use crate::errors::RuntimeError;
use crate::runtime::FormsRuntime;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use shared_types::{
    AccountPatch, ClientType, FormStatus, GrantType, NewAccount, NewForm, SubmissionMode,
    DEFAULT_PAGE_NAME, DEFAULT_PAGE_SEQUENCE,
};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoStep {
    pub name: &'static str,
    pub expected: String,
    pub observed: String,
}

impl DemoStep {
    fn new(name: &'static str, expected: impl ToString, observed: impl ToString) -> Self {
        let step = Self {
            name,
            expected: expected.to_string(),
            observed: observed.to_string(),
        };
        info!(
            step = name,
            expected = %step.expected,
            observed = %step.observed,
            ok = step.ok(),
            "Demo step"
        );
        step
    }

    pub fn ok(&self) -> bool {
        self.expected == self.observed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoOutcome {
    pub steps: Vec<DemoStep>,
    pub hook_failures: usize,
}

impl DemoOutcome {
    pub fn passed(&self) -> bool {
        self.hook_failures == 0 && self.steps.iter().all(DemoStep::ok)
    }
}

/// Run the scenario against `runtime`.
pub fn run_demo(runtime: &FormsRuntime) -> Result<DemoOutcome, RuntimeError> {
    let mut steps = Vec::new();

    // A new form gets one version with the default page.
    let category = runtime.create_category("Admissions")?;
    let form = runtime.create_form(NewForm {
        category: category.id,
        name: "Enrollment".into(),
        description: "Fall intake".into(),
        available_from: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap_or_default(),
        available_to: NaiveDate::from_ymd_opt(2026, 12, 15).unwrap_or_default(),
        status: FormStatus::Active,
        submission_mode: SubmissionMode::Online,
    })?;
    let versions = runtime.list_versions(form.id)?;
    steps.push(DemoStep::new("form_versions", 1, versions.len()));
    let pages = match versions.first() {
        Some(version) => runtime
            .list_pages(version.id)?
            .into_iter()
            .map(|page| format!("{}/{}", page.name, page.sequence))
            .collect::<Vec<_>>()
            .join(","),
        None => String::new(),
    };
    steps.push(DemoStep::new(
        "form_pages",
        format!("{DEFAULT_PAGE_NAME}/{DEFAULT_PAGE_SEQUENCE}"),
        pages,
    ));

    // Deactivation revokes both tokens.
    let alice = runtime.create_account(NewAccount::new(
        "alice",
        "Alice",
        "alice@example.com",
        "pbkdf2$demo",
    ))?;
    let portal = runtime.create_application(
        "portal",
        ClientType::Confidential,
        GrantType::Password,
    )?;
    runtime.issue_tokens(alice.id, portal.id, Duration::hours(1), "forms")?;
    steps.push(DemoStep::new("tokens_issued", 2, runtime.token_count(alice.id)));

    runtime.update_account(alice.id, &AccountPatch::active(false))?;
    steps.push(DemoStep::new("deactivated", 0, runtime.token_count(alice.id)));

    // Re-activation restores nothing.
    runtime.update_account(alice.id, &AccountPatch::active(true))?;
    steps.push(DemoStep::new("reactivated", 0, runtime.token_count(alice.id)));

    // A rename keeps eligibility and tokens.
    runtime.issue_tokens(alice.id, portal.id, Duration::hours(1), "forms")?;
    runtime.update_account(alice.id, &AccountPatch::display_name("Alice Liddell"))?;
    steps.push(DemoStep::new("renamed", 2, runtime.token_count(alice.id)));

    // A fresh account is created without any revocation attempt.
    let failures_before = runtime.recent_failures().len();
    let bob = runtime.create_account(NewAccount::new(
        "bob",
        "Bob",
        "bob@example.com",
        "pbkdf2$demo",
    ))?;
    steps.push(DemoStep::new("fresh_account", 0, runtime.token_count(bob.id)));
    steps.push(DemoStep::new(
        "fresh_account_failures",
        failures_before,
        runtime.recent_failures().len(),
    ));

    Ok(DemoOutcome {
        steps,
        hook_failures: runtime.recent_failures().len(),
    })
}

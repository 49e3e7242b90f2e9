//! Shared builders for the suite.

use chrono::{Duration, NaiveDate};
use forms_runtime::FormsRuntime;
use shared_types::{
    Account, AccountId, ApplicationId, CategoryId, ClientType, FormStatus, GrantType, NewAccount,
    NewForm, SubmissionMode,
};

/// A valid form payload open from September to mid-December 2026.
pub fn enrollment_form(category: CategoryId, name: &str) -> NewForm {
    NewForm {
        category,
        name: name.to_string(),
        description: "Fall intake".into(),
        available_from: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap_or_default(),
        available_to: NaiveDate::from_ymd_opt(2026, 12, 15).unwrap_or_default(),
        status: FormStatus::Active,
        submission_mode: SubmissionMode::Online,
    }
}

pub fn new_account(username: &str) -> NewAccount {
    NewAccount::new(
        username,
        username.to_uppercase(),
        format!("{username}@example.com"),
        "pbkdf2$suite",
    )
}

/// The committed row of `account`.
pub fn account_row(runtime: &FormsRuntime, account: AccountId) -> Option<Account> {
    runtime
        .container()
        .store
        .read(|tables| tables.accounts.get(&account).cloned())
}

/// Issue `pairs` access/refresh token pairs valid for an hour.
pub fn issue_pairs(
    runtime: &FormsRuntime,
    account: AccountId,
    application: ApplicationId,
    pairs: usize,
) {
    for _ in 0..pairs {
        if let Err(err) = runtime.issue_tokens(account, application, Duration::hours(1), "forms") {
            panic!("issuing tokens failed: {err}");
        }
    }
}

/// A confidential password-grant application.
pub fn portal(runtime: &FormsRuntime, name: &str) -> ApplicationId {
    match runtime.create_application(name, ClientType::Confidential, GrantType::Password) {
        Ok(app) => app.id,
        Err(err) => panic!("creating application failed: {err}"),
    }
}

//! Fixtures shared by the storage tests and the derived-state crates.

use crate::service::{RelationalStore, TransactionCoordinator};
use chrono::NaiveDate;
use shared_bus::EventDispatcher;
use shared_types::{CategoryId, FormStatus, NewAccount, NewForm, SubmissionMode};
use std::sync::Arc;

/// A valid form payload in `category`.
pub fn make_test_form(category: CategoryId, name: &str) -> NewForm {
    NewForm {
        category,
        name: name.to_string(),
        description: String::new(),
        available_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default(),
        available_to: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap_or_default(),
        status: FormStatus::Active,
        submission_mode: SubmissionMode::Online,
    }
}

/// An eligible account payload.
pub fn make_test_account(username: &str) -> NewAccount {
    NewAccount::new(
        username,
        username.to_uppercase(),
        format!("{username}@example.com"),
        "pbkdf2$test",
    )
}

/// A dispatcher and an in-memory coordinator wired to it.
pub fn make_test_coordinator() -> (Arc<EventDispatcher>, Arc<TransactionCoordinator>) {
    let dispatcher = Arc::new(EventDispatcher::new());
    let coordinator = Arc::new(TransactionCoordinator::new(
        Arc::new(RelationalStore::in_memory()),
        dispatcher.clone(),
    ));
    (dispatcher, coordinator)
}

//! # Core Domain Entities
//!
//! Defines the relational rows of the forms backend.
//!
//! ## Clusters
//!
//! - **Forms**: `Category`, `Form`, `FormVersion`, `FormVersionHistory`
//! - **Pages**: `Page`, `PageVersionHistory`
//! - **Accounts & Credentials**: `Account`, `Application`, `AccessToken`,
//!   `RefreshToken`
//!
//! History rows are the only link between a form and its versions, and
//! between a version and its pages. They are append-only.

use crate::errors::ValidationError;
use crate::ids::{
    AccessTokenId, AccountId, ApplicationId, CategoryId, FormHistoryId, FormId, PageHistoryId,
    PageId, RefreshTokenId, VersionId,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name given to the page materialized with every initial version.
pub const DEFAULT_PAGE_NAME: &str = "General";

/// Sequence of the default page inside its version.
pub const DEFAULT_PAGE_SEQUENCE: u32 = 1;

/// Column width for names.
pub const MAX_NAME_LEN: usize = 255;

// =============================================================================
// CLUSTER A: FORMS
// =============================================================================

/// A grouping of forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Lifecycle status of a form. Forms are never hard-deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FormStatus {
    Active,
    Inactive,
    #[default]
    Draft,
}

impl fmt::Display for FormStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FormStatus::Active => "active",
            FormStatus::Inactive => "inactive",
            FormStatus::Draft => "draft",
        };
        f.write_str(label)
    }
}

/// How responses to a form are submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SubmissionMode {
    #[default]
    Online,
    Offline,
    Mixed,
}

/// Inclusive date range during which a form accepts submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl AvailabilityWindow {
    /// Build a window, rejecting `from > to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ValidationError> {
        if from > to {
            return Err(ValidationError::InvertedWindow { from, to });
        }
        Ok(Self { from, to })
    }

    /// Whether `day` falls inside the window.
    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from <= day && day <= self.to
    }
}

/// A form definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    pub id: FormId,
    pub category: CategoryId,
    pub name: String,
    pub description: String,
    pub window: AvailabilityWindow,
    pub status: FormStatus,
    pub submission_mode: SubmissionMode,
    pub created_at: DateTime<Utc>,
}

/// An opaque version identity. Its owner is recorded in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormVersion {
    pub id: VersionId,
    pub created_at: DateTime<Utc>,
}

/// Append-only link between a form and one of its versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormVersionHistory {
    pub id: FormHistoryId,
    pub form: FormId,
    pub version: VersionId,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// CLUSTER B: PAGES
// =============================================================================

/// A page of a form version. `sequence` is 1-based within the version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub name: String,
    pub sequence: u32,
}

impl Page {
    /// Whether this is the page every initial version starts with.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_PAGE_NAME && self.sequence == DEFAULT_PAGE_SEQUENCE
    }
}

/// Append-only link between a version and one of its pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageVersionHistory {
    pub id: PageHistoryId,
    pub version: VersionId,
    pub page: PageId,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// CLUSTER C: ACCOUNTS & CREDENTIALS
// =============================================================================

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub display_name: String,
    pub email: String,
    /// Opaque credential hash produced outside this core.
    pub credential_hash: String,
    pub active: bool,
    pub web_access: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// An account may hold live tokens only while active with web access.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.active && self.web_access
    }
}

/// OAuth client confidentiality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientType {
    Confidential,
    Public,
}

/// OAuth grant flow an application is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrantType {
    Password,
    AuthorizationCode,
    ClientCredentials,
}

/// An OAuth client application that issues tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub name: String,
    pub client_type: ClientType,
    pub grant_type: GrantType,
}

/// A bearer access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub id: AccessTokenId,
    pub account: AccountId,
    pub application: ApplicationId,
    pub token: String,
    pub expires: DateTime<Utc>,
    pub scope: String,
}

impl AccessToken {
    /// Whether the token has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }
}

/// A refresh token, optionally tied to the access token it was issued with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    pub id: RefreshTokenId,
    pub account: AccountId,
    pub application: ApplicationId,
    pub token: String,
    pub access_token: Option<AccessTokenId>,
}

/// Reference to any token owned by an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenRef {
    Access(AccessTokenId),
    Refresh(RefreshTokenId),
}

// =============================================================================
// WRITE PAYLOADS
// =============================================================================

/// Fields for creating a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewForm {
    pub category: CategoryId,
    pub name: String,
    pub description: String,
    pub available_from: NaiveDate,
    pub available_to: NaiveDate,
    pub status: FormStatus,
    pub submission_mode: SubmissionMode,
}

impl NewForm {
    /// Validate the payload and return its availability window.
    pub fn validate(&self) -> Result<AvailabilityWindow, ValidationError> {
        validate_name("name", &self.name)?;
        AvailabilityWindow::new(self.available_from, self.available_to)
    }
}

/// Partial update of a form. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub available_from: Option<NaiveDate>,
    pub available_to: Option<NaiveDate>,
    pub status: Option<FormStatus>,
    pub submission_mode: Option<SubmissionMode>,
}

impl FormPatch {
    /// Apply the patch to a copy of `form`, validating the result.
    pub fn apply(&self, form: &Form) -> Result<Form, ValidationError> {
        let mut next = form.clone();
        if let Some(name) = &self.name {
            validate_name("name", name)?;
            next.name = name.clone();
        }
        if let Some(description) = &self.description {
            next.description = description.clone();
        }
        next.window = AvailabilityWindow::new(
            self.available_from.unwrap_or(form.window.from),
            self.available_to.unwrap_or(form.window.to),
        )?;
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(mode) = self.submission_mode {
            next.submission_mode = mode;
        }
        Ok(next)
    }
}

/// Fields for creating an account. New accounts are eligible by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub credential_hash: String,
    pub active: bool,
    pub web_access: bool,
}

impl NewAccount {
    /// Create an active account with web access.
    pub fn new(
        username: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
        credential_hash: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            display_name: display_name.into(),
            email: email.into(),
            credential_hash: credential_hash.into(),
            active: true,
            web_access: true,
        }
    }

    /// Override the `active` flag.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Override the `web_access` flag.
    #[must_use]
    pub fn with_web_access(mut self, web_access: bool) -> Self {
        self.web_access = web_access;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name("username", &self.username)?;
        validate_name("display_name", &self.display_name)
    }
}

/// Partial update of an account. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPatch {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub credential_hash: Option<String>,
    pub active: Option<bool>,
    pub web_access: Option<bool>,
}

impl AccountPatch {
    /// Patch that only toggles `active`.
    #[must_use]
    pub fn active(active: bool) -> Self {
        Self {
            active: Some(active),
            ..Self::default()
        }
    }

    /// Patch that only toggles `web_access`.
    #[must_use]
    pub fn web_access(web_access: bool) -> Self {
        Self {
            web_access: Some(web_access),
            ..Self::default()
        }
    }

    /// Patch that only renames the account.
    pub fn display_name(name: impl Into<String>) -> Self {
        Self {
            display_name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Apply the patch to a copy of `account`, validating the result.
    pub fn apply(&self, account: &Account) -> Result<Account, ValidationError> {
        let mut next = account.clone();
        if let Some(name) = &self.display_name {
            validate_name("display_name", name)?;
            next.display_name = name.clone();
        }
        if let Some(email) = &self.email {
            next.email = email.clone();
        }
        if let Some(hash) = &self.credential_hash {
            next.credential_hash = hash.clone();
        }
        if let Some(active) = self.active {
            next.active = active;
        }
        if let Some(web_access) = self.web_access {
            next.web_access = web_access;
        }
        Ok(next)
    }
}

/// Reject empty or over-long names.
pub fn validate_name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::FieldTooLong {
            field,
            max: MAX_NAME_LEN,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn sample_account() -> Account {
        Account {
            id: AccountId(1),
            username: "testuser".into(),
            display_name: "Test User".into(),
            email: "test@example.com".into(),
            credential_hash: "hash".into(),
            active: true,
            web_access: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_window_rejects_inverted_range() {
        let result = AvailabilityWindow::new(day(10), day(1));
        assert!(matches!(result, Err(ValidationError::InvertedWindow { .. })));
    }

    #[test]
    fn test_window_allows_single_day() {
        let window = AvailabilityWindow::new(day(4), day(4)).unwrap();
        assert!(window.contains(day(4)));
        assert!(!window.contains(day(5)));
    }

    #[test]
    fn test_new_form_requires_name() {
        let form = NewForm {
            category: CategoryId(1),
            name: "   ".into(),
            description: String::new(),
            available_from: day(1),
            available_to: day(2),
            status: FormStatus::Active,
            submission_mode: SubmissionMode::Online,
        };
        assert_eq!(
            form.validate(),
            Err(ValidationError::EmptyField { field: "name" })
        );
    }

    #[test]
    fn test_eligibility_requires_both_flags() {
        let mut account = sample_account();
        assert!(account.is_eligible());

        account.web_access = false;
        assert!(!account.is_eligible());

        account.web_access = true;
        account.active = false;
        assert!(!account.is_eligible());
    }

    #[test]
    fn test_account_patch_leaves_other_fields() {
        let account = sample_account();
        let renamed = AccountPatch::display_name("New Name")
            .apply(&account)
            .unwrap();

        assert_eq!(renamed.display_name, "New Name");
        assert_eq!(renamed.active, account.active);
        assert_eq!(renamed.web_access, account.web_access);
        assert_eq!(renamed.username, account.username);
    }

    #[test]
    fn test_new_account_defaults_to_eligible() {
        let account = NewAccount::new("newuser", "New User", "new@example.com", "h");
        assert!(account.active);
        assert!(account.web_access);
        assert!(!account.with_active(false).active);
    }

    #[test]
    fn test_default_page_detection() {
        let page = Page {
            id: PageId(1),
            name: DEFAULT_PAGE_NAME.into(),
            sequence: 1,
        };
        assert!(page.is_default());

        let second = Page {
            sequence: 2,
            ..page
        };
        assert!(!second.is_default());
    }
}

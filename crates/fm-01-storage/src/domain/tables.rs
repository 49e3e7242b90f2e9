//! # Relational Tables
//!
//! The full persisted state of the forms backend. Every table is keyed by
//! its serial id; ids are allocated from one sequence per table and never
//! reused.
//!
//! History tables are append-only. Their total order is `(created_at, id)`.

use serde::{Deserialize, Serialize};
use shared_types::{
    AccessToken, AccessTokenId, Account, AccountId, Application, ApplicationId, Category,
    CategoryId, Form, FormHistoryId, FormId, FormVersion, FormVersionHistory, Page, PageHistoryId,
    PageId, PageVersionHistory, RefreshToken, RefreshTokenId, TokenRef, VersionId,
};
use std::collections::BTreeMap;
use std::fmt;

/// Names of the persisted tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Table {
    Category,
    Form,
    FormVersion,
    FormVersionHistory,
    Page,
    PageVersionHistory,
    Account,
    Application,
    AccessToken,
    RefreshToken,
}

impl Table {
    pub const ALL: [Table; 10] = [
        Table::Category,
        Table::Form,
        Table::FormVersion,
        Table::FormVersionHistory,
        Table::Page,
        Table::PageVersionHistory,
        Table::Account,
        Table::Application,
        Table::AccessToken,
        Table::RefreshToken,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Category => "category",
            Table::Form => "form",
            Table::FormVersion => "form_version",
            Table::FormVersionHistory => "form_version_history",
            Table::Page => "page",
            Table::PageVersionHistory => "page_version_history",
            Table::Account => "account",
            Table::Application => "application",
            Table::AccessToken => "access_token",
            Table::RefreshToken => "refresh_token",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row count per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub categories: usize,
    pub forms: usize,
    pub versions: usize,
    pub form_history: usize,
    pub pages: usize,
    pub page_history: usize,
    pub accounts: usize,
    pub applications: usize,
    pub access_tokens: usize,
    pub refresh_tokens: usize,
}

impl TableCounts {
    #[must_use]
    pub fn tokens(&self) -> usize {
        self.access_tokens + self.refresh_tokens
    }
}

/// Every table plus the id sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tables {
    pub categories: BTreeMap<CategoryId, Category>,
    pub forms: BTreeMap<FormId, Form>,
    pub versions: BTreeMap<VersionId, FormVersion>,
    pub form_history: BTreeMap<FormHistoryId, FormVersionHistory>,
    pub pages: BTreeMap<PageId, Page>,
    pub page_history: BTreeMap<PageHistoryId, PageVersionHistory>,
    pub accounts: BTreeMap<AccountId, Account>,
    pub applications: BTreeMap<ApplicationId, Application>,
    pub access_tokens: BTreeMap<AccessTokenId, AccessToken>,
    pub refresh_tokens: BTreeMap<RefreshTokenId, RefreshToken>,
    /// Last id handed out per table.
    sequences: BTreeMap<Table, u64>,
}

impl Tables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next serial id of `table`. Sequences start at 1.
    pub fn next_id(&mut self, table: Table) -> u64 {
        let last = self.sequences.entry(table).or_insert(0);
        *last += 1;
        *last
    }

    #[must_use]
    pub fn counts(&self) -> TableCounts {
        TableCounts {
            categories: self.categories.len(),
            forms: self.forms.len(),
            versions: self.versions.len(),
            form_history: self.form_history.len(),
            pages: self.pages.len(),
            page_history: self.page_history.len(),
            accounts: self.accounts.len(),
            applications: self.applications.len(),
            access_tokens: self.access_tokens.len(),
            refresh_tokens: self.refresh_tokens.len(),
        }
    }

    // =========================================================================
    // Form history
    // =========================================================================

    /// History rows of `form` in history order.
    #[must_use]
    pub fn history_for_form(&self, form: FormId) -> Vec<&FormVersionHistory> {
        let mut rows: Vec<_> = self
            .form_history
            .values()
            .filter(|row| row.form == form)
            .collect();
        rows.sort_by_key(|row| (row.created_at, row.id));
        rows
    }

    /// Versions of `form` in history order.
    #[must_use]
    pub fn versions_for_form(&self, form: FormId) -> Vec<FormVersion> {
        self.history_for_form(form)
            .into_iter()
            .filter_map(|row| self.versions.get(&row.version).copied())
            .collect()
    }

    /// First history row of `form`; its version is the initial one.
    #[must_use]
    pub fn initial_history(&self, form: FormId) -> Option<FormVersionHistory> {
        self.history_for_form(form).first().map(|row| **row)
    }

    /// Whether the initial version of `form` links the default page.
    #[must_use]
    pub fn has_default_page(&self, form: FormId) -> bool {
        self.initial_history(form).is_some_and(|row| {
            self.pages_for_version(row.version)
                .iter()
                .any(Page::is_default)
        })
    }

    /// Forms without history, or whose initial version lacks the default
    /// page.
    #[must_use]
    pub fn forms_with_incomplete_initial_version(&self) -> Vec<FormId> {
        self.forms
            .keys()
            .copied()
            .filter(|id| !self.has_default_page(*id))
            .collect()
    }

    /// Pages of `version` ordered by sequence, then id.
    #[must_use]
    pub fn pages_for_version(&self, version: VersionId) -> Vec<Page> {
        let mut pages: Vec<Page> = self
            .page_history
            .values()
            .filter(|row| row.version == version)
            .filter_map(|row| self.pages.get(&row.page).cloned())
            .collect();
        pages.sort_by_key(|page| (page.sequence, page.id));
        pages
    }

    /// Highest page sequence linked to `version`, or 0.
    #[must_use]
    pub fn max_page_sequence(&self, version: VersionId) -> u32 {
        self.page_history
            .values()
            .filter(|row| row.version == version)
            .filter_map(|row| self.pages.get(&row.page))
            .map(|page| page.sequence)
            .max()
            .unwrap_or(0)
    }

    // =========================================================================
    // Accounts and tokens
    // =========================================================================

    #[must_use]
    pub fn account_by_username(&self, username: &str) -> Option<&Account> {
        self.accounts
            .values()
            .find(|account| account.username == username)
    }

    /// Every access and refresh token of `account`, access tokens first.
    #[must_use]
    pub fn tokens_for_account(&self, account: AccountId) -> Vec<TokenRef> {
        let access = self
            .access_tokens
            .values()
            .filter(|token| token.account == account)
            .map(|token| TokenRef::Access(token.id));
        let refresh = self
            .refresh_tokens
            .values()
            .filter(|token| token.account == account)
            .map(|token| TokenRef::Refresh(token.id));
        access.chain(refresh).collect()
    }

    #[must_use]
    pub fn access_token_by_value(&self, token: &str) -> Option<&AccessToken> {
        self.access_tokens.values().find(|row| row.token == token)
    }

    #[must_use]
    pub fn token_value_exists(&self, token: &str) -> bool {
        self.access_tokens.values().any(|row| row.token == token)
            || self.refresh_tokens.values().any(|row| row.token == token)
    }

    /// Accounts that are ineligible yet still own at least one token.
    #[must_use]
    pub fn ineligible_accounts_with_tokens(&self) -> Vec<AccountId> {
        self.accounts
            .values()
            .filter(|account| !account.is_eligible())
            .filter(|account| !self.tokens_for_account(account.id).is_empty())
            .map(|account| account.id)
            .collect()
    }
}

//! # Store Transaction
//!
//! Row-level writes against a private working copy of the tables.

use crate::domain::errors::StoreError;
use crate::domain::faults::FaultOp;
use crate::domain::tables::{Table, Tables};
use crate::service::store::RelationalStore;
use chrono::{DateTime, Utc};
use parking_lot::MutexGuard;
use shared_types::{
    validate_name, AccessToken, AccessTokenId, Account, AccountId, AccountPatch, Application,
    ApplicationId, Category, CategoryId, ClientType, Form, FormHistoryId, FormId, FormPatch,
    FormVersion, FormVersionHistory, GrantType, NewAccount, NewForm, Page, PageHistoryId, PageId,
    PageVersionHistory, RefreshToken, RefreshTokenId, TokenRef, TransactionId, ValidationError,
    VersionId,
};
use std::sync::atomic::Ordering;
use tracing::debug;

/// An open store transaction.
///
/// Holds the store's writer lock until committed or dropped.
pub struct StoreTransaction<'a> {
    store: &'a RelationalStore,
    id: TransactionId,
    working: Tables,
    dirty: bool,
    committed: bool,
    _writer: MutexGuard<'a, ()>,
}

impl<'a> StoreTransaction<'a> {
    pub(crate) fn new(
        store: &'a RelationalStore,
        id: TransactionId,
        working: Tables,
        writer: MutexGuard<'a, ()>,
    ) -> Self {
        debug!(tx = %id, "Store transaction opened");
        Self {
            store,
            id,
            working,
            dirty: false,
            committed: false,
            _writer: writer,
        }
    }

    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Tables as seen inside this transaction.
    #[must_use]
    pub fn tables(&self) -> &Tables {
        &self.working
    }

    fn check_fault(&self, table: Table, op: FaultOp) -> Result<(), StoreError> {
        if self.store.faults.lock().trip(table, op) {
            return Err(StoreError::InjectedFault {
                table,
                operation: op.as_str(),
            });
        }
        Ok(())
    }

    fn insert_id(&mut self, table: Table) -> Result<u64, StoreError> {
        self.check_fault(table, FaultOp::Insert)?;
        self.dirty = true;
        Ok(self.working.next_id(table))
    }

    // =========================================================================
    // Primary entities
    // =========================================================================

    pub fn insert_category(&mut self, name: &str) -> Result<Category, StoreError> {
        validate_name("name", name)?;
        let id = CategoryId(self.insert_id(Table::Category)?);
        let row = Category {
            id,
            name: name.to_string(),
        };
        self.working.categories.insert(id, row.clone());
        Ok(row)
    }

    pub fn insert_form(&mut self, new: NewForm) -> Result<Form, StoreError> {
        let window = new.validate()?;
        if !self.working.categories.contains_key(&new.category) {
            return Err(StoreError::CategoryNotFound(new.category));
        }
        let id = FormId(self.insert_id(Table::Form)?);
        let row = Form {
            id,
            category: new.category,
            name: new.name,
            description: new.description,
            window,
            status: new.status,
            submission_mode: new.submission_mode,
            created_at: Utc::now(),
        };
        self.working.forms.insert(id, row.clone());
        Ok(row)
    }

    /// Rewrite a form. Returns `(before, after)`.
    pub fn update_form(&mut self, id: FormId, patch: &FormPatch) -> Result<(Form, Form), StoreError> {
        let before = self
            .working
            .forms
            .get(&id)
            .cloned()
            .ok_or(StoreError::FormNotFound(id))?;
        let after = patch.apply(&before)?;
        self.dirty = true;
        self.working.forms.insert(id, after.clone());
        Ok((before, after))
    }

    pub fn insert_account(&mut self, new: NewAccount) -> Result<Account, StoreError> {
        new.validate()?;
        if self.working.account_by_username(&new.username).is_some() {
            return Err(StoreError::DuplicateUsername(new.username));
        }
        let id = AccountId(self.insert_id(Table::Account)?);
        let row = Account {
            id,
            username: new.username,
            display_name: new.display_name,
            email: new.email,
            credential_hash: new.credential_hash,
            active: new.active,
            web_access: new.web_access,
            created_at: Utc::now(),
        };
        self.working.accounts.insert(id, row.clone());
        Ok(row)
    }

    /// Rewrite an account. Returns `(before, after)`.
    pub fn update_account(
        &mut self,
        id: AccountId,
        patch: &AccountPatch,
    ) -> Result<(Account, Account), StoreError> {
        let before = self
            .working
            .accounts
            .get(&id)
            .cloned()
            .ok_or(StoreError::AccountNotFound(id))?;
        let after = patch.apply(&before)?;
        self.dirty = true;
        self.working.accounts.insert(id, after.clone());
        Ok((before, after))
    }

    pub fn insert_application(
        &mut self,
        name: &str,
        client_type: ClientType,
        grant_type: GrantType,
    ) -> Result<Application, StoreError> {
        validate_name("name", name)?;
        let id = ApplicationId(self.insert_id(Table::Application)?);
        let row = Application {
            id,
            name: name.to_string(),
            client_type,
            grant_type,
        };
        self.working.applications.insert(id, row.clone());
        Ok(row)
    }

    fn check_token_owner(
        &self,
        account: AccountId,
        application: ApplicationId,
        token: &str,
    ) -> Result<(), StoreError> {
        if !self.working.accounts.contains_key(&account) {
            return Err(StoreError::AccountNotFound(account));
        }
        if !self.working.applications.contains_key(&application) {
            return Err(StoreError::ApplicationNotFound(application));
        }
        if token.is_empty() {
            return Err(ValidationError::EmptyField { field: "token" }.into());
        }
        if self.working.token_value_exists(token) {
            return Err(StoreError::DuplicateToken);
        }
        Ok(())
    }

    pub fn insert_access_token(
        &mut self,
        account: AccountId,
        application: ApplicationId,
        token: String,
        expires: DateTime<Utc>,
        scope: String,
    ) -> Result<AccessToken, StoreError> {
        self.check_token_owner(account, application, &token)?;
        let id = AccessTokenId(self.insert_id(Table::AccessToken)?);
        let row = AccessToken {
            id,
            account,
            application,
            token,
            expires,
            scope,
        };
        self.working.access_tokens.insert(id, row.clone());
        Ok(row)
    }

    pub fn insert_refresh_token(
        &mut self,
        account: AccountId,
        application: ApplicationId,
        token: String,
        access_token: Option<AccessTokenId>,
    ) -> Result<RefreshToken, StoreError> {
        self.check_token_owner(account, application, &token)?;
        let id = RefreshTokenId(self.insert_id(Table::RefreshToken)?);
        let row = RefreshToken {
            id,
            account,
            application,
            token,
            access_token,
        };
        self.working.refresh_tokens.insert(id, row.clone());
        Ok(row)
    }

    // =========================================================================
    // Derived state
    // =========================================================================

    pub fn insert_version(&mut self) -> Result<FormVersion, StoreError> {
        let id = VersionId(self.insert_id(Table::FormVersion)?);
        let row = FormVersion {
            id,
            created_at: Utc::now(),
        };
        self.working.versions.insert(id, row);
        Ok(row)
    }

    pub fn append_form_history(
        &mut self,
        form: FormId,
        version: VersionId,
    ) -> Result<FormVersionHistory, StoreError> {
        if !self.working.forms.contains_key(&form) {
            return Err(StoreError::FormNotFound(form));
        }
        if !self.working.versions.contains_key(&version) {
            return Err(StoreError::VersionNotFound(version));
        }
        let id = FormHistoryId(self.insert_id(Table::FormVersionHistory)?);
        let row = FormVersionHistory {
            id,
            form,
            version,
            created_at: Utc::now(),
        };
        self.working.form_history.insert(id, row);
        Ok(row)
    }

    pub fn insert_page(&mut self, name: &str, sequence: u32) -> Result<Page, StoreError> {
        validate_name("name", name)?;
        if sequence == 0 {
            return Err(ValidationError::InvalidSequence { sequence }.into());
        }
        let id = PageId(self.insert_id(Table::Page)?);
        let row = Page {
            id,
            name: name.to_string(),
            sequence,
        };
        self.working.pages.insert(id, row.clone());
        Ok(row)
    }

    pub fn append_page_history(
        &mut self,
        version: VersionId,
        page: PageId,
    ) -> Result<PageVersionHistory, StoreError> {
        if !self.working.versions.contains_key(&version) {
            return Err(StoreError::VersionNotFound(version));
        }
        if !self.working.pages.contains_key(&page) {
            return Err(StoreError::PageNotFound(page));
        }
        let id = PageHistoryId(self.insert_id(Table::PageVersionHistory)?);
        let row = PageVersionHistory {
            id,
            version,
            page,
            created_at: Utc::now(),
        };
        self.working.page_history.insert(id, row);
        Ok(row)
    }

    /// Delete the given tokens. Missing tokens are skipped.
    ///
    /// Returns the number of rows removed.
    pub fn delete_tokens(&mut self, tokens: &[TokenRef]) -> Result<usize, StoreError> {
        let mut removed = 0;
        for token in tokens {
            let table = match token {
                TokenRef::Access(_) => Table::AccessToken,
                TokenRef::Refresh(_) => Table::RefreshToken,
            };
            self.check_fault(table, FaultOp::Delete)?;
            let existed = match token {
                TokenRef::Access(id) => self.working.access_tokens.remove(id).is_some(),
                TokenRef::Refresh(id) => self.working.refresh_tokens.remove(id).is_some(),
            };
            if existed {
                removed += 1;
                self.dirty = true;
            }
        }
        Ok(removed)
    }

    // =========================================================================
    // Completion
    // =========================================================================

    /// Persist and publish the working copy.
    ///
    /// On error the transaction is rolled back.
    pub fn commit(mut self) -> Result<(), StoreError> {
        let tables = std::mem::take(&mut self.working);
        if self.dirty {
            self.store.snapshots.save(&tables)?;
        }
        *self.store.committed.write() = tables;
        self.committed = true;
        self.store.commits.fetch_add(1, Ordering::Relaxed);
        debug!(tx = %self.id, dirty = self.dirty, "Store transaction committed");
        Ok(())
    }

    /// Discard the working copy.
    pub fn rollback(self) {}
}

impl Drop for StoreTransaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            debug!(tx = %self.id, "Store transaction rolled back");
        }
        *self.store.writer_owner.lock() = None;
    }
}

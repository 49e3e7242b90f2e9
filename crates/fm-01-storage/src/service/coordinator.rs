//! # Transaction Coordinator
//!
//! Binds store transactions to the dispatcher's transaction-scoped hooks.
//!
//! ## Unit of Work
//!
//! ```text
//! begin() ──→ store tx + dispatcher.open_transaction(tx)
//!   create_form / update_account ... ──→ row write + dispatcher.notify
//!   on_commit(callback) ──────────────→ dispatcher.defer
//! commit() ──→ store commit ──→ dispatcher.commit ──→ flush (optional)
//! drop     ──→ store rollback ──→ dispatcher.rollback
//! ```
//!
//! Derived-state writers use `derived()`, a bare store transaction that
//! notifies nothing.

use crate::domain::errors::StoreError;
use crate::service::store::RelationalStore;
use crate::service::transaction::StoreTransaction;
use chrono::{DateTime, Utc};
use shared_bus::{
    DeferredCallback, EntityEvent, FlushReport, NotifyOutcome, TransactionHooks,
};
use shared_types::{
    AccessToken, AccessTokenId, Account, AccountId, AccountPatch, Application, ApplicationId,
    Category, ClientType, Form, FormId, FormPatch, GrantType, NewAccount, NewForm, RefreshToken,
    TransactionId,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of a committed unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    pub tx: TransactionId,
    /// Hooks handed to the dispatcher's ready queue.
    pub hooks_ready: usize,
    /// Present when the coordinator flushed right after commit.
    pub flush: Option<FlushReport>,
}

/// Opens units of work and derived transactions over one store.
pub struct TransactionCoordinator {
    store: Arc<RelationalStore>,
    hooks: Arc<dyn TransactionHooks>,
    flush_on_commit: bool,
}

impl TransactionCoordinator {
    pub fn new(store: Arc<RelationalStore>, hooks: Arc<dyn TransactionHooks>) -> Self {
        Self {
            store,
            hooks,
            flush_on_commit: true,
        }
    }

    /// Whether `UnitOfWork::commit` flushes ready hooks itself.
    #[must_use]
    pub fn with_flush_on_commit(mut self, flush_on_commit: bool) -> Self {
        self.flush_on_commit = flush_on_commit;
        self
    }

    pub fn store(&self) -> &Arc<RelationalStore> {
        &self.store
    }

    pub fn hooks(&self) -> &Arc<dyn TransactionHooks> {
        &self.hooks
    }

    pub fn flush_on_commit(&self) -> bool {
        self.flush_on_commit
    }

    /// Open a primary-write unit of work.
    pub fn begin(&self) -> Result<UnitOfWork<'_>, StoreError> {
        let tx = self.store.begin()?;
        self.hooks.open_transaction(tx.id())?;
        Ok(UnitOfWork {
            coordinator: self,
            id: tx.id(),
            tx: Some(tx),
        })
    }

    /// Open a transaction for derived-state writes. Nothing is notified.
    pub fn derived(&self) -> Result<StoreTransaction<'_>, StoreError> {
        self.store.begin()
    }

    /// Run every hook of committed transactions still waiting.
    ///
    /// Must not be called while this thread holds an open unit of work.
    pub fn flush_pending_hooks(&self) -> FlushReport {
        self.hooks.flush()
    }
}

/// A primary-write transaction whose mutations feed the dispatcher.
pub struct UnitOfWork<'a> {
    coordinator: &'a TransactionCoordinator,
    id: TransactionId,
    tx: Option<StoreTransaction<'a>>,
}

impl<'a> UnitOfWork<'a> {
    fn tx_mut(&mut self) -> Result<&mut StoreTransaction<'a>, StoreError> {
        self.tx.as_mut().ok_or(StoreError::TransactionClosed(self.id))
    }

    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Read access to the tables inside this transaction.
    #[must_use]
    pub fn transaction(&self) -> Option<&StoreTransaction<'a>> {
        self.tx.as_ref()
    }

    /// Report a mutation of this transaction to the dispatcher.
    ///
    /// Row writers call this themselves; repeating it for the same
    /// mutation is harmless.
    pub fn notify(&self, event: EntityEvent) -> Result<NotifyOutcome, StoreError> {
        Ok(self.coordinator.hooks.notify(self.id(), event)?)
    }

    /// Run `callback` after this transaction commits.
    pub fn on_commit(&self, label: &str, callback: DeferredCallback) -> Result<(), StoreError> {
        Ok(self.coordinator.hooks.defer(self.id(), label, callback)?)
    }

    // =========================================================================
    // Primary writes
    // =========================================================================

    pub fn create_category(&mut self, name: &str) -> Result<Category, StoreError> {
        self.tx_mut()?.insert_category(name)
    }

    pub fn create_form(&mut self, new: NewForm) -> Result<Form, StoreError> {
        let form = self.tx_mut()?.insert_form(new)?;
        self.notify(EntityEvent::form_created(form.clone()))?;
        Ok(form)
    }

    pub fn update_form(&mut self, id: FormId, patch: &FormPatch) -> Result<Form, StoreError> {
        let (before, after) = self.tx_mut()?.update_form(id, patch)?;
        self.notify(EntityEvent::form_updated(before, after.clone()))?;
        Ok(after)
    }

    pub fn create_account(&mut self, new: NewAccount) -> Result<Account, StoreError> {
        let account = self.tx_mut()?.insert_account(new)?;
        self.notify(EntityEvent::account_created(account.clone()))?;
        Ok(account)
    }

    pub fn update_account(
        &mut self,
        id: AccountId,
        patch: &AccountPatch,
    ) -> Result<Account, StoreError> {
        let (before, after) = self.tx_mut()?.update_account(id, patch)?;
        self.notify(EntityEvent::account_updated(before, after.clone()))?;
        Ok(after)
    }

    pub fn create_application(
        &mut self,
        name: &str,
        client_type: ClientType,
        grant_type: GrantType,
    ) -> Result<Application, StoreError> {
        self.tx_mut()?
            .insert_application(name, client_type, grant_type)
    }

    pub fn issue_access_token(
        &mut self,
        account: AccountId,
        application: ApplicationId,
        token: String,
        expires: DateTime<Utc>,
        scope: String,
    ) -> Result<AccessToken, StoreError> {
        self.tx_mut()?
            .insert_access_token(account, application, token, expires, scope)
    }

    pub fn issue_refresh_token(
        &mut self,
        account: AccountId,
        application: ApplicationId,
        token: String,
        access_token: Option<AccessTokenId>,
    ) -> Result<RefreshToken, StoreError> {
        self.tx_mut()?
            .insert_refresh_token(account, application, token, access_token)
    }

    // =========================================================================
    // Completion
    // =========================================================================

    /// Commit durably, then release this transaction's hooks.
    ///
    /// Hook failures never surface here; they are in the receipt's flush
    /// report and the dispatcher's failure log.
    pub fn commit(mut self) -> Result<CommitReceipt, StoreError> {
        let id = self.id;
        let tx = self.tx.take().ok_or(StoreError::TransactionClosed(id))?;
        let hooks = &self.coordinator.hooks;

        if let Err(err) = tx.commit() {
            hooks.rollback(id);
            warn!(tx = %id, error = %err, "Commit failed, transaction rolled back");
            return Err(err);
        }

        let hooks_ready = hooks.commit(id)?;
        let flush = self.coordinator.flush_on_commit.then(|| hooks.flush());
        debug!(tx = %id, hooks_ready, "Unit of work committed");

        Ok(CommitReceipt {
            tx: id,
            hooks_ready,
            flush,
        })
    }

    /// Discard every write and pending hook of this transaction.
    pub fn rollback(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(tx) = self.tx.take() {
            let id = tx.id();
            tx.rollback();
            let discarded = self.coordinator.hooks.rollback(id);
            debug!(tx = %id, discarded, "Unit of work rolled back");
        }
    }
}

impl Drop for UnitOfWork<'_> {
    fn drop(&mut self) {
        self.abort();
    }
}

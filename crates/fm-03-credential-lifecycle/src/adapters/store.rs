//! # Relational Store Adapter
//!
//! Implements `TokenStore` and `AccountDirectory` over the relational
//! store. Deletions run in their own derived transaction; `revoke_all`
//! lists and deletes inside that same transaction, so a token committed
//! after the listing cannot slip through.

use crate::domain::errors::CredentialError;
use crate::ports::outbound::{AccountDirectory, TokenStore};
use fm_01_storage::RelationalStore;
use shared_types::{AccessToken, Account, AccountId, TokenRef};
use std::sync::Arc;
use tracing::debug;

pub struct StoreTokenStore {
    store: Arc<RelationalStore>,
}

impl StoreTokenStore {
    pub fn new(store: Arc<RelationalStore>) -> Self {
        Self { store }
    }
}

impl TokenStore for StoreTokenStore {
    fn tokens_for_account(&self, account: AccountId) -> Result<Vec<TokenRef>, CredentialError> {
        self.store.read(|tables| {
            if !tables.accounts.contains_key(&account) {
                return Err(CredentialError::AccountNotFound(account));
            }
            Ok(tables.tokens_for_account(account))
        })
    }

    fn delete_tokens(&self, tokens: &[TokenRef]) -> Result<usize, CredentialError> {
        let mut tx = self.store.begin()?;
        let removed = tx.delete_tokens(tokens)?;
        tx.commit()?;
        debug!(requested = tokens.len(), removed, "Tokens deleted");
        Ok(removed)
    }

    fn revoke_all(&self, account: AccountId) -> Result<Vec<TokenRef>, CredentialError> {
        let mut tx = self.store.begin()?;
        if !tx.tables().accounts.contains_key(&account) {
            return Err(CredentialError::AccountNotFound(account));
        }
        let tokens = tx.tables().tokens_for_account(account);
        if tokens.is_empty() {
            return Ok(tokens);
        }
        let removed = tx.delete_tokens(&tokens)?;
        tx.commit()?;
        debug!(account_id = %account, removed, "Account tokens deleted");
        Ok(tokens)
    }
}

impl AccountDirectory for StoreTokenStore {
    fn account(&self, id: AccountId) -> Result<Option<Account>, CredentialError> {
        Ok(self.store.read(|tables| tables.accounts.get(&id).cloned()))
    }

    fn access_token(&self, token: &str) -> Result<Option<AccessToken>, CredentialError> {
        Ok(self
            .store
            .read(|tables| tables.access_token_by_value(token).cloned()))
    }

    fn ineligible_accounts_with_tokens(&self) -> Result<Vec<AccountId>, CredentialError> {
        Ok(self
            .store
            .read(|tables| tables.ineligible_accounts_with_tokens()))
    }
}

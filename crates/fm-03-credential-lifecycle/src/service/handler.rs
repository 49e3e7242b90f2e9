//! # Account Update Hook

use super::CredentialLifecycleManager;
use crate::domain::eligibility::{Eligibility, Transition};
use crate::ports::inbound::CredentialLifecycleApi;
use shared_bus::{
    EntityEvent, EntityKind, EventDispatcher, EventHandler, HandlerId, HookError, Operation,
};
use std::sync::Arc;
use tracing::debug;

impl CredentialLifecycleManager {
    /// Register on `dispatcher` for `Account.Updated`.
    pub fn register(self: Arc<Self>, dispatcher: &EventDispatcher) -> HandlerId {
        dispatcher.register(EntityKind::Account, Operation::Updated, self)
    }
}

impl EventHandler for CredentialLifecycleManager {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn handle(&self, event: &EntityEvent) -> Result<(), HookError> {
        let (before, after) = event
            .account_transition()
            .ok_or_else(|| HookError::UnexpectedPayload(event.hook_key()))?;

        match Transition::for_update(before, after) {
            Transition::None => {
                debug!(
                    account_id = %after.id,
                    before = %Eligibility::of(before),
                    after = %Eligibility::of(after),
                    "No credential change"
                );
                Ok(())
            }
            Transition::Revoke => self
                .revoke_account(after.id)
                .map(|_| ())
                .map_err(HookError::from),
        }
    }
}

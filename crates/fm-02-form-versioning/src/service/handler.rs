//! # Version Manager Hook
//!
//! Post-commit handler for `Form.Created`.

use crate::service::materialize::ensure_initial_version;
use fm_01_storage::RelationalStore;
use shared_bus::{
    EntityEvent, EntityKind, EventDispatcher, EventHandler, HandlerId, HookError, Operation,
};
use std::sync::Arc;

/// Creates the initial version and default page of every new form.
///
/// Registered for `Form.Created` only; form updates never create versions.
pub struct VersionManager {
    store: Arc<RelationalStore>,
}

impl VersionManager {
    pub const NAME: &'static str = "version_manager";

    pub fn new(store: Arc<RelationalStore>) -> Self {
        Self { store }
    }

    /// Register on `dispatcher` for `Form.Created`.
    pub fn register(self: Arc<Self>, dispatcher: &EventDispatcher) -> HandlerId {
        dispatcher.register(EntityKind::Form, Operation::Created, self)
    }
}

impl EventHandler for VersionManager {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn handle(&self, event: &EntityEvent) -> Result<(), HookError> {
        let form = match (event.operation(), event.form()) {
            (Operation::Created, Some(form)) => form,
            _ => return Err(HookError::UnexpectedPayload(event.hook_key())),
        };
        ensure_initial_version(&self.store, form.id, "initial")
            .map(|_| ())
            .map_err(HookError::from)
    }
}

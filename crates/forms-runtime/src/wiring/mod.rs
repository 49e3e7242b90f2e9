//! # Hook Wiring
//!
//! Registers the derived-state handlers on the dispatcher.
//!
//! ```text
//! Form.Created    ──→ VersionManager             (fm-02)
//! Account.Updated ──→ CredentialLifecycleManager (fm-03)
//! ```
//!
//! Registration order is execution order for handlers of the same key.

use crate::container::SubsystemContainer;
use fm_02_form_versioning::VersionManager;
use shared_bus::HandlerId;
use std::sync::Arc;
use tracing::info;

/// Handler ids of the wired hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WiredHooks {
    pub version_manager: HandlerId,
    pub credential_lifecycle: HandlerId,
}

/// Register every derived-state handler.
pub fn register_hooks(container: &SubsystemContainer) -> WiredHooks {
    let version_manager = Arc::new(VersionManager::new(container.store.clone()))
        .register(&container.dispatcher);
    let credential_lifecycle = container
        .credentials
        .clone()
        .register(&container.dispatcher);

    info!(
        handlers = container.dispatcher.handler_count(),
        "Derived-state hooks registered"
    );

    WiredHooks {
        version_manager,
        credential_lifecycle,
    }
}

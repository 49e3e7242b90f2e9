//! # Subsystem Container
//!
//! ## Initialization Order
//!
//! ```text
//! 1. Relational store   (file-backed or in memory)
//! 2. Event dispatcher   (dedup ledger, failure log)
//! 3. Coordinator        (store + dispatcher)
//! 4. fm-02 Versioning   (store)
//! 5. fm-03 Credentials  (store adapter)
//! ```
//!
//! Handlers are registered on the dispatcher by `wiring`, never here.

use crate::container::config::RuntimeConfig;
use crate::errors::RuntimeError;
use fm_01_storage::{FileSnapshotStore, RelationalStore, TransactionCoordinator};
use fm_02_form_versioning::VersioningService;
use fm_03_credential_lifecycle::{CredentialLifecycleManager, StoreTokenStore};
use shared_bus::EventDispatcher;
use std::sync::Arc;
use tracing::info;

/// Every service of the runtime, shared by `Arc`.
pub struct SubsystemContainer {
    pub store: Arc<RelationalStore>,
    pub dispatcher: Arc<EventDispatcher>,
    pub coordinator: Arc<TransactionCoordinator>,
    /// Version Manager (fm-02)
    pub versioning: Arc<VersioningService>,
    /// Credential Lifecycle Manager (fm-03)
    pub credentials: Arc<CredentialLifecycleManager>,
    pub config: RuntimeConfig,
}

impl SubsystemContainer {
    pub fn new(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        config.validate()?;

        let store = if config.storage.persist {
            let snapshots = FileSnapshotStore::open(&config.storage.data_dir)?;
            Arc::new(RelationalStore::open(Box::new(snapshots))?)
        } else {
            Arc::new(RelationalStore::in_memory())
        };

        let dispatcher = Arc::new(EventDispatcher::with_config(config.dispatch.clone()));

        // The runtime flushes itself so it can time and count each flush.
        let coordinator = Arc::new(
            TransactionCoordinator::new(store.clone(), dispatcher.clone())
                .with_flush_on_commit(false),
        );

        let versioning = Arc::new(VersioningService::new(store.clone()));

        let adapter = Arc::new(StoreTokenStore::new(store.clone()));
        let credentials = Arc::new(CredentialLifecycleManager::new(adapter.clone(), adapter));

        info!(persistence = %store.persistence(), "Subsystems initialized");

        Ok(Self {
            store,
            dispatcher,
            coordinator,
            versioning,
            credentials,
            config,
        })
    }
}

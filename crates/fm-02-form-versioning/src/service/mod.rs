//! # Versioning Service
//!
//! History read API plus the explicit versioning operations.

mod handler;
mod materialize;


pub use handler::VersionManager;
pub use materialize::InitialVersion;

use crate::domain::errors::VersioningError;
use crate::domain::repair::{RepairError, RepairReport};
use crate::ports::inbound::FormHistoryApi;
use fm_01_storage::RelationalStore;
use forms_telemetry::{metric_add, metric_inc, PAGES_CREATED, REPAIRS, VERSIONS_CREATED};
use materialize::ensure_initial_version;
use shared_types::{FormId, FormVersion, FormVersionHistory, Page, VersionId};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Reads and explicit writes over the version history tables.
pub struct VersioningService {
    store: Arc<RelationalStore>,
}

impl VersioningService {
    pub fn new(store: Arc<RelationalStore>) -> Self {
        Self { store }
    }
}

impl FormHistoryApi for VersioningService {
    fn list_versions(&self, form: FormId) -> Result<Vec<FormVersion>, VersioningError> {
        self.store.read(|tables| {
            if !tables.forms.contains_key(&form) {
                return Err(VersioningError::FormNotFound(form));
            }
            Ok(tables.versions_for_form(form))
        })
    }

    fn current_version(&self, form: FormId) -> Result<Option<FormVersion>, VersioningError> {
        Ok(self.list_versions(form)?.pop())
    }

    fn list_pages(&self, version: VersionId) -> Result<Vec<Page>, VersioningError> {
        self.store.read(|tables| {
            if !tables.versions.contains_key(&version) {
                return Err(VersioningError::VersionNotFound(version));
            }
            Ok(tables.pages_for_version(version))
        })
    }

    fn append_version(&self, form: FormId) -> Result<FormVersionHistory, VersioningError> {
        let mut tx = self.store.begin()?;
        if !tx.tables().forms.contains_key(&form) {
            return Err(VersioningError::FormNotFound(form));
        }
        let version = tx.insert_version()?;
        let history = tx.append_form_history(form, version.id)?;
        tx.commit()?;

        metric_inc!(VERSIONS_CREATED, &["explicit"]);
        info!(form_id = %form, version_id = %version.id, "Version appended");
        Ok(history)
    }

    fn add_page(&self, version: VersionId, name: &str) -> Result<Page, VersioningError> {
        let mut tx = self.store.begin()?;
        if !tx.tables().versions.contains_key(&version) {
            return Err(VersioningError::VersionNotFound(version));
        }
        let sequence = tx.tables().max_page_sequence(version) + 1;
        let page = tx.insert_page(name, sequence)?;
        tx.append_page_history(version, page.id)?;
        tx.commit()?;

        metric_inc!(PAGES_CREATED);
        info!(version_id = %version, page_id = %page.id, sequence, "Page added");
        Ok(page)
    }

    fn repair(&self) -> Result<RepairReport, VersioningError> {
        let start = Instant::now();
        let mut report = RepairReport::new();

        let (scanned, incomplete) = self.store.read(|tables| {
            (
                tables.forms.len() as u64,
                tables.forms_with_incomplete_initial_version(),
            )
        });
        report.forms_scanned = scanned;

        for form in incomplete {
            match ensure_initial_version(&self.store, form, "repair") {
                Ok(Some(initial)) if initial.version_created => report.add_repaired(form),
                Ok(Some(_)) => report.add_page_restored(form),
                Ok(None) => {}
                Err(err) => {
                    warn!(form_id = %form, error = %err, "Version repair failed");
                    report.add_error(RepairError::new(form, err.to_string()));
                }
            }
        }

        metric_add!(REPAIRS, &["versions"], report.repaired());
        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            scanned = report.forms_scanned,
            repaired = report.repaired(),
            errors = report.errors.len(),
            "Version repair finished"
        );
        Ok(report)
    }
}

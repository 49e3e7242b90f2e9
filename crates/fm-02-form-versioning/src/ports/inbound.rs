//! # Inbound Ports (Driving Ports)
//!
//! The history read API and the explicit versioning operations.

use crate::domain::errors::VersioningError;
use crate::domain::repair::RepairReport;
use shared_types::{FormId, FormVersion, FormVersionHistory, Page, VersionId};

/// Primary API of the Version Manager.
pub trait FormHistoryApi {
    /// Versions of `form` in history order, oldest first.
    ///
    /// ## Errors
    ///
    /// - `FormNotFound`: No such form
    fn list_versions(&self, form: FormId) -> Result<Vec<FormVersion>, VersioningError>;

    /// Latest version of `form`, or `None` if it has no history yet.
    fn current_version(&self, form: FormId) -> Result<Option<FormVersion>, VersioningError>;

    /// Pages of `version` ordered by sequence ascending.
    ///
    /// ## Errors
    ///
    /// - `VersionNotFound`: No such version
    fn list_pages(&self, version: VersionId) -> Result<Vec<Page>, VersioningError>;

    /// Create a new version of `form` and append exactly one history row.
    ///
    /// No page is created; prior history rows are untouched.
    fn append_version(&self, form: FormId) -> Result<FormVersionHistory, VersioningError>;

    /// Add a page to `version` after its current last page.
    fn add_page(&self, version: VersionId, name: &str) -> Result<Page, VersioningError>;

    /// Materialize the initial version of every form without history.
    fn repair(&self) -> Result<RepairReport, VersioningError>;
}

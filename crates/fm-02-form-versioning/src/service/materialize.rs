//! Initial-version materialization shared by the hook and the repair tool.

use crate::domain::errors::VersioningError;
use fm_01_storage::RelationalStore;
use forms_telemetry::{metric_inc, PAGES_CREATED, VERSIONS_CREATED};
use shared_types::{
    FormId, FormVersion, FormVersionHistory, Page, PageVersionHistory, DEFAULT_PAGE_NAME,
    DEFAULT_PAGE_SEQUENCE,
};
use tracing::{debug, info};

/// Rows making up a form's initial version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialVersion {
    pub version: FormVersion,
    pub history: FormVersionHistory,
    pub page: Page,
    pub page_history: PageVersionHistory,
    /// False when the version already existed and only the default page
    /// and its link were written.
    pub version_created: bool,
}

/// Complete the initial version of `form`.
///
/// A form without history gets a version, its history row, the default
/// page and the page link. A form whose initial version was appended
/// without the default page (an explicit version written before the hook
/// ran) gets only the page and its link. All rows are written in one
/// derived transaction; any failure rolls back every one of them.
///
/// Returns `None` when the initial version is already complete.
pub(crate) fn ensure_initial_version(
    store: &RelationalStore,
    form: FormId,
    origin: &'static str,
) -> Result<Option<InitialVersion>, VersioningError> {
    let mut tx = store.begin()?;
    if !tx.tables().forms.contains_key(&form) {
        return Err(VersioningError::FormNotFound(form));
    }
    if tx.tables().has_default_page(form) {
        debug!(form_id = %form, origin, "Form already versioned");
        return Ok(None);
    }

    let existing = tx.tables().initial_history(form).and_then(|history| {
        tx.tables()
            .versions
            .get(&history.version)
            .map(|version| (*version, history))
    });
    let (version, history, version_created) = match existing {
        Some((version, history)) => (version, history, false),
        None => {
            let version = tx.insert_version()?;
            let history = tx.append_form_history(form, version.id)?;
            (version, history, true)
        }
    };
    let page = tx.insert_page(DEFAULT_PAGE_NAME, DEFAULT_PAGE_SEQUENCE)?;
    let page_history = tx.append_page_history(version.id, page.id)?;
    tx.commit()?;

    if version_created {
        metric_inc!(VERSIONS_CREATED, &[origin]);
    }
    metric_inc!(PAGES_CREATED);
    info!(
        form_id = %form,
        version_id = %version.id,
        page_id = %page.id,
        version_created,
        origin,
        "Initial version created"
    );

    Ok(Some(InitialVersion {
        version,
        history,
        page,
        page_history,
        version_created,
    }))
}

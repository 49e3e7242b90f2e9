//! # Version Repair Report
//!
//! Result of re-running initial-version materialization for forms whose
//! initial version is missing or incomplete, e.g. because the post-commit
//! hook failed.
//!
//! ## Algorithm
//!
//! 1. Scan committed forms for ones without history, or whose first
//!    version lacks the default page
//! 2. Without history: create version, history row, default page and page
//!    link in one derived transaction
//! 3. Versioned but missing the default page: link a new default page to
//!    the first version
//! 4. Failures are recorded per form and the scan continues
//! 5. Forms with a complete initial version are never touched

use serde::Serialize;
use shared_types::FormId;

/// Result of a version repair run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    /// Forms inspected
    pub forms_scanned: u64,
    /// Forms that received their initial version
    pub forms_repaired: Vec<FormId>,
    /// Forms whose first version received the missing default page
    pub pages_restored: Vec<FormId>,
    /// Failures (non-fatal, logged and continued)
    pub errors: Vec<RepairError>,
    /// Duration of repair in milliseconds
    pub duration_ms: u64,
}

impl RepairReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no form failed.
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty()
    }

    /// Forms changed by this run.
    pub fn repaired(&self) -> usize {
        self.forms_repaired.len() + self.pages_restored.len()
    }

    pub fn add_repaired(&mut self, form: FormId) {
        self.forms_repaired.push(form);
    }

    pub fn add_page_restored(&mut self, form: FormId) {
        self.pages_restored.push(form);
    }

    pub fn add_error(&mut self, error: RepairError) {
        self.errors.push(error);
    }
}

/// A form that could not be repaired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairError {
    pub form: FormId,
    pub message: String,
}

impl RepairError {
    pub fn new(form: FormId, message: impl Into<String>) -> Self {
        Self {
            form,
            message: message.into(),
        }
    }
}

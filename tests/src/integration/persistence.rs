//! # File-Backed Restart
//!
//! Committed rows, derived rows and id sequences survive a restart; repair
//! after a restart corrects failures from before it.

#[cfg(test)]
mod tests {
    use crate::fixtures::{enrollment_form, issue_pairs, new_account, portal};
    use fm_01_storage::{StoreError, Table};
    use forms_runtime::{FormsRuntime, RuntimeConfig, RuntimeError, StorageConfig};
    use shared_types::AccountPatch;
    use std::path::Path;

    fn open(dir: &Path) -> FormsRuntime {
        FormsRuntime::new(RuntimeConfig {
            storage: StorageConfig {
                data_dir: dir.to_path_buf(),
                persist: true,
            },
            ..RuntimeConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_history_survives_restart() {
        let dir = tempfile::tempdir().unwrap();

        let (form, version) = {
            let runtime = open(dir.path());
            let category = runtime.create_category("Admissions").unwrap();
            let form = runtime
                .create_form(enrollment_form(category.id, "Enrollment"))
                .unwrap();
            let version = runtime.current_version(form.id).unwrap().unwrap();
            (form, version)
        };

        let runtime = open(dir.path());
        assert_eq!(runtime.list_versions(form.id).unwrap(), vec![version]);
        assert_eq!(runtime.list_pages(version.id).unwrap().len(), 1);

        // Sequences continue after the restart.
        let category = runtime.create_category("Surveys").unwrap();
        let second = runtime
            .create_form(enrollment_form(category.id, "Feedback"))
            .unwrap();
        assert!(second.id > form.id);
        assert!(runtime.status().is_healthy());
    }

    #[test]
    fn test_repair_after_restart() {
        let dir = tempfile::tempdir().unwrap();

        let (form, alice) = {
            let runtime = open(dir.path());
            let store = runtime.container().store.clone();
            let category = runtime.create_category("Admissions").unwrap();
            let alice = runtime.create_account(new_account("alice")).unwrap();
            let app = portal(&runtime, "portal");
            issue_pairs(&runtime, alice.id, app, 2);

            store.fail_next_inserts(Table::FormVersionHistory, 1);
            let form = runtime
                .create_form(enrollment_form(category.id, "Enrollment"))
                .unwrap();
            store.fail_next_deletes(Table::AccessToken, 1);
            runtime
                .update_account(alice.id, &AccountPatch::active(false))
                .unwrap();
            (form, alice.id)
        };

        let runtime = open(dir.path());
        let status = runtime.status();
        assert_eq!(status.violations.len(), 2);
        // The retry queue did not survive; the sweep finds the account anyway.
        assert!(status.pending_revocations.is_empty());

        let summary = runtime.repair().unwrap();
        assert_eq!(summary.versions.forms_repaired, vec![form.id]);
        assert_eq!(summary.credentials.accounts_revoked, vec![alice]);
        assert_eq!(summary.credentials.tokens.total(), 4);
        assert!(runtime.status().is_healthy());
    }

    #[test]
    fn test_data_dir_is_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let _first = open(dir.path());

        let second = FormsRuntime::new(RuntimeConfig {
            storage: StorageConfig {
                data_dir: dir.path().to_path_buf(),
                persist: true,
            },
            ..RuntimeConfig::default()
        });
        assert!(matches!(
            second,
            Err(RuntimeError::Store(StoreError::Locked { .. }))
        ));
    }
}

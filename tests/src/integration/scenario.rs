//! # Lifecycle Walkthrough
//!
//! One form creation followed by an account moving through every
//! eligibility transition:
//!
//! 1. Create form F → one version, one page "General"/1
//! 2. Deactivate A holding 2 tokens → 0 tokens
//! 3. Re-activate A → still 0 tokens
//! 4. Rename A (eligibility unchanged) → token count unchanged
//! 5. Create B → no revocation attempt, no error

#[cfg(test)]
mod tests {
    use crate::fixtures::{enrollment_form, issue_pairs, new_account, portal};
    use forms_runtime::{run_demo, FormsRuntime};
    use shared_types::{AccountPatch, DEFAULT_PAGE_NAME, DEFAULT_PAGE_SEQUENCE};

    #[test]
    fn test_lifecycle_walkthrough() {
        let runtime = FormsRuntime::ephemeral().unwrap();

        // 1. Form creation
        let category = runtime.create_category("Admissions").unwrap();
        let form = runtime
            .create_form(enrollment_form(category.id, "Enrollment"))
            .unwrap();
        let versions = runtime.list_versions(form.id).unwrap();
        assert_eq!(versions.len(), 1);
        let pages = runtime.list_pages(versions[0].id).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].name, DEFAULT_PAGE_NAME);
        assert_eq!(pages[0].sequence, DEFAULT_PAGE_SEQUENCE);

        // 2. Deactivation with two tokens
        let alice = runtime.create_account(new_account("alice")).unwrap();
        let app = portal(&runtime, "portal");
        issue_pairs(&runtime, alice.id, app, 1);
        assert_eq!(runtime.token_count(alice.id), 2);

        runtime
            .update_account(alice.id, &AccountPatch::active(false))
            .unwrap();
        assert_eq!(runtime.token_count(alice.id), 0);

        // 3. Re-activation restores nothing
        runtime
            .update_account(alice.id, &AccountPatch::active(true))
            .unwrap();
        assert_eq!(runtime.token_count(alice.id), 0);

        // 4. Rename keeps tokens
        issue_pairs(&runtime, alice.id, app, 1);
        runtime
            .update_account(alice.id, &AccountPatch::display_name("Alice Liddell"))
            .unwrap();
        assert_eq!(runtime.token_count(alice.id), 2);

        // 5. Fresh account
        let bob = runtime.create_account(new_account("bob")).unwrap();
        assert!(bob.active && bob.web_access);
        assert_eq!(runtime.token_count(bob.id), 0);

        let status = runtime.status();
        assert!(status.recent_failures.is_empty());
        assert!(status.is_healthy());
        // Form.Created, three Account.Updated
        assert_eq!(status.dispatch.fired, 4);
    }

    #[test]
    fn test_form_update_never_versions() {
        let runtime = FormsRuntime::ephemeral().unwrap();
        let category = runtime.create_category("Admissions").unwrap();
        let form = runtime
            .create_form(enrollment_form(category.id, "Enrollment"))
            .unwrap();

        let patch = shared_types::FormPatch {
            description: Some("Spring intake".into()),
            ..Default::default()
        };
        runtime.update_form(form.id, &patch).unwrap();
        runtime.update_form(form.id, &patch).unwrap();

        assert_eq!(runtime.list_versions(form.id).unwrap().len(), 1);
        assert_eq!(runtime.status().tables.pages, 1);
    }

    #[test]
    fn test_explicit_versions_keep_history() {
        let runtime = FormsRuntime::ephemeral().unwrap();
        let category = runtime.create_category("Admissions").unwrap();
        let form = runtime
            .create_form(enrollment_form(category.id, "Enrollment"))
            .unwrap();
        let initial = runtime.list_versions(form.id).unwrap();

        let second = runtime.append_version(form.id).unwrap();
        let third = runtime.append_version(form.id).unwrap();

        let versions = runtime.list_versions(form.id).unwrap();
        assert_eq!(versions.len(), 3);
        assert_eq!(versions[0], initial[0]);
        assert_eq!(versions[1].id, second.version);
        assert_eq!(versions[2].id, third.version);
        assert_eq!(runtime.status().tables.pages, 1);
        assert!(runtime.list_pages(third.version).unwrap().is_empty());
    }

    #[test]
    fn test_demo_matches_walkthrough() {
        let runtime = FormsRuntime::ephemeral().unwrap();
        let outcome = run_demo(&runtime).unwrap();
        assert!(outcome.passed(), "{outcome:?}");
    }
}

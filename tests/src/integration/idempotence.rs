//! # At-Most-Once Delivery
//!
//! Repeated notifications of one mutation, and many writers at once, must
//! still leave exactly one initial version per form. A running handler
//! chain never swallows another thread's mutation.

#[cfg(test)]
mod tests {
    use crate::fixtures::{account_row, enrollment_form, issue_pairs, new_account, portal};
    use forms_runtime::FormsRuntime;
    use shared_bus::{
        EntityEvent, EntityKind, EntityRef, EventHandler, HookError, NotifyOutcome, Operation,
    };
    use shared_types::AccountPatch;
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    /// Holds the first `Account.Updated` chain open until released.
    struct HoldFirstUpdate {
        entered: Mutex<Option<Sender<()>>>,
        release: Mutex<Receiver<()>>,
    }

    impl EventHandler for HoldFirstUpdate {
        fn name(&self) -> &'static str {
            "hold_first_update"
        }

        fn handle(&self, _event: &EntityEvent) -> Result<(), HookError> {
            if let Some(entered) = self.entered.lock().unwrap().take() {
                entered.send(()).unwrap();
                let _ = self
                    .release
                    .lock()
                    .unwrap()
                    .recv_timeout(Duration::from_secs(10));
            }
            Ok(())
        }
    }

    #[test]
    fn test_repeated_notify_in_one_transaction() {
        let runtime = FormsRuntime::ephemeral().unwrap();

        let form = runtime
            .transaction(|uow| {
                let category = uow.create_category("Admissions")?;
                let form = uow.create_form(enrollment_form(category.id, "Enrollment"))?;
                for _ in 0..5 {
                    let outcome = uow.notify(EntityEvent::form_created(form.clone()))?;
                    assert_eq!(outcome, NotifyOutcome::Duplicate);
                }
                Ok(form)
            })
            .unwrap();

        assert_eq!(runtime.list_versions(form.id).unwrap().len(), 1);
        let status = runtime.status();
        assert_eq!(status.tables.pages, 1);
        assert_eq!(status.dispatch.duplicates, 5);
        assert_eq!(status.dispatch.fired, 1);
    }

    #[test]
    fn test_many_forms_in_one_transaction() {
        let runtime = FormsRuntime::ephemeral().unwrap();

        let forms = runtime
            .transaction(|uow| {
                let category = uow.create_category("Admissions")?;
                (0..10)
                    .map(|i| uow.create_form(enrollment_form(category.id, &format!("Form {i}"))))
                    .collect::<Result<Vec<_>, _>>()
            })
            .unwrap();

        for form in &forms {
            assert_eq!(runtime.list_versions(form.id).unwrap().len(), 1);
        }
        let status = runtime.status();
        assert_eq!(status.tables.versions, 10);
        assert_eq!(status.tables.pages, 10);
        assert!(status.is_healthy());
    }

    #[test]
    fn test_concurrent_writers() {
        let runtime = FormsRuntime::ephemeral().unwrap();
        let category = runtime.create_category("Admissions").unwrap();

        thread::scope(|scope| {
            for worker in 0..4 {
                let runtime = &runtime;
                scope.spawn(move || {
                    for i in 0..10 {
                        runtime
                            .create_form(enrollment_form(
                                category.id,
                                &format!("Form {worker}-{i}"),
                            ))
                            .unwrap();
                    }
                });
            }
        });
        runtime.flush();

        let status = runtime.status();
        assert_eq!(status.tables.forms, 40);
        assert_eq!(status.tables.versions, 40);
        assert_eq!(status.tables.form_history, 40);
        assert_eq!(status.tables.pages, 40);
        assert_eq!(status.ready_hooks, 0);
        assert!(status.violations.is_empty());
    }

    #[test]
    fn test_repair_is_idempotent() {
        let runtime = FormsRuntime::ephemeral().unwrap();
        let category = runtime.create_category("Admissions").unwrap();
        for i in 0..3 {
            runtime
                .create_form(enrollment_form(category.id, &format!("Form {i}")))
                .unwrap();
        }
        let before = runtime.status().tables;

        for _ in 0..3 {
            let summary = runtime.repair().unwrap();
            assert_eq!(summary.versions.repaired(), 0);
            assert!(summary.credentials.accounts_revoked.is_empty());
        }
        assert_eq!(runtime.status().tables, before);
    }

    #[test]
    fn test_deactivation_from_other_thread_during_running_chain() {
        let runtime = FormsRuntime::ephemeral().unwrap();
        let app = portal(&runtime, "portal");
        let ana = runtime.create_account(new_account("ana")).unwrap();
        issue_pairs(&runtime, ana.id, app, 1);
        assert_eq!(runtime.token_count(ana.id), 2);

        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        runtime.container().dispatcher.register(
            EntityKind::Account,
            Operation::Updated,
            Arc::new(HoldFirstUpdate {
                entered: Mutex::new(Some(entered_tx)),
                release: Mutex::new(release_rx),
            }),
        );

        thread::scope(|scope| {
            let runtime = &runtime;
            let rename = scope.spawn(move || {
                let patch = AccountPatch {
                    display_name: Some("Ana Maria".into()),
                    ..AccountPatch::default()
                };
                runtime.update_account(ana.id, &patch).unwrap();
            });
            entered_rx.recv_timeout(Duration::from_secs(10)).unwrap();

            let deactivate = scope.spawn(move || {
                runtime
                    .update_account(ana.id, &AccountPatch::active(false))
                    .unwrap();
            });

            // The deactivation is committed while the rename chain still runs.
            let mut committed = false;
            for _ in 0..2000 {
                if account_row(runtime, ana.id).is_some_and(|row| !row.active) {
                    committed = true;
                    break;
                }
                thread::sleep(Duration::from_millis(5));
            }
            assert!(committed);
            assert!(runtime
                .container()
                .dispatcher
                .is_in_flight(EntityRef::Account(ana.id), Operation::Updated));

            release_tx.send(()).unwrap();
            rename.join().unwrap();
            deactivate.join().unwrap();
        });
        runtime.flush();

        assert_eq!(runtime.token_count(ana.id), 0);
        let status = runtime.status();
        assert_eq!(status.dispatch.suppressed, 0);
        assert!(status.violations.is_empty());
        assert!(runtime.recent_failures().is_empty());
    }
}

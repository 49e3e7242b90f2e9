use super::*;
use chrono::NaiveDate;
use shared_types::{
    Account, AccountId, AvailabilityWindow, CategoryId, Form, FormId, FormStatus, SubmissionMode,
};
use std::sync::Weak;

// =============================================================================
// Fixtures
// =============================================================================

fn form(id: u64) -> Form {
    let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    Form {
        id: FormId(id),
        category: CategoryId(1),
        name: format!("Form {id}"),
        description: String::new(),
        window: AvailabilityWindow::new(day, day).unwrap(),
        status: FormStatus::Active,
        submission_mode: SubmissionMode::Online,
        created_at: Utc::now(),
    }
}

fn account(id: u64) -> Account {
    Account {
        id: AccountId(id),
        username: format!("user{id}"),
        display_name: "User".into(),
        email: "user@example.com".into(),
        credential_hash: "h".into(),
        active: true,
        web_access: true,
        created_at: Utc::now(),
    }
}

type Log = Arc<Mutex<Vec<String>>>;

struct Recorder {
    name: &'static str,
    log: Log,
}

impl EventHandler for Recorder {
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle(&self, event: &EntityEvent) -> Result<(), HookError> {
        self.log
            .lock()
            .push(format!("{}:{}", self.name, event.entity()));
        Ok(())
    }
}

struct Failing;

impl EventHandler for Failing {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn handle(&self, _event: &EntityEvent) -> Result<(), HookError> {
        Err(HookError::DerivedWrite("table unavailable".into()))
    }
}

fn recorder(name: &'static str, log: &Log) -> Arc<dyn EventHandler> {
    Arc::new(Recorder {
        name,
        log: Arc::clone(log),
    })
}

fn committed_form(dispatcher: &EventDispatcher, id: u64) -> TransactionId {
    let tx = TransactionId::new();
    dispatcher.open_transaction(tx).unwrap();
    dispatcher
        .notify(tx, EntityEvent::form_created(form(id)))
        .unwrap();
    dispatcher.commit(tx).unwrap();
    tx
}

// =============================================================================
// Post-commit delivery
// =============================================================================

#[test]
fn test_hooks_wait_for_commit() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    dispatcher.register(EntityKind::Form, Operation::Created, recorder("v", &log));

    let tx = TransactionId::new();
    dispatcher.open_transaction(tx).unwrap();
    let outcome = dispatcher
        .notify(tx, EntityEvent::form_created(form(1)))
        .unwrap();
    assert_eq!(outcome, NotifyOutcome::Enqueued { hooks: 1 });

    let report = dispatcher.flush();
    assert_eq!(report.fired, 0);
    assert!(log.lock().is_empty());

    assert_eq!(dispatcher.commit(tx).unwrap(), 1);
    assert_eq!(dispatcher.ready_len(), 1);
    let report = dispatcher.flush();
    assert_eq!(report.fired, 1);
    assert_eq!(*log.lock(), vec!["v:form:1".to_string()]);
    assert_eq!(dispatcher.ready_len(), 0);
}

#[test]
fn test_only_matching_handlers_enqueued() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    dispatcher.register(EntityKind::Form, Operation::Created, recorder("created", &log));
    dispatcher.register(EntityKind::Form, Operation::Updated, recorder("updated", &log));
    dispatcher.register(EntityKind::Account, Operation::Updated, recorder("acct", &log));

    let tx = TransactionId::new();
    dispatcher.open_transaction(tx).unwrap();
    let outcome = dispatcher
        .notify(tx, EntityEvent::form_updated(form(2), form(2)))
        .unwrap();
    assert_eq!(outcome, NotifyOutcome::Enqueued { hooks: 1 });
    dispatcher.commit(tx).unwrap();
    dispatcher.flush();

    assert_eq!(*log.lock(), vec!["updated:form:2".to_string()]);
}

#[test]
fn test_registration_order_preserved() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    dispatcher.register(EntityKind::Form, Operation::Created, recorder("first", &log));
    dispatcher.register(EntityKind::Form, Operation::Created, recorder("second", &log));
    dispatcher.register(EntityKind::Form, Operation::Created, recorder("third", &log));

    committed_form(&dispatcher, 5);
    dispatcher.flush();

    assert_eq!(
        *log.lock(),
        vec![
            "first:form:5".to_string(),
            "second:form:5".to_string(),
            "third:form:5".to_string()
        ]
    );
}

// =============================================================================
// Deduplication
// =============================================================================

#[test]
fn test_duplicate_notify_fires_once() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    dispatcher.register(EntityKind::Form, Operation::Created, recorder("v", &log));

    let tx = TransactionId::new();
    dispatcher.open_transaction(tx).unwrap();
    for _ in 0..3 {
        dispatcher
            .notify(tx, EntityEvent::form_created(form(1)))
            .unwrap();
    }
    dispatcher.commit(tx).unwrap();
    dispatcher.flush();

    assert_eq!(log.lock().len(), 1);
    let stats = dispatcher.stats();
    assert_eq!(stats.notified, 3);
    assert_eq!(stats.duplicates, 2);
    assert_eq!(stats.fired, 1);
}

#[test]
fn test_duplicate_after_commit_ignored() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    dispatcher.register(EntityKind::Form, Operation::Created, recorder("v", &log));

    let tx = committed_form(&dispatcher, 1);
    dispatcher.flush();

    let outcome = dispatcher
        .notify(tx, EntityEvent::form_created(form(1)))
        .unwrap();
    assert_eq!(outcome, NotifyOutcome::Duplicate);
    dispatcher.flush();
    assert_eq!(log.lock().len(), 1);
}

#[test]
fn test_same_entity_in_new_transaction_delivered() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    dispatcher.register(EntityKind::Form, Operation::Updated, recorder("v", &log));

    for _ in 0..2 {
        let tx = TransactionId::new();
        dispatcher.open_transaction(tx).unwrap();
        dispatcher
            .notify(tx, EntityEvent::form_updated(form(1), form(1)))
            .unwrap();
        dispatcher.commit(tx).unwrap();
    }
    dispatcher.flush();
    assert_eq!(log.lock().len(), 2);
}

// =============================================================================
// Transaction bookkeeping
// =============================================================================

#[test]
fn test_rollback_discards_pending_hooks() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    dispatcher.register(EntityKind::Form, Operation::Created, recorder("v", &log));

    let tx = TransactionId::new();
    dispatcher.open_transaction(tx).unwrap();
    dispatcher
        .notify(tx, EntityEvent::form_created(form(1)))
        .unwrap();
    dispatcher
        .defer(tx, "after", Box::new(|| Ok(())))
        .unwrap();

    assert_eq!(dispatcher.rollback(tx), 2);
    assert_eq!(dispatcher.flush().fired, 0);
    assert!(log.lock().is_empty());
    assert!(matches!(
        dispatcher.commit(tx),
        Err(DispatchError::UnknownTransaction(_))
    ));
}

#[test]
fn test_notify_unknown_transaction_rejected() {
    let dispatcher = EventDispatcher::new();
    let tx = TransactionId::new();
    let result = dispatcher.notify(tx, EntityEvent::form_created(form(1)));
    assert_eq!(result, Err(DispatchError::UnknownTransaction(tx)));
}

#[test]
fn test_open_twice_rejected() {
    let dispatcher = EventDispatcher::new();
    let tx = TransactionId::new();
    dispatcher.open_transaction(tx).unwrap();
    assert_eq!(
        dispatcher.open_transaction(tx),
        Err(DispatchError::TransactionAlreadyOpen(tx))
    );
}

#[test]
fn test_deferred_callback_runs_after_commit() {
    let dispatcher = EventDispatcher::new();
    let ran = Arc::new(AtomicU64::new(0));
    let tx = TransactionId::new();
    dispatcher.open_transaction(tx).unwrap();

    let counter = Arc::clone(&ran);
    dispatcher
        .defer(
            tx,
            "count",
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
        .unwrap();

    dispatcher.flush();
    assert_eq!(ran.load(Ordering::SeqCst), 0);

    dispatcher.commit(tx).unwrap();
    let report = dispatcher.flush();
    assert_eq!(report.fired, 1);
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unregister_stops_future_deliveries() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    let id = dispatcher.register(EntityKind::Form, Operation::Created, recorder("v", &log));

    assert!(dispatcher.unregister(id));
    assert!(!dispatcher.unregister(id));
    assert_eq!(dispatcher.handler_count(), 0);

    committed_form(&dispatcher, 1);
    dispatcher.flush();
    assert!(log.lock().is_empty());
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_failure_reported_and_later_handlers_run() {
    let dispatcher = EventDispatcher::new();
    let log = Log::default();
    dispatcher.register(EntityKind::Form, Operation::Created, Arc::new(Failing));
    dispatcher.register(EntityKind::Form, Operation::Created, recorder("after", &log));

    let tx = committed_form(&dispatcher, 9);
    let report = dispatcher.flush();

    assert_eq!(report.fired, 1);
    assert_eq!(report.failed(), 1);
    assert!(!report.is_clean());
    let failure = &report.failures[0];
    assert_eq!(failure.handler, "failing");
    assert_eq!(failure.entity, Some(EntityRef::Form(FormId(9))));
    assert_eq!(failure.tx, tx);
    assert_eq!(log.lock().len(), 1);
    assert_eq!(dispatcher.recent_failures().len(), 1);
    assert_eq!(dispatcher.stats().failed, 1);
}

#[test]
fn test_failure_log_is_bounded() {
    let dispatcher = EventDispatcher::with_config(DispatchConfig {
        failure_log_capacity: 2,
        ..DispatchConfig::default()
    });
    dispatcher.register(EntityKind::Form, Operation::Created, Arc::new(Failing));

    for id in 1..=5 {
        committed_form(&dispatcher, id);
    }
    let report = dispatcher.flush();
    assert_eq!(report.failed(), 5);

    let kept = dispatcher.take_failures();
    assert_eq!(kept.len(), 2);
    assert_eq!(kept[0].entity, Some(EntityRef::Form(FormId(4))));
    assert!(dispatcher.recent_failures().is_empty());
}

// =============================================================================
// Re-entrancy
// =============================================================================

/// Re-notifies its own key, then commits an unrelated mutation and
/// flushes from inside the handler.
struct Echo {
    dispatcher: Mutex<Weak<EventDispatcher>>,
    outcomes: Mutex<Vec<NotifyOutcome>>,
    nested: Mutex<Vec<bool>>,
}

impl EventHandler for Echo {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn handle(&self, event: &EntityEvent) -> Result<(), HookError> {
        let Some(dispatcher) = self.dispatcher.lock().upgrade() else {
            return Err(HookError::Unavailable("dispatcher dropped".into()));
        };
        let form = event
            .form()
            .cloned()
            .ok_or(HookError::UnexpectedPayload(event.hook_key()))?;

        let tx = TransactionId::new();
        dispatcher
            .open_transaction(tx)
            .map_err(|e| HookError::Unavailable(e.to_string()))?;
        let outcome = dispatcher
            .notify(tx, EntityEvent::form_created(form))
            .map_err(|e| HookError::Unavailable(e.to_string()))?;
        self.outcomes.lock().push(outcome);
        dispatcher
            .notify(tx, EntityEvent::account_created(account(1)))
            .map_err(|e| HookError::Unavailable(e.to_string()))?;
        dispatcher
            .commit(tx)
            .map_err(|e| HookError::Unavailable(e.to_string()))?;

        self.nested.lock().push(dispatcher.flush().nested);
        Ok(())
    }
}

#[test]
fn test_reentrant_notify_suppressed_and_nested_flush_drained() {
    let dispatcher = Arc::new(EventDispatcher::new());
    let echo = Arc::new(Echo {
        dispatcher: Mutex::new(Weak::new()),
        outcomes: Mutex::new(Vec::new()),
        nested: Mutex::new(Vec::new()),
    });
    *echo.dispatcher.lock() = Arc::downgrade(&dispatcher);

    let log = Log::default();
    dispatcher.register(EntityKind::Form, Operation::Created, echo.clone());
    dispatcher.register(EntityKind::Account, Operation::Created, recorder("acct", &log));

    committed_form(&dispatcher, 3);
    let report = dispatcher.flush();

    assert_eq!(*echo.outcomes.lock(), vec![NotifyOutcome::Suppressed]);
    assert_eq!(*echo.nested.lock(), vec![true]);
    // echo once, then the account hook queued by its own commit
    assert_eq!(report.fired, 2);
    assert_eq!(*log.lock(), vec!["acct:account:1".to_string()]);
    assert!(!dispatcher.is_in_flight(EntityRef::Form(FormId(3)), Operation::Created));
    assert_eq!(dispatcher.stats().suppressed, 1);
}

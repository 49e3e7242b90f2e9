//! # Entity Events
//!
//! Defines the events that flow through the dispatcher. An event is the
//! observation of one primary-entity mutation: which entity, which
//! operation, and the row before and after the write.

use serde::{Deserialize, Serialize};
use shared_types::{Account, AccountId, Form, FormId};
use std::fmt;

/// Entity types that emit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Form,
    Account,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Form => f.write_str("form"),
            EntityKind::Account => f.write_str("account"),
        }
    }
}

/// Write operations that emit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Created,
    Updated,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Created => f.write_str("created"),
            Operation::Updated => f.write_str("updated"),
        }
    }
}

/// Identity of the mutated entity instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    Form(FormId),
    Account(AccountId),
}

impl EntityRef {
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Form(_) => EntityKind::Form,
            EntityRef::Account(_) => EntityKind::Account,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Form(id) => id.fmt(f),
            EntityRef::Account(id) => id.fmt(f),
        }
    }
}

/// Row state captured on one side of a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntitySnapshot {
    Form(Form),
    Account(Account),
}

impl EntitySnapshot {
    #[must_use]
    pub fn entity(&self) -> EntityRef {
        match self {
            EntitySnapshot::Form(form) => EntityRef::Form(form.id),
            EntitySnapshot::Account(account) => EntityRef::Account(account.id),
        }
    }
}

/// Handlers are registered against a `(kind, operation)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HookKey {
    pub kind: EntityKind,
    pub operation: Operation,
}

impl HookKey {
    #[must_use]
    pub const fn new(kind: EntityKind, operation: Operation) -> Self {
        Self { kind, operation }
    }
}

impl fmt::Display for HookKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.operation)
    }
}

/// One observed primary-entity mutation.
///
/// `before` is `None` for creations. The entity of `before` (when present)
/// always equals the entity of `after`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityEvent {
    operation: Operation,
    before: Option<EntitySnapshot>,
    after: EntitySnapshot,
}

impl EntityEvent {
    /// A form was inserted.
    #[must_use]
    pub fn form_created(form: Form) -> Self {
        Self {
            operation: Operation::Created,
            before: None,
            after: EntitySnapshot::Form(form),
        }
    }

    /// A form row was rewritten.
    #[must_use]
    pub fn form_updated(before: Form, after: Form) -> Self {
        Self {
            operation: Operation::Updated,
            before: Some(EntitySnapshot::Form(before)),
            after: EntitySnapshot::Form(after),
        }
    }

    /// An account was inserted.
    #[must_use]
    pub fn account_created(account: Account) -> Self {
        Self {
            operation: Operation::Created,
            before: None,
            after: EntitySnapshot::Account(account),
        }
    }

    /// An account row was rewritten.
    #[must_use]
    pub fn account_updated(before: Account, after: Account) -> Self {
        Self {
            operation: Operation::Updated,
            before: Some(EntitySnapshot::Account(before)),
            after: EntitySnapshot::Account(after),
        }
    }

    #[must_use]
    pub fn operation(&self) -> Operation {
        self.operation
    }

    #[must_use]
    pub fn entity(&self) -> EntityRef {
        self.after.entity()
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.entity().kind()
    }

    #[must_use]
    pub fn hook_key(&self) -> HookKey {
        HookKey::new(self.kind(), self.operation)
    }

    #[must_use]
    pub fn before(&self) -> Option<&EntitySnapshot> {
        self.before.as_ref()
    }

    #[must_use]
    pub fn after(&self) -> &EntitySnapshot {
        &self.after
    }

    /// The form after the write, if this is a form event.
    #[must_use]
    pub fn form(&self) -> Option<&Form> {
        match &self.after {
            EntitySnapshot::Form(form) => Some(form),
            EntitySnapshot::Account(_) => None,
        }
    }

    /// `(before, after)` account rows, if this is an account update.
    #[must_use]
    pub fn account_transition(&self) -> Option<(&Account, &Account)> {
        match (&self.before, &self.after) {
            (Some(EntitySnapshot::Account(before)), EntitySnapshot::Account(after)) => {
                Some((before, after))
            }
            _ => None,
        }
    }
}

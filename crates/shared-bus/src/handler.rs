//! # Event Handlers
//!
//! Defines the consuming side of the dispatcher: handlers registered
//! against a `(kind, operation)` pair and invoked after commit.

use crate::events::{EntityEvent, HookKey};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a post-commit handler.
///
/// The primary mutation that produced the event stays committed; the
/// failure is surfaced to operators only.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HookError {
    /// The handler's derived write was rolled back.
    #[error("derived write failed: {0}")]
    DerivedWrite(String),

    /// A collaborator (e.g. the token store) could not be reached.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    /// The event did not carry the state the handler needs.
    #[error("unexpected event payload for {0}")]
    UnexpectedPayload(HookKey),

    /// A commit-deferred callback failed.
    #[error("deferred callback `{label}` failed: {message}")]
    Callback { label: String, message: String },
}

/// A post-commit hook.
pub trait EventHandler: Send + Sync {
    /// Stable name used in logs and failure reports.
    fn name(&self) -> &'static str;

    /// React to a committed mutation.
    fn handle(&self, event: &EntityEvent) -> Result<(), HookError>;
}

/// Handle returned by `register`, usable to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub u64);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler:{}", self.0)
    }
}

/// A handler bound to the key it listens on.
#[derive(Clone)]
pub struct Registration {
    pub id: HandlerId,
    pub key: HookKey,
    pub handler: Arc<dyn EventHandler>,
}

impl Registration {
    #[must_use]
    pub fn matches(&self, event: &EntityEvent) -> bool {
        self.key == event.hook_key()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("handler", &self.handler.name())
            .finish()
    }
}

/// Boxed commit-deferred callback.
pub type DeferredCallback = Box<dyn FnOnce() -> Result<(), HookError> + Send>;

//! # Web Eligibility
//!
//! An account may hold web credentials only while it is both active and
//! granted web access.
//!
//! ## State Machine
//!
//! ```text
//!            (active && web_access) becomes false
//!  Eligible ───────────────────────────────────────→ Ineligible
//!     ↑                                                   │
//!     └───────────────────────────────────────────────────┘
//!            (active && web_access) becomes true
//! ```
//!
//! Only the `Eligible → Ineligible` edge revokes tokens. Creation,
//! re-activation and self-transitions never do.

use serde::Serialize;
use shared_types::Account;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Eligibility {
    Eligible,
    Ineligible,
}

impl Eligibility {
    #[must_use]
    pub fn from_flags(active: bool, web_access: bool) -> Self {
        if active && web_access {
            Eligibility::Eligible
        } else {
            Eligibility::Ineligible
        }
    }

    #[must_use]
    pub fn of(account: &Account) -> Self {
        Self::from_flags(account.active, account.web_access)
    }

    #[must_use]
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eligibility::Eligible => f.write_str("eligible"),
            Eligibility::Ineligible => f.write_str("ineligible"),
        }
    }
}

/// Action implied by an account update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Transition {
    Revoke,
    None,
}

impl Transition {
    #[must_use]
    pub fn between(before: Eligibility, after: Eligibility) -> Self {
        match (before, after) {
            (Eligibility::Eligible, Eligibility::Ineligible) => Transition::Revoke,
            _ => Transition::None,
        }
    }

    /// Transition for an update from `before` to `after`.
    #[must_use]
    pub fn for_update(before: &Account, after: &Account) -> Self {
        Self::between(Eligibility::of(before), Eligibility::of(after))
    }
}

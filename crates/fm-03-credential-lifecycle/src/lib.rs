//! # Credential Lifecycle (fm-03)
//!
//! The Credential Lifecycle Manager: when an account stops being eligible
//! for web access, every access and refresh token it owns is deleted.
//!
//! ## Eligibility
//!
//! `eligible = active && web_access`. Revocation fires on the
//! `Eligible → Ineligible` edge of a committed `Account.Updated` only.
//!
//! ## Failure Handling
//!
//! | Situation | Outcome |
//! |-----------|---------|
//! | Revocation transaction fails | Rolled back, reported, queued for retry |
//! | Process restarted with leftovers | `sweep` revokes them |
//! | Token presented meanwhile | `authorize` refuses it on eligibility |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Eligibility state machine, errors, reports
//! - `ports/` - `CredentialLifecycleApi`, `TokenStore`, `AccountDirectory`, `Clock`
//! - `adapters/` - `StoreTokenStore` over the relational store
//! - `service/` - `CredentialLifecycleManager`

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::StoreTokenStore;
pub use domain::eligibility::{Eligibility, Transition};
pub use domain::errors::{AuthorizationError, CredentialError};
pub use domain::report::{PendingRevocation, RevocationFailure, RevocationReport, RevokedTokens};
pub use ports::inbound::{AuthorizedAccount, CredentialLifecycleApi};
pub use ports::outbound::{AccountDirectory, Clock, FixedClock, SystemClock, TokenStore};
pub use service::CredentialLifecycleManager;

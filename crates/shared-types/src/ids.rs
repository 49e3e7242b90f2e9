//! # Identifiers
//!
//! Row identifiers are serial `u64` values allocated by the store, one
//! sequence per table. Transactions are identified by a random UUID so
//! that delivery bookkeeping never collides across restarts.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl $name {
            /// Raw serial value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

row_id!(
    /// Identifier of a form category.
    CategoryId,
    "category"
);
row_id!(
    /// Identifier of a form definition.
    FormId,
    "form"
);
row_id!(
    /// Identifier of a form version.
    VersionId,
    "version"
);
row_id!(
    /// Identifier of a row in the form version history.
    FormHistoryId,
    "form_history"
);
row_id!(
    /// Identifier of a page.
    PageId,
    "page"
);
row_id!(
    /// Identifier of a row in the page version history.
    PageHistoryId,
    "page_history"
);
row_id!(
    /// Identifier of an account.
    AccountId,
    "account"
);
row_id!(
    /// Identifier of an OAuth client application.
    ApplicationId,
    "application"
);
row_id!(AccessTokenId, "access_token");
row_id!(RefreshTokenId, "refresh_token");

/// Identifier of a store transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    /// Allocate a fresh transaction id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx:{}", self.0)
    }
}

//! # Fault Injection
//!
//! Arms failures on the next N inserts or deletes of a table. Used to
//! exercise derived-write rollback and revocation retry paths.

use crate::domain::tables::Table;
use std::collections::HashMap;

/// Kind of row operation a fault applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultOp {
    Insert,
    Delete,
}

impl FaultOp {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultOp::Insert => "insert",
            FaultOp::Delete => "delete",
        }
    }
}

/// Remaining armed failures per `(table, op)`.
#[derive(Debug, Default)]
pub struct FaultPlan {
    armed: HashMap<(Table, FaultOp), u32>,
}

impl FaultPlan {
    pub fn arm(&mut self, table: Table, op: FaultOp, count: u32) {
        if count == 0 {
            self.armed.remove(&(table, op));
        } else {
            self.armed.insert((table, op), count);
        }
    }

    /// Consume one armed failure. Returns `true` if the operation must fail.
    pub fn trip(&mut self, table: Table, op: FaultOp) -> bool {
        let Some(remaining) = self.armed.get_mut(&(table, op)) else {
            return false;
        };
        *remaining -= 1;
        if *remaining == 0 {
            self.armed.remove(&(table, op));
        }
        true
    }

    pub fn clear(&mut self) {
        self.armed.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }
}

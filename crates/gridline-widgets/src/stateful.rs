//! Column layout persistence contract.
//!
//! The [`ColumnRegistry`](crate::columns::ColumnRegistry) never talks to
//! storage directly. It is handed a [`LayoutStore`] plus a [`StateKey`] and
//! calls `load` once when created and `save` after every mutation. Saves are
//! fire-and-forget: a store that fails logs and moves on, and the registry's
//! in-memory layout stays authoritative.
//!
//! # Design Invariants
//!
//! 1. **Key uniqueness**: two grids with distinct `(table, scope)` pairs never
//!    share a stored layout.
//! 2. **Last write wins**: each save carries the complete current layout, so
//!    two rapid mutations cannot interleave into a mixed state.
//! 3. **No panics**: a missing or unreadable layout loads as `None`.

use core::fmt;

use crate::columns::ActiveColumnItem;

/// Identifies one grid's stored layout.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateKey {
    /// Table identifier chosen by the host (e.g. `"requests"`).
    pub table: String,
    /// Tenant scope (e.g. an organization id).
    pub scope: String,
}

impl StateKey {
    #[must_use]
    pub fn new(table: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            scope: scope.into(),
        }
    }

    /// Canonical string form: `"table::scope"`.
    #[must_use]
    pub fn canonical(&self) -> String {
        format!("{}::{}", self.table, self.scope)
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.table, self.scope)
    }
}

/// Key-value store for column layouts.
///
/// Implementations must be `Send + Sync` and use interior mutability; the
/// registry holds them behind an `Arc`.
pub trait LayoutStore: Send + Sync {
    /// Stored layout for `key`, if any.
    fn load(&self, key: &StateKey) -> Option<Vec<ActiveColumnItem>>;

    /// Replace the stored layout for `key`.
    fn save(&self, key: &StateKey, columns: &[ActiveColumnItem]);
}

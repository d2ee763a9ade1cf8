// crates/message-catalog-core/src/runtime/reconcile.rs
// ============================================================================
// Module: Catalog Reconciler
// Description: Pure planning of retire / preserve / force-overwrite actions.
// Purpose: Decide which catalog rows change during configuration.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Reconciliation compares the local definitions with the names already
//! persisted for the project and produces a [`SyncPlan`]. The function is pure
//! so every branch can be tested without a store.
//!
//! - Soft mode inserts only names the store has never seen. Store-side edits
//!   stay authoritative.
//! - Hard mode additionally force-replaces names listed in the hard list.
//! - Hard-list names missing from the definitions are retired in either mode.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::CatalogSnapshot;
use crate::core::Definitions;
use crate::core::MessageName;
use crate::core::VariableDefinition;

// ============================================================================
// SECTION: Sync Mode
// ============================================================================

/// Reconciliation policy for one configuration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMode {
    /// Allow force-overwrite of persisted names listed in `hard_list`.
    #[serde(default)]
    pub hard: bool,
    /// Names eligible for force-overwrite (hard mode) or retirement (any mode).
    #[serde(default)]
    pub hard_list: BTreeSet<MessageName>,
}

impl SyncMode {
    /// Soft mode: add new names, never touch persisted ones.
    #[must_use]
    pub fn soft() -> Self {
        Self::default()
    }

    /// Hard mode with the given hard list.
    #[must_use]
    pub fn hard<I, N>(hard_list: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<MessageName>,
    {
        Self {
            hard: true,
            hard_list: hard_list.into_iter().map(Into::into).collect(),
        }
    }

    /// Soft mode that still retires the given names.
    #[must_use]
    pub fn soft_with_retirements<I, N>(hard_list: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<MessageName>,
    {
        Self {
            hard: false,
            hard_list: hard_list.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// SECTION: Plan
// ============================================================================

/// One message to write to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMessage {
    /// Message name.
    pub name: MessageName,
    /// Text to persist.
    pub text: String,
    /// Variables to persist, in authored order.
    pub variables: Vec<VariableDefinition>,
    /// Delete any existing message of the same name before inserting.
    pub replace_existing: bool,
}

/// Reconciliation outcome.
///
/// # Invariants
/// - `retire`, `upsert` names, and `preserved` are pairwise disjoint.
/// - `upsert` and `preserved` follow the authored order of the definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Names whose message and variables are deleted outright.
    pub retire: BTreeSet<MessageName>,
    /// Messages to insert (or replace), in authored order.
    pub upsert: Vec<PlannedMessage>,
    /// Names left untouched because the store already has them.
    pub preserved: Vec<MessageName>,
}

impl SyncPlan {
    /// Returns true when the plan performs no writes.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.retire.is_empty() && self.upsert.is_empty()
    }
}

// ============================================================================
// SECTION: Reconcile
// ============================================================================

/// Computes the writes needed to bring the store in line with `definitions`.
#[must_use]
pub fn reconcile(
    definitions: &Definitions,
    persisted: &CatalogSnapshot,
    mode: &SyncMode,
) -> SyncPlan {
    let retire = mode
        .hard_list
        .iter()
        .filter(|name| !definitions.contains(name.as_str()))
        .cloned()
        .collect();

    let mut upsert = Vec::new();
    let mut preserved = Vec::new();
    for (name, definition) in definitions.iter() {
        let is_new = !persisted.contains(name.as_str());
        let forced = mode.hard && mode.hard_list.contains(name);
        if !is_new && !forced {
            preserved.push(name.clone());
            continue;
        }
        upsert.push(PlannedMessage {
            name: name.clone(),
            text: definition.text().to_string(),
            variables: definition.variables().to_vec(),
            replace_existing: !is_new,
        });
    }

    SyncPlan {
        retire,
        upsert,
        preserved,
    }
}

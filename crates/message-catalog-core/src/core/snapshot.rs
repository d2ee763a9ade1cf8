// crates/message-catalog-core/src/core/snapshot.rs
// ============================================================================
// Module: Catalog Snapshot
// Description: Immutable point-in-time mapping from message name to text.
// Purpose: Serve catalog lookups without dynamic attribute interception.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`CatalogSnapshot`] is never mutated in place. Refreshes build a new
//! snapshot with [`CatalogSnapshot::with_overlay`] and callers swap the shared
//! pointer, so readers always observe either the old or the fully updated
//! catalog.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::MessageName;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Lookup of a name that the catalog does not contain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("message not found in catalog: {name}")]
pub struct MissingMessage {
    /// Name that was requested.
    pub name: String,
}

// ============================================================================
// SECTION: Snapshot
// ============================================================================

/// Immutable name → text mapping for one project.
///
/// # Invariants
/// - Each name appears at most once.
/// - Iteration order is lexicographic by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogSnapshot {
    /// Message texts keyed by name.
    entries: BTreeMap<MessageName, String>,
}

impl CatalogSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from name/text pairs; later duplicates win.
    #[must_use]
    pub fn from_entries<I, N, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<MessageName>,
        T: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(name, text)| (name.into(), text.into())).collect(),
        }
    }

    /// Returns the text for `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Returns the text for `name` or an explicit missing-key error.
    ///
    /// # Errors
    ///
    /// Returns [`MissingMessage`] when the catalog has no entry for `name`.
    pub fn require(&self, name: &str) -> Result<&str, MissingMessage> {
        self.get(name).ok_or_else(|| MissingMessage {
            name: name.to_string(),
        })
    }

    /// Returns true when `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the snapshot has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over message names.
    pub fn names(&self) -> impl Iterator<Item = &MessageName> {
        self.entries.keys()
    }

    /// Iterates over name/text pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&MessageName, &str)> {
        self.entries.iter().map(|(name, text)| (name, text.as_str()))
    }

    /// Returns a new snapshot with `updates` applied on top of this one.
    ///
    /// Existing names are overwritten and unseen names are added; nothing is
    /// removed.
    #[must_use]
    pub fn with_overlay<I, N, T>(&self, updates: I) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<MessageName>,
        T: Into<String>,
    {
        let mut entries = self.entries.clone();
        for (name, text) in updates {
            entries.insert(name.into(), text.into());
        }
        Self {
            entries,
        }
    }

    /// Returns a new snapshot without the given names.
    #[must_use]
    pub fn without<'a, I>(&self, names: I) -> Self
    where
        I: IntoIterator<Item = &'a MessageName>,
    {
        let mut entries = self.entries.clone();
        for name in names {
            entries.remove(name);
        }
        Self {
            entries,
        }
    }
}

impl<N, T> FromIterator<(N, T)> for CatalogSnapshot
where
    N: Into<MessageName>,
    T: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, T)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

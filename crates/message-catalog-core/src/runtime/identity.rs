// crates/message-catalog-core/src/runtime/identity.rs
// ============================================================================
// Module: Static Identity
// Description: Fixed serving identity for hosts that know their name up front.
// Purpose: Provide an IdentityResolver without a network round trip.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Hosts that learn their identity from a remote service implement
//! [`IdentityResolver`] themselves. [`StaticIdentity`] covers configured
//! names and tests.

use crate::core::ProjectName;
use crate::interfaces::IdentityError;
use crate::interfaces::IdentityResolver;

/// Identity resolver returning a fixed project name.
///
/// # Invariants
/// - An empty (or whitespace-only) name resolves to [`IdentityError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIdentity {
    /// Project name served to the store.
    name: ProjectName,
}

impl StaticIdentity {
    /// Creates a resolver for `name`.
    #[must_use]
    pub fn new(name: impl Into<ProjectName>) -> Self {
        Self {
            name: name.into(),
        }
    }
}

impl IdentityResolver for StaticIdentity {
    fn resolve_identity(&self) -> Result<ProjectName, IdentityError> {
        if self.name.as_str().trim().is_empty() {
            return Err(IdentityError("project name is empty".to_string()));
        }
        Ok(self.name.clone())
    }
}

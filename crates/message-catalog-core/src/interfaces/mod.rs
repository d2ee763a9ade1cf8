// crates/message-catalog-core/src/interfaces/mod.rs
// ============================================================================
// Module: Message Catalog Interfaces
// Description: Backend-agnostic interfaces for catalog storage and host collaborators.
// Purpose: Define the contract surfaces used by the catalog runtime.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces describe how the catalog runtime talks to the persistent store,
//! to the host's identity lookup, and to the host's runtime settings, without
//! embedding backend-specific details. Store implementations must fail closed:
//! a connectivity or protocol failure is an error, never a partial result.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::core::identifiers::MessageId;
use crate::core::identifiers::MessageName;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::ProjectName;
use crate::core::identifiers::VariableId;

// ============================================================================
// SECTION: Catalog Store
// ============================================================================

/// Catalog store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Error messages avoid embedding message text bodies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached or failed mid-protocol.
    #[error("catalog store unavailable: {0}")]
    Unavailable(String),
    /// A uniqueness constraint rejected the write.
    #[error("catalog store conflict: {0}")]
    Conflict(String),
    /// The store returned data that does not fit the catalog model.
    #[error("catalog store invalid data: {0}")]
    Invalid(String),
}

/// Persistent catalog of projects, messages, and variables.
///
/// Callers own deletion order: variables must be deleted before the message
/// that owns them.
pub trait CatalogStore {
    /// Returns the project id for `name`, creating the project when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn resolve_project(&self, name: &ProjectName) -> Result<ProjectId, StoreError>;

    /// Returns the project id for `name` without creating it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn find_project(&self, name: &ProjectName) -> Result<Option<ProjectId>, StoreError>;

    /// Reads every message of a project.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn list_messages(&self, project: ProjectId)
    -> Result<BTreeMap<MessageName, String>, StoreError>;

    /// Looks up a message id by name within a project.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn find_message_id(
        &self,
        name: &MessageName,
        project: ProjectId,
    ) -> Result<Option<MessageId>, StoreError>;

    /// Returns the variable ids of a message keyed by variable name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn list_variable_ids(
        &self,
        message: MessageId,
    ) -> Result<BTreeMap<String, VariableId>, StoreError>;

    /// Deletes one variable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn delete_variable(&self, id: VariableId) -> Result<(), StoreError>;

    /// Deletes one message. Its variables must already be gone.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn delete_message(&self, id: MessageId) -> Result<(), StoreError>;

    /// Inserts a message and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the name already exists in the
    /// project, or another [`StoreError`] when the store is unavailable.
    fn insert_message(
        &self,
        name: &MessageName,
        text: &str,
        project: ProjectId,
    ) -> Result<MessageId, StoreError>;

    /// Inserts a variable for a message and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the name already exists on the
    /// message, or another [`StoreError`] when the store is unavailable.
    fn insert_variable(
        &self,
        name: &str,
        description: &str,
        message: MessageId,
    ) -> Result<VariableId, StoreError>;

    /// Reports whether the store is ready to serve requests.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Thread-safe catalog store trait object.
pub type DynCatalogStore = dyn CatalogStore + Send + Sync;

/// Establishes the long-lived store handle used by a configured service.
pub trait StoreConnector {
    /// Opens (or pools) the store connection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be reached.
    fn connect(&self) -> Result<Arc<DynCatalogStore>, StoreError>;
}

// ============================================================================
// SECTION: Host Collaborators
// ============================================================================

/// Serving identity lookup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("serving identity unavailable: {0}")]
pub struct IdentityError(pub String);

/// Supplies the stable name used as the project identity.
pub trait IdentityResolver {
    /// Resolves the serving identity's project name.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] when the identity cannot be determined.
    fn resolve_identity(&self) -> Result<ProjectName, IdentityError>;
}

/// Read-only runtime settings consumed by catalog configuration.
pub trait RuntimeSettings {
    /// Returns true when the catalog must run from local definitions only.
    fn offline(&self) -> bool;

    /// Returns the connector for the persistent store.
    fn connector(&self) -> &dyn StoreConnector;
}

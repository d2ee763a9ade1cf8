// crates/message-catalog-core/src/runtime/store.rs
// ============================================================================
// Module: Message Catalog In-Memory Store
// Description: Simple in-memory catalog store for tests and examples.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides an in-memory implementation of [`CatalogStore`] that
//! enforces the same uniqueness and ownership rules as the SQL schema, plus a
//! switch to simulate an unreachable store. It is not intended for production
//! use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::MessageId;
use crate::core::MessageName;
use crate::core::ProjectId;
use crate::core::ProjectName;
use crate::core::VariableDefinition;
use crate::core::VariableId;
use crate::interfaces::CatalogStore;
use crate::interfaces::DynCatalogStore;
use crate::interfaces::StoreConnector;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Persisted message row.
#[derive(Debug, Clone)]
struct MessageRow {
    /// Owning project.
    project: ProjectId,
    /// Message name.
    name: MessageName,
    /// Message text.
    text: String,
}

/// Persisted variable row.
#[derive(Debug, Clone)]
struct VariableRow {
    /// Owning message.
    message: MessageId,
    /// Variable name.
    name: String,
    /// Variable description.
    description: String,
}

/// Mutable store contents.
#[derive(Debug, Default)]
struct MemoryState {
    /// Simulated outage flag.
    unavailable: bool,
    /// Number of store operations attempted, including failed ones.
    operations: u64,
    /// Last assigned row id (shared sequence across tables).
    last_id: i64,
    /// Projects keyed by name.
    projects: BTreeMap<ProjectName, ProjectId>,
    /// Message rows keyed by id.
    messages: BTreeMap<MessageId, MessageRow>,
    /// Variable rows keyed by id.
    variables: BTreeMap<VariableId, VariableRow>,
}

impl MemoryState {
    /// Records an operation and fails when the store is marked unavailable.
    fn enter(&mut self) -> Result<(), StoreError> {
        self.operations += 1;
        if self.unavailable {
            return Err(StoreError::Unavailable("in-memory store marked unavailable".to_string()));
        }
        Ok(())
    }

    /// Allocates the next row id.
    const fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// In-memory catalog store for tests and examples.
///
/// # Invariants
/// - Message names are unique per project; variable names are unique per message.
/// - A message cannot be deleted while it still owns variables.
/// - Clones share the same underlying state.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalogStore {
    /// Store contents protected by a mutex.
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryCatalogStore {
    /// Creates a new, empty, available store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the store contents.
    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store mutex poisoned".to_string()))
    }

    /// Simulates the store going down (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        if let Ok(mut state) = self.lock() {
            state.unavailable = !available;
        }
    }

    /// Returns how many store operations have been attempted so far.
    #[must_use]
    pub fn operation_count(&self) -> u64 {
        self.lock().map_or(0, |state| state.operations)
    }

    /// Returns the id of a project without creating it.
    #[must_use]
    pub fn project_id(&self, name: &ProjectName) -> Option<ProjectId> {
        self.lock().ok().and_then(|state| state.projects.get(name).copied())
    }

    /// Returns the number of message rows stored for a project.
    #[must_use]
    pub fn message_count(&self, project: ProjectId) -> usize {
        self.lock().map_or(0, |state| {
            state.messages.values().filter(|row| row.project == project).count()
        })
    }

    /// Returns the text of a stored message, bypassing availability checks.
    #[must_use]
    pub fn message_text(&self, project: ProjectId, name: &str) -> Option<String> {
        let state = self.lock().ok()?;
        state
            .messages
            .values()
            .find(|row| row.project == project && row.name.as_str() == name)
            .map(|row| row.text.clone())
    }

    /// Returns the variables of a stored message in insertion order.
    ///
    /// Returns `None` when the message does not exist.
    #[must_use]
    pub fn message_variables(
        &self,
        project: ProjectId,
        name: &str,
    ) -> Option<Vec<VariableDefinition>> {
        let state = self.lock().ok()?;
        let (message_id, _) = state
            .messages
            .iter()
            .find(|(_, row)| row.project == project && row.name.as_str() == name)?;
        Some(
            state
                .variables
                .values()
                .filter(|row| row.message == *message_id)
                .map(|row| VariableDefinition::new(row.name.clone(), row.description.clone()))
                .collect(),
        )
    }

    /// Returns the total number of variable rows across all messages.
    #[must_use]
    pub fn variable_count(&self) -> usize {
        self.lock().map_or(0, |state| state.variables.len())
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn resolve_project(&self, name: &ProjectName) -> Result<ProjectId, StoreError> {
        let mut state = self.lock()?;
        state.enter()?;
        if let Some(id) = state.projects.get(name) {
            return Ok(*id);
        }
        let id = ProjectId::new(state.next_id());
        state.projects.insert(name.clone(), id);
        drop(state);
        Ok(id)
    }

    fn find_project(&self, name: &ProjectName) -> Result<Option<ProjectId>, StoreError> {
        let mut state = self.lock()?;
        state.enter()?;
        Ok(state.projects.get(name).copied())
    }

    fn list_messages(
        &self,
        project: ProjectId,
    ) -> Result<BTreeMap<MessageName, String>, StoreError> {
        let mut state = self.lock()?;
        state.enter()?;
        Ok(state
            .messages
            .values()
            .filter(|row| row.project == project)
            .map(|row| (row.name.clone(), row.text.clone()))
            .collect())
    }

    fn find_message_id(
        &self,
        name: &MessageName,
        project: ProjectId,
    ) -> Result<Option<MessageId>, StoreError> {
        let mut state = self.lock()?;
        state.enter()?;
        Ok(state
            .messages
            .iter()
            .find(|(_, row)| row.project == project && row.name == *name)
            .map(|(id, _)| *id))
    }

    fn list_variable_ids(
        &self,
        message: MessageId,
    ) -> Result<BTreeMap<String, VariableId>, StoreError> {
        let mut state = self.lock()?;
        state.enter()?;
        Ok(state
            .variables
            .iter()
            .filter(|(_, row)| row.message == message)
            .map(|(id, row)| (row.name.clone(), *id))
            .collect())
    }

    fn delete_variable(&self, id: VariableId) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.enter()?;
        state.variables.remove(&id);
        drop(state);
        Ok(())
    }

    fn delete_message(&self, id: MessageId) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.enter()?;
        if state.variables.values().any(|row| row.message == id) {
            return Err(StoreError::Conflict(format!("message {id} still owns variables")));
        }
        state.messages.remove(&id);
        drop(state);
        Ok(())
    }

    fn insert_message(
        &self,
        name: &MessageName,
        text: &str,
        project: ProjectId,
    ) -> Result<MessageId, StoreError> {
        let mut state = self.lock()?;
        state.enter()?;
        if !state.projects.values().any(|id| *id == project) {
            return Err(StoreError::Invalid(format!("unknown project {project}")));
        }
        if state.messages.values().any(|row| row.project == project && row.name == *name) {
            return Err(StoreError::Conflict(format!(
                "message {name} already exists in project {project}"
            )));
        }
        let id = MessageId::new(state.next_id());
        state.messages.insert(
            id,
            MessageRow {
                project,
                name: name.clone(),
                text: text.to_string(),
            },
        );
        drop(state);
        Ok(id)
    }

    fn insert_variable(
        &self,
        name: &str,
        description: &str,
        message: MessageId,
    ) -> Result<VariableId, StoreError> {
        let mut state = self.lock()?;
        state.enter()?;
        if !state.messages.contains_key(&message) {
            return Err(StoreError::Invalid(format!("unknown message {message}")));
        }
        if state.variables.values().any(|row| row.message == message && row.name == name) {
            return Err(StoreError::Conflict(format!(
                "variable {name} already exists on message {message}"
            )));
        }
        let id = VariableId::new(state.next_id());
        state.variables.insert(
            id,
            VariableRow {
                message,
                name: name.to_string(),
                description: description.to_string(),
            },
        );
        drop(state);
        Ok(id)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.lock()?.enter()
    }
}

impl StoreConnector for InMemoryCatalogStore {
    fn connect(&self) -> Result<Arc<DynCatalogStore>, StoreError> {
        self.readiness()?;
        Ok(Arc::new(self.clone()))
    }
}

// ============================================================================
// SECTION: Shared Store Wrapper
// ============================================================================

/// Shared catalog store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedCatalogStore {
    /// Inner store implementation.
    inner: Arc<DynCatalogStore>,
}

impl SharedCatalogStore {
    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<DynCatalogStore>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl CatalogStore for SharedCatalogStore {
    fn resolve_project(&self, name: &ProjectName) -> Result<ProjectId, StoreError> {
        self.inner.resolve_project(name)
    }

    fn find_project(&self, name: &ProjectName) -> Result<Option<ProjectId>, StoreError> {
        self.inner.find_project(name)
    }

    fn list_messages(
        &self,
        project: ProjectId,
    ) -> Result<BTreeMap<MessageName, String>, StoreError> {
        self.inner.list_messages(project)
    }

    fn find_message_id(
        &self,
        name: &MessageName,
        project: ProjectId,
    ) -> Result<Option<MessageId>, StoreError> {
        self.inner.find_message_id(name, project)
    }

    fn list_variable_ids(
        &self,
        message: MessageId,
    ) -> Result<BTreeMap<String, VariableId>, StoreError> {
        self.inner.list_variable_ids(message)
    }

    fn delete_variable(&self, id: VariableId) -> Result<(), StoreError> {
        self.inner.delete_variable(id)
    }

    fn delete_message(&self, id: MessageId) -> Result<(), StoreError> {
        self.inner.delete_message(id)
    }

    fn insert_message(
        &self,
        name: &MessageName,
        text: &str,
        project: ProjectId,
    ) -> Result<MessageId, StoreError> {
        self.inner.insert_message(name, text, project)
    }

    fn insert_variable(
        &self,
        name: &str,
        description: &str,
        message: MessageId,
    ) -> Result<VariableId, StoreError> {
        self.inner.insert_variable(name, description, message)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.inner.readiness()
    }
}

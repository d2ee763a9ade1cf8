// crates/message-catalog-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Catalog Store
// Description: CatalogStore backed by SQLite.
// Purpose: Persist catalog rows with schema-enforced uniqueness.
// Dependencies: message-catalog-core, rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! A single connection guarded by a mutex serves every call. Constraint
//! violations surface as [`StoreError::Conflict`]; every other engine failure
//! is [`StoreError::Unavailable`]. Foreign keys are enforced, so deleting a
//! message that still owns variables fails instead of orphaning rows.

// ============================================================================//
// SECTION: Imports
// ============================================================================//

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use message_catalog_core::CatalogStore;
use message_catalog_core::DynCatalogStore;
use message_catalog_core::MessageId;
use message_catalog_core::MessageName;
use message_catalog_core::ProjectId;
use message_catalog_core::ProjectName;
use message_catalog_core::StoreConnector;
use message_catalog_core::StoreError;
use message_catalog_core::VariableId;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

// ============================================================================//
// SECTION: Constants
// ============================================================================//

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================//
// SECTION: Config
// ============================================================================//

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// Configuration for the `SQLite` catalog store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
}

impl SqliteStoreConfig {
    /// Creates a config for `path` with default timeouts and WAL journaling.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl StoreConnector for SqliteStoreConfig {
    fn connect(&self) -> Result<Arc<DynCatalogStore>, StoreError> {
        let store = SqliteCatalogStore::new(self.clone())?;
        Ok(Arc::new(store))
    }
}

// ============================================================================//
// SECTION: Errors
// ============================================================================//

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Unique or foreign key constraint rejected the statement.
    #[error("sqlite store constraint violation: {0}")]
    Constraint(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store configuration or data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(_) | SqliteStoreError::Db(_) => Self::Unavailable(error.to_string()),
            SqliteStoreError::Constraint(message) => Self::Conflict(message),
            SqliteStoreError::VersionMismatch(_) | SqliteStoreError::Invalid(_) => {
                Self::Invalid(error.to_string())
            }
        }
    }
}

impl From<rusqlite::Error> for SqliteStoreError {
    fn from(error: rusqlite::Error) -> Self {
        if error.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
            Self::Constraint(error.to_string())
        } else {
            Self::Db(error.to_string())
        }
    }
}

// ============================================================================//
// SECTION: Store
// ============================================================================//

/// `SQLite`-backed catalog store.
///
/// # Invariants
/// - Message names are unique per project; variable names are unique per message.
/// - Clones share one connection.
#[derive(Clone)]
pub struct SqliteCatalogStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteCatalogStore {
    /// Opens (creating if needed) an `SQLite` catalog database.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        debug!(path = %config.path.display(), "opened sqlite catalog store");
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))
    }

    /// Returns or creates the project row.
    fn resolve_project_row(&self, name: &ProjectName) -> Result<ProjectId, SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction()?;
        tx.execute(
            "INSERT INTO project (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
            params![name.as_str()],
        )?;
        let id: i64 =
            tx.query_row("SELECT id FROM project WHERE name = ?1", params![name.as_str()], |row| {
                row.get(0)
            })?;
        tx.commit()?;
        drop(guard);
        Ok(ProjectId::new(id))
    }

    /// Looks up a project id without inserting.
    fn find_project_row(
        &self,
        name: &ProjectName,
    ) -> Result<Option<ProjectId>, SqliteStoreError> {
        let guard = self.lock()?;
        let id: Option<i64> = guard
            .query_row("SELECT id FROM project WHERE name = ?1", params![name.as_str()], |row| {
                row.get(0)
            })
            .optional()?;
        drop(guard);
        Ok(id.map(ProjectId::new))
    }

    /// Reads every message of a project.
    fn list_message_rows(
        &self,
        project: ProjectId,
    ) -> Result<BTreeMap<MessageName, String>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut statement = guard.prepare("SELECT name, text FROM message WHERE project_id = ?1")?;
        let rows = statement.query_map(params![project.get()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut messages = BTreeMap::new();
        for row in rows {
            let (name, text) = row?;
            messages.insert(MessageName::new(name), text);
        }
        Ok(messages)
    }

    /// Looks up a message id.
    fn find_message_row(
        &self,
        name: &MessageName,
        project: ProjectId,
    ) -> Result<Option<MessageId>, SqliteStoreError> {
        let guard = self.lock()?;
        let id: Option<i64> = guard
            .query_row(
                "SELECT id FROM message WHERE name = ?1 AND project_id = ?2",
                params![name.as_str(), project.get()],
                |row| row.get(0),
            )
            .optional()?;
        drop(guard);
        Ok(id.map(MessageId::new))
    }

    /// Lists the variables of a message.
    fn list_variable_rows(
        &self,
        message: MessageId,
    ) -> Result<BTreeMap<String, VariableId>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut statement = guard.prepare("SELECT name, id FROM variable WHERE message_id = ?1")?;
        let rows = statement.query_map(params![message.get()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut variables = BTreeMap::new();
        for row in rows {
            let (name, id) = row?;
            variables.insert(name, VariableId::new(id));
        }
        Ok(variables)
    }

    /// Executes a single-row write and returns the new row id.
    fn insert_row(&self, sql: &str, params: impl rusqlite::Params) -> Result<i64, SqliteStoreError> {
        let guard = self.lock()?;
        guard.execute(sql, params)?;
        let id = guard.last_insert_rowid();
        drop(guard);
        Ok(id)
    }

    /// Executes a delete statement.
    fn delete_row(&self, sql: &str, id: i64) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard.execute(sql, params![id])?;
        drop(guard);
        Ok(())
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn resolve_project(&self, name: &ProjectName) -> Result<ProjectId, StoreError> {
        self.resolve_project_row(name).map_err(StoreError::from)
    }

    fn find_project(&self, name: &ProjectName) -> Result<Option<ProjectId>, StoreError> {
        self.find_project_row(name).map_err(StoreError::from)
    }

    fn list_messages(
        &self,
        project: ProjectId,
    ) -> Result<BTreeMap<MessageName, String>, StoreError> {
        self.list_message_rows(project).map_err(StoreError::from)
    }

    fn find_message_id(
        &self,
        name: &MessageName,
        project: ProjectId,
    ) -> Result<Option<MessageId>, StoreError> {
        self.find_message_row(name, project).map_err(StoreError::from)
    }

    fn list_variable_ids(
        &self,
        message: MessageId,
    ) -> Result<BTreeMap<String, VariableId>, StoreError> {
        self.list_variable_rows(message).map_err(StoreError::from)
    }

    fn delete_variable(&self, id: VariableId) -> Result<(), StoreError> {
        self.delete_row("DELETE FROM variable WHERE id = ?1", id.get()).map_err(StoreError::from)
    }

    fn delete_message(&self, id: MessageId) -> Result<(), StoreError> {
        self.delete_row("DELETE FROM message WHERE id = ?1", id.get()).map_err(StoreError::from)
    }

    fn insert_message(
        &self,
        name: &MessageName,
        text: &str,
        project: ProjectId,
    ) -> Result<MessageId, StoreError> {
        self.insert_row(
            "INSERT INTO message (name, text, project_id) VALUES (?1, ?2, ?3)",
            params![name.as_str(), text, project.get()],
        )
        .map(MessageId::new)
        .map_err(StoreError::from)
    }

    fn insert_variable(
        &self,
        name: &str,
        description: &str,
        message: MessageId,
    ) -> Result<VariableId, StoreError> {
        self.insert_row(
            "INSERT INTO variable (name, description, message_id) VALUES (?1, ?2, ?3)",
            params![name, description, message.get()],
        )
        .map(VariableId::new)
        .map_err(StoreError::from)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        let guard = self.lock()?;
        guard
            .query_row("SELECT 1", params![], |row| row.get::<_, i64>(0))
            .map_err(SqliteStoreError::from)?;
        drop(guard);
        Ok(())
    }
}

// ============================================================================//
// SECTION: Helpers
// ============================================================================//

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with foreign keys enforced.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)?;
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))?;
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    Ok(connection)
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction()?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS project (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE
                );
                CREATE TABLE IF NOT EXISTS message (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    text TEXT NOT NULL,
                    project_id INTEGER NOT NULL REFERENCES project(id),
                    UNIQUE (name, project_id)
                );
                CREATE TABLE IF NOT EXISTS variable (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    description TEXT NOT NULL,
                    message_id INTEGER NOT NULL REFERENCES message(id),
                    UNIQUE (name, message_id)
                );",
            )?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit()?;
    Ok(())
}

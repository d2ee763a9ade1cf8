// crates/message-catalog-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite Catalog Store Tests
// Description: Row-level behavior of the SQLite catalog store.
// Purpose: Ensure SQL constraints match the catalog model and sync end to end.
// Dependencies: message-catalog-store-sqlite, message-catalog-core, rusqlite
// ============================================================================

//! ## Overview
//! Exercises CRUD and constraint mapping against a real database file, then
//! runs a full catalog configuration through the store and inspects the rows
//! with a second connection.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use message_catalog_core::CatalogService;
use message_catalog_core::CatalogStore;
use message_catalog_core::ConfigureRequest;
use message_catalog_core::MessageName;
use message_catalog_core::ProjectName;
use message_catalog_core::RuntimeSettings;
use message_catalog_core::StaticIdentity;
use message_catalog_core::StoreConnector;
use message_catalog_core::StoreError;
use message_catalog_core::SyncMode;
use message_catalog_store_sqlite::SqliteCatalogStore;
use message_catalog_store_sqlite::SqliteStoreConfig;
use message_catalog_store_sqlite::SqliteStoreError;
use message_catalog_store_sqlite::SqliteStoreMode;
use rusqlite::Connection;
use rusqlite::params;
use tempfile::TempDir;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Database path inside `dir`.
fn store_path(dir: &TempDir) -> PathBuf {
    dir.path().join("catalog").join("messages.sqlite3")
}

/// Opens a store at `path` with default settings.
fn open_store(path: &Path) -> SqliteCatalogStore {
    SqliteCatalogStore::new(SqliteStoreConfig::new(path)).unwrap()
}

/// Online runtime backed by a sqlite config.
struct SqliteRuntime(SqliteStoreConfig);

impl RuntimeSettings for SqliteRuntime {
    fn offline(&self) -> bool {
        false
    }

    fn connector(&self) -> &dyn StoreConnector {
        &self.0
    }
}

// ============================================================================
// SECTION: CRUD
// ============================================================================

#[test]
fn resolve_project_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&store_path(&dir));
    let first = store.resolve_project(&ProjectName::new("bot")).unwrap();
    let second = store.resolve_project(&ProjectName::new("bot")).unwrap();
    let other = store.resolve_project(&ProjectName::new("other")).unwrap();
    assert_eq!(first, second);
    assert_ne!(first, other);
}

#[test]
fn messages_and_variables_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&store_path(&dir));
    let project = store.resolve_project(&ProjectName::new("bot")).unwrap();
    let message = store.insert_message(&MessageName::new("help"), "Use {cmd}", project).unwrap();
    let variable = store.insert_variable("cmd", "command name", message).unwrap();

    let messages = store.list_messages(project).unwrap();
    assert_eq!(messages.get("help").map(String::as_str), Some("Use {cmd}"));
    assert_eq!(store.find_message_id(&MessageName::new("help"), project).unwrap(), Some(message));
    assert_eq!(store.find_message_id(&MessageName::new("nope"), project).unwrap(), None);
    let variables = store.list_variable_ids(message).unwrap();
    assert_eq!(variables.get("cmd"), Some(&variable));

    store.delete_variable(variable).unwrap();
    store.delete_message(message).unwrap();
    assert!(store.list_messages(project).unwrap().is_empty());
}

#[test]
fn messages_are_scoped_per_project() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&store_path(&dir));
    let first = store.resolve_project(&ProjectName::new("first")).unwrap();
    let second = store.resolve_project(&ProjectName::new("second")).unwrap();
    store.insert_message(&MessageName::new("greeting"), "One", first).unwrap();
    store.insert_message(&MessageName::new("greeting"), "Two", second).unwrap();

    assert_eq!(store.list_messages(first).unwrap().get("greeting").map(String::as_str), Some("One"));
    assert_eq!(store.list_messages(second).unwrap().get("greeting").map(String::as_str), Some("Two"));
}

#[test]
fn duplicate_names_are_conflicts() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&store_path(&dir));
    let project = store.resolve_project(&ProjectName::new("bot")).unwrap();
    let message = store.insert_message(&MessageName::new("help"), "a", project).unwrap();
    store.insert_variable("cmd", "first", message).unwrap();

    let err = store.insert_message(&MessageName::new("help"), "b", project).unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
    let err = store.insert_variable("cmd", "second", message).unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[test]
fn deleting_message_with_variables_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&store_path(&dir));
    let project = store.resolve_project(&ProjectName::new("bot")).unwrap();
    let message = store.insert_message(&MessageName::new("help"), "a", project).unwrap();
    store.insert_variable("cmd", "first", message).unwrap();

    let err = store.delete_message(message).unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
    assert_eq!(store.list_messages(project).unwrap().len(), 1);
}

#[test]
fn reopening_preserves_rows() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    let project = {
        let store = open_store(&path);
        let project = store.resolve_project(&ProjectName::new("bot")).unwrap();
        store.insert_message(&MessageName::new("greeting"), "Hello", project).unwrap();
        project
    };
    let reopened = open_store(&path);
    assert_eq!(reopened.resolve_project(&ProjectName::new("bot")).unwrap(), project);
    assert_eq!(reopened.list_messages(project).unwrap().len(), 1);
    reopened.readiness().unwrap();
}

#[test]
fn rejects_directory_path_and_unknown_schema_version() {
    let dir = TempDir::new().unwrap();
    let err = SqliteCatalogStore::new(SqliteStoreConfig::new(dir.path())).err().unwrap();
    assert!(matches!(err, SqliteStoreError::Invalid(_)));

    let path = dir.path().join("future.sqlite3");
    {
        let connection = Connection::open(&path).unwrap();
        connection
            .execute_batch(
                "CREATE TABLE store_meta (version INTEGER NOT NULL);
                 INSERT INTO store_meta (version) VALUES (99);",
            )
            .unwrap();
    }
    let err = SqliteCatalogStore::new(SqliteStoreConfig::new(&path)).err().unwrap();
    assert!(matches!(err, SqliteStoreError::VersionMismatch(_)));
    assert!(matches!(StoreError::from(err), StoreError::Invalid(_)));
}

#[test]
fn delete_journal_mode_is_supported() {
    let dir = TempDir::new().unwrap();
    let config = SqliteStoreConfig {
        journal_mode: SqliteStoreMode::Delete,
        ..SqliteStoreConfig::new(store_path(&dir))
    };
    let store = SqliteCatalogStore::new(config).unwrap();
    store.readiness().unwrap();
}

// ============================================================================
// SECTION: End-to-End
// ============================================================================

#[test]
fn configure_writes_help_message_and_variable_rows() {
    let dir = TempDir::new().unwrap();
    let definitions = dir.path().join("messages.json");
    fs::write(
        &definitions,
        r#"{"help": {"text": "Need help? Use {cmd}",
            "variables": [{"name": "cmd", "description": "command name"}]}}"#,
    )
    .unwrap();
    let path = store_path(&dir);
    let service = CatalogService::new();

    service
        .configure(
            &StaticIdentity::new("support_bot"),
            &SqliteRuntime(SqliteStoreConfig::new(&path)),
            &ConfigureRequest::new(&definitions),
        )
        .unwrap();

    let connection = Connection::open(&path).unwrap();
    let (message_id, text): (i64, String) = connection
        .query_row(
            "SELECT m.id, m.text FROM message m JOIN project p ON p.id = m.project_id
             WHERE p.name = ?1 AND m.name = ?2",
            params!["support_bot", "help"],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(text, "Need help? Use {cmd}");
    let variables: Vec<(String, i64)> = connection
        .prepare("SELECT name, message_id FROM variable")
        .unwrap()
        .query_map(params![], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(variables, vec![("cmd".to_string(), message_id)]);

    assert_eq!(service.actualize().get("help"), Some("Need help? Use {cmd}"));
}

#[test]
fn hard_sync_replaces_rows_and_picks_up_direct_edits() {
    let dir = TempDir::new().unwrap();
    let definitions = dir.path().join("messages.json");
    fs::write(&definitions, r#"{"welcome": "Default text"}"#).unwrap();
    let path = store_path(&dir);
    {
        let store = open_store(&path);
        let project = store.resolve_project(&ProjectName::new("bot")).unwrap();
        let message =
            store.insert_message(&MessageName::new("welcome"), "Edited in DB", project).unwrap();
        store.insert_variable("stale", "old", message).unwrap();
    }
    let service = CatalogService::new();
    service
        .configure(
            &StaticIdentity::new("bot"),
            &SqliteRuntime(SqliteStoreConfig::new(&path)),
            &ConfigureRequest::new(&definitions).with_mode(SyncMode::hard(["welcome"])),
        )
        .unwrap();
    assert_eq!(service.actualize().get("welcome"), Some("Default text"));

    let connection = Connection::open(&path).unwrap();
    let variables: i64 =
        connection.query_row("SELECT COUNT(*) FROM variable", params![], |row| row.get(0)).unwrap();
    assert_eq!(variables, 0);
    connection
        .execute("UPDATE message SET text = ?1 WHERE name = ?2", params!["Edited again", "welcome"])
        .unwrap();
    assert_eq!(service.actualize().get("welcome"), Some("Edited again"));
}

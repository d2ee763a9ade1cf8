// crates/message-catalog-config/tests/load_validation.rs
// ============================================================================
// Module: Config Load Validation Tests
// Description: File loading, environment overrides, and fail-closed validation.
// Purpose: Ensure malformed configs and overrides are rejected.
// Dependencies: message-catalog-config, tempfile
// ============================================================================

//! ## Overview
//! Environment reads go through an injected lookup, so these tests never
//! mutate the process environment.

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

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use message_catalog_config::CatalogConfig;
use message_catalog_config::ConfigError;
use message_catalog_config::StoreConfig;
use message_catalog_core::CatalogService;
use message_catalog_core::RuntimeSettings;
use message_catalog_core::ServiceState;
use message_catalog_store_sqlite::SqliteStoreMode;
use tempfile::TempDir;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Writes `message-catalog.toml` into `dir`.
fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("message-catalog.toml");
    fs::write(&path, content).unwrap();
    path
}

/// Loads `path` with `env` as the only visible environment.
fn load(path: &Path, env: &[(&str, &str)]) -> Result<CatalogConfig, ConfigError> {
    let vars: BTreeMap<String, String> =
        env.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())).collect();
    CatalogConfig::load_with_env(Some(path), &move |name: &str| Ok(vars.get(name).cloned()))
}

/// Environment lookup that sees nothing.
fn no_env(_: &str) -> Result<Option<String>, String> {
    Ok(None)
}

// ============================================================================
// SECTION: Loading
// ============================================================================

#[test]
fn loads_sqlite_backend() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
        [store]
        backend = "sqlite"
        path = "catalog.sqlite3"
        journal_mode = "delete"

        [project]
        name = "bot"
        "#,
    );
    let config = load(&path, &[]).unwrap();
    let StoreConfig::Sqlite(store) = &config.store else {
        panic!("expected sqlite backend");
    };
    assert_eq!(store.path, PathBuf::from("catalog.sqlite3"));
    assert_eq!(store.journal_mode, SqliteStoreMode::Delete);
    assert_eq!(store.busy_timeout_ms, 5_000);
}

#[test]
fn config_path_comes_from_env_when_not_given() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "debug = true");
    let env_path = path.to_string_lossy().into_owned();
    let config = CatalogConfig::load_with_env(None, &move |name: &str| {
        Ok((name == "MESSAGE_CATALOG_CONFIG").then(|| env_path.clone()))
    })
    .unwrap();
    assert!(config.debug);
}

#[test]
fn missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = CatalogConfig::load_with_env(Some(&dir.path().join("absent.toml")), &no_env)
        .unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn rejects_oversized_and_non_utf8_files() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, &format!("# {}\n", "x".repeat(1024 * 1024)));
    assert!(matches!(load(&path, &[]), Err(ConfigError::Invalid(message)) if message.contains("size")));

    fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
    assert!(matches!(load(&path, &[]), Err(ConfigError::Invalid(message)) if message.contains("utf-8")));
}

#[test]
fn rejects_unknown_fields_and_backends() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "verbose = true");
    assert!(matches!(load(&path, &[]), Err(ConfigError::Parse(_))));

    let path = write_config(&dir, "[store]\nbackend = \"mysql\"");
    assert!(matches!(load(&path, &[]), Err(ConfigError::Parse(_))));

    let path = write_config(&dir, "[store]\nbackend = \"sqlite\"\npath = \"a.db\"\nhost = \"x\"");
    assert!(matches!(load(&path, &[]), Err(ConfigError::Parse(_))));
}

// ============================================================================
// SECTION: Validation
// ============================================================================

#[test]
fn rejects_empty_hard_list_entries_and_project_name() {
    assert!(matches!(
        CatalogConfig::from_toml_str("[sync]\nhard_list = [\" \"]"),
        Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
        CatalogConfig::from_toml_str("[project]\nname = \"\""),
        Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
        CatalogConfig::from_toml_str("[definitions]\npath = \"\""),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn rejects_invalid_postgres_settings_unless_offline() {
    let content = "[store]\nbackend = \"postgres\"\nmax_connections = 0";
    let err = CatalogConfig::from_toml_str(content).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(message) if message.contains("max_connections")));

    let offline = CatalogConfig::from_toml_str(&format!("debug = true\n{content}")).unwrap();
    assert!(offline.offline());
}

// ============================================================================
// SECTION: Environment Overrides
// ============================================================================

#[test]
fn debug_override_switches_offline_mode() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "debug = false");
    assert!(load(&path, &[("MESSAGE_CATALOG_DEBUG", "1")]).unwrap().offline());
    assert!(!load(&path, &[("MESSAGE_CATALOG_DEBUG", "false")]).unwrap().offline());

    let err = load(&path, &[("MESSAGE_CATALOG_DEBUG", "maybe")]).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(message) if message.contains("MESSAGE_CATALOG_DEBUG")));
    let err = load(&path, &[("MESSAGE_CATALOG_DEBUG", "  ")]).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(message) if message.contains("must not be empty")));
}

#[test]
fn password_override_applies_to_postgres_only() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[store]\nbackend = \"postgres\"");
    let config = load(&path, &[("MESSAGE_CATALOG_DB_PASSWORD", "s3cret")]).unwrap();
    let StoreConfig::Postgres(store) = &config.store else {
        panic!("expected postgres backend");
    };
    assert_eq!(store.password.as_deref(), Some("s3cret"));

    let path = write_config(&dir, "[store]\nbackend = \"sqlite\"\npath = \"a.db\"");
    let err = load(&path, &[("MESSAGE_CATALOG_DB_PASSWORD", "s3cret")]).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn env_lookup_errors_fail_closed() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");
    let err = CatalogConfig::load_with_env(Some(&path), &|name: &str| {
        if name == "MESSAGE_CATALOG_DEBUG" {
            Err(format!("{name} must be valid UTF-8"))
        } else {
            Ok(None)
        }
    })
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(message) if message.contains("UTF-8")));
}

// ============================================================================
// SECTION: Runtime Settings
// ============================================================================

#[test]
fn sqlite_config_drives_catalog_service() {
    let dir = TempDir::new().unwrap();
    let definitions = dir.path().join("messages.json");
    fs::write(&definitions, r#"{"greeting": "Hello"}"#).unwrap();
    let database = dir.path().join("catalog.sqlite3");
    let path = write_config(
        &dir,
        &format!(
            "[store]\nbackend = \"sqlite\"\npath = {database:?}\n\n[definitions]\npath = \
             {definitions:?}\n\n[project]\nname = \"bot\"\n"
        ),
    );
    let config = load(&path, &[]).unwrap();
    let service = CatalogService::new();

    service.configure(&config, &config, &config.configure_request()).unwrap();

    assert_eq!(service.state(), ServiceState::Configured);
    assert_eq!(service.actualize().get("greeting"), Some("Hello"));
    assert!(database.exists());
}

#[test]
fn debug_config_runs_offline_without_project_name() {
    let dir = TempDir::new().unwrap();
    let definitions = dir.path().join("messages.json");
    fs::write(&definitions, r#"{"greeting": "Hello"}"#).unwrap();
    let path = write_config(
        &dir,
        &format!("debug = true\n\n[store]\nbackend = \"postgres\"\nmax_connections = 0\n\n[definitions]\npath = \
             {definitions:?}\n"),
    );
    let config = load(&path, &[]).unwrap();
    let service = CatalogService::new();

    let report = service.configure(&config, &config, &config.configure_request()).unwrap();

    assert!(report.offline);
    assert_eq!(service.state(), ServiceState::ConfiguredOffline);
    assert_eq!(service.actualize().get("greeting"), Some("Hello"));
}

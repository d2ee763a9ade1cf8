// crates/message-catalog-store-postgres/tests/postgres_store.rs
// ============================================================================
// Module: Postgres Store Tests
// Description: Unit tests for Postgres store configuration and failure paths.
// Purpose: Validate error handling without a live database.
// ============================================================================

//! Postgres store unit tests.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::time::Duration;
use std::time::Instant;

use message_catalog_core::StoreConnector;
use message_catalog_core::StoreError;
use message_catalog_store_postgres::PostgresCatalogStore;
use message_catalog_store_postgres::PostgresStoreConfig;
use message_catalog_store_postgres::PostgresStoreError;

/// Config pointing at a port nothing listens on.
fn unreachable_config() -> PostgresStoreConfig {
    PostgresStoreConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        max_connections: 1,
        connect_timeout_ms: 200,
        connect_attempts: 2,
        retry_backoff_ms: 10,
        ..PostgresStoreConfig::default()
    }
}

#[test]
fn postgres_store_default_config_is_valid_shape() {
    let config = PostgresStoreConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.max_connections > 0);
    assert!(config.connect_timeout_ms > 0);
    assert!(config.statement_timeout_ms > 0);
    assert!(config.connect_attempts > 0);
    assert!(!config.bootstrap_schema);
    config.validate().unwrap();
}

#[test]
fn postgres_store_rejects_zero_pool_size() {
    let config = PostgresStoreConfig {
        max_connections: 0,
        ..PostgresStoreConfig::default()
    };
    let result = PostgresCatalogStore::new(&config);
    assert!(matches!(result, Err(PostgresStoreError::Invalid(_))));
}

#[test]
fn postgres_store_rejects_zero_attempts() {
    let config = PostgresStoreConfig {
        connect_attempts: 0,
        ..PostgresStoreConfig::default()
    };
    assert!(matches!(config.validate(), Err(PostgresStoreError::Invalid(_))));
}

#[test]
fn postgres_store_unreachable_host_fails_after_retries() {
    let started = Instant::now();
    let result = PostgresCatalogStore::new(&unreachable_config());
    let Err(PostgresStoreError::Postgres(message)) = result else {
        panic!("expected postgres error");
    };
    assert!(message.contains("2 attempt"), "{message}");
    assert!(started.elapsed() < Duration::from_secs(30));
}

#[test]
fn postgres_connector_maps_failure_to_unavailable() {
    let err = unreachable_config().connect().err().unwrap();
    assert!(matches!(err, StoreError::Unavailable(_)));
}

#[test]
fn postgres_store_config_serde_roundtrip() {
    let original = PostgresStoreConfig {
        password: Some("secret".to_string()),
        bootstrap_schema: true,
        ..PostgresStoreConfig::default()
    };
    let json = serde_json::to_string(&original).expect("serialize");
    let restored: PostgresStoreConfig = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(original, restored);
}

#[test]
fn postgres_store_config_fills_defaults_and_rejects_unknown_fields() {
    let partial: PostgresStoreConfig =
        serde_json::from_str(r#"{"host": "db.internal", "port": 6543}"#).unwrap();
    assert_eq!(partial.host, "db.internal");
    assert_eq!(partial.port, 6543);
    assert_eq!(partial.database, PostgresStoreConfig::default().database);

    let unknown = serde_json::from_str::<PostgresStoreConfig>(r#"{"hostname": "x"}"#);
    assert!(unknown.is_err());
}

#[test]
fn postgres_store_config_debug_redacts_password() {
    let config = PostgresStoreConfig {
        password: Some("hunter2".to_string()),
        ..PostgresStoreConfig::default()
    };
    let rendered = format!("{config:?}");
    assert!(!rendered.contains("hunter2"));
    assert!(rendered.contains("<redacted>"));
}

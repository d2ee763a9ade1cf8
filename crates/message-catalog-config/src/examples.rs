// crates/message-catalog-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payloads.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: std
// ============================================================================

/// Returns a canonical example `message-catalog.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"debug = false

[store]
backend = "postgres"
host = "localhost"
port = 5432
database = "message_catalog"
user = "message_catalog"
# password comes from MESSAGE_CATALOG_DB_PASSWORD
max_connections = 8
connect_timeout_ms = 5000
statement_timeout_ms = 30000
connect_attempts = 3
retry_backoff_ms = 500
bootstrap_schema = false

[definitions]
path = "messages.json"

[sync]
hard = false
hard_list = []

[project]
name = "support_bot"
"#,
    )
}

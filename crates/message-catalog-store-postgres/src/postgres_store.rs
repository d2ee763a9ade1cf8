// crates/message-catalog-store-postgres/src/postgres_store.rs
// ============================================================================
// Module: Postgres Store
// Description: Postgres-backed project, message, and variable storage.
// Purpose: Provide the shared catalog database for deployed bots.
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::thread;
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
use postgres::NoTls;
use postgres::error::SqlState;
use r2d2::Pool;
use r2d2::PooledConnection;
use r2d2_postgres::PostgresConnectionManager;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use tracing::warn;

/// Upper bound on the backoff multiplier exponent.
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// Postgres store configuration.
///
/// Ids are read and bound as `BIGINT`, so `SERIAL` and `BIGSERIAL` id columns
/// both work.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PostgresStoreConfig {
    /// Database host name or address.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database name.
    pub database: String,
    /// Login role.
    pub user: String,
    /// Login password, if the server requires one.
    pub password: Option<String>,
    /// Maximum pool size.
    pub max_connections: u32,
    /// Connect timeout in milliseconds (per connection and per pool checkout).
    pub connect_timeout_ms: u64,
    /// Statement timeout in milliseconds.
    pub statement_timeout_ms: u64,
    /// Pool build attempts before giving up.
    pub connect_attempts: u32,
    /// Base delay between pool build attempts, doubled after each failure.
    pub retry_backoff_ms: u64,
    /// Create the catalog tables when they are missing.
    pub bootstrap_schema: bool,
}

impl Default for PostgresStoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "message_catalog".to_string(),
            user: "message_catalog".to_string(),
            password: None,
            max_connections: 8,
            connect_timeout_ms: 5_000,
            statement_timeout_ms: 30_000,
            connect_attempts: 3,
            retry_backoff_ms: 500,
            bootstrap_schema: false,
        }
    }
}

impl fmt::Debug for PostgresStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresStoreConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("statement_timeout_ms", &self.statement_timeout_ms)
            .field("connect_attempts", &self.connect_attempts)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("bootstrap_schema", &self.bootstrap_schema)
            .finish()
    }
}

impl PostgresStoreConfig {
    /// Checks pool sizing and retry settings.
    ///
    /// # Errors
    ///
    /// Returns [`PostgresStoreError::Invalid`] when a setting is out of range.
    pub fn validate(&self) -> Result<(), PostgresStoreError> {
        if self.host.trim().is_empty() {
            return Err(PostgresStoreError::Invalid("host must be non-empty".to_string()));
        }
        if self.database.trim().is_empty() || self.user.trim().is_empty() {
            return Err(PostgresStoreError::Invalid(
                "database and user must be non-empty".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(PostgresStoreError::Invalid(
                "max_connections must be greater than zero".to_string(),
            ));
        }
        if self.connect_attempts == 0 {
            return Err(PostgresStoreError::Invalid(
                "connect_attempts must be greater than zero".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(PostgresStoreError::Invalid(
                "connect_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the driver configuration.
    fn driver_config(&self) -> postgres::Config {
        let mut pg_config = postgres::Config::new();
        pg_config.host(&self.host).port(self.port).dbname(&self.database).user(&self.user);
        if let Some(password) = &self.password {
            pg_config.password(password);
        }
        pg_config.connect_timeout(Duration::from_millis(self.connect_timeout_ms));
        let options = format!("-c statement_timeout={}", self.statement_timeout_ms);
        pg_config.options(&options);
        pg_config
    }

    /// Returns the delay after failed attempt number `attempt` (1-based).
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(1_u64 << exponent))
    }
}

impl StoreConnector for PostgresStoreConfig {
    fn connect(&self) -> Result<Arc<DynCatalogStore>, StoreError> {
        let store = PostgresCatalogStore::new(self)?;
        Ok(Arc::new(store))
    }
}

/// Postgres store errors.
#[derive(Debug, Error)]
pub enum PostgresStoreError {
    /// Postgres error.
    #[error("postgres store error: {0}")]
    Postgres(String),
    /// Unique or foreign key constraint rejected the statement.
    #[error("postgres store conflict: {0}")]
    Conflict(String),
    /// Invalid configuration or data.
    #[error("postgres store invalid data: {0}")]
    Invalid(String),
}

impl From<postgres::Error> for PostgresStoreError {
    fn from(err: postgres::Error) -> Self {
        match err.code() {
            Some(code)
                if *code == SqlState::UNIQUE_VIOLATION
                    || *code == SqlState::FOREIGN_KEY_VIOLATION =>
            {
                Self::Conflict(err.to_string())
            }
            _ => Self::Postgres(err.to_string()),
        }
    }
}

impl From<PostgresStoreError> for StoreError {
    fn from(error: PostgresStoreError) -> Self {
        match error {
            PostgresStoreError::Postgres(_) => Self::Unavailable(error.to_string()),
            PostgresStoreError::Conflict(message) => Self::Conflict(message),
            PostgresStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Pooled Postgres connection.
type PgConnection = PooledConnection<PostgresConnectionManager<NoTls>>;

/// Postgres-backed catalog store.
pub struct PostgresCatalogStore {
    /// Connection pool for Postgres access.
    pool: Option<Pool<PostgresConnectionManager<NoTls>>>,
}

impl Drop for PostgresCatalogStore {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            let _ = thread::spawn(move || drop(pool));
        }
    }
}

impl PostgresCatalogStore {
    /// Builds the connection pool, retrying with backoff, and optionally
    /// creates the schema.
    ///
    /// # Errors
    ///
    /// Returns [`PostgresStoreError`] when the config is invalid or the pool
    /// cannot be built within `connect_attempts`.
    pub fn new(config: &PostgresStoreConfig) -> Result<Self, PostgresStoreError> {
        config.validate()?;
        let pg_config = config.driver_config();
        let mut attempt = 1;
        let pool = loop {
            let manager = PostgresConnectionManager::new(pg_config.clone(), NoTls);
            match Pool::builder()
                .max_size(config.max_connections)
                .connection_timeout(Duration::from_millis(config.connect_timeout_ms))
                .build(manager)
            {
                Ok(pool) => break pool,
                Err(err) if attempt < config.connect_attempts => {
                    let delay = config.backoff(attempt);
                    warn!(
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "postgres pool build failed; retrying"
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => {
                    return Err(PostgresStoreError::Postgres(format!(
                        "pool build failed after {attempt} attempt(s): {err}"
                    )));
                }
            }
        };
        let store = Self {
            pool: Some(pool),
        };
        if config.bootstrap_schema {
            store.migrate()?;
        }
        info!(host = %config.host, database = %config.database, "postgres catalog store ready");
        Ok(store)
    }

    /// Checks out a pooled connection.
    fn conn(&self) -> Result<PgConnection, PostgresStoreError> {
        self.pool
            .as_ref()
            .ok_or_else(|| PostgresStoreError::Postgres("postgres store closed".to_string()))?
            .get()
            .map_err(|err| PostgresStoreError::Postgres(err.to_string()))
    }

    /// Ensures the catalog tables exist.
    fn migrate(&self) -> Result<(), PostgresStoreError> {
        let mut conn = self.conn()?;
        conn.batch_execute(
            "CREATE TABLE IF NOT EXISTS project (id SERIAL PRIMARY KEY,name TEXT NOT NULL \
             UNIQUE);CREATE TABLE IF NOT EXISTS message (id SERIAL PRIMARY KEY,name TEXT NOT \
             NULL,text TEXT NOT NULL,project_id INTEGER NOT NULL REFERENCES project(id),UNIQUE \
             (name, project_id));CREATE TABLE IF NOT EXISTS variable (id SERIAL PRIMARY KEY,name \
             TEXT NOT NULL,description TEXT NOT NULL,message_id INTEGER NOT NULL REFERENCES \
             message(id),UNIQUE (name, message_id));",
        )?;
        Ok(())
    }

    /// Upserts the project row and returns its id.
    fn resolve_project_row(&self, name: &ProjectName) -> Result<ProjectId, PostgresStoreError> {
        let mut conn = self.conn()?;
        let row = conn.query_one(
            "INSERT INTO project (name) VALUES ($1) ON CONFLICT (name) DO UPDATE SET name = \
             EXCLUDED.name RETURNING id::BIGINT",
            &[&name.as_str()],
        )?;
        Ok(ProjectId::new(row.get(0)))
    }

    /// Looks up a project id without inserting.
    fn find_project_row(
        &self,
        name: &ProjectName,
    ) -> Result<Option<ProjectId>, PostgresStoreError> {
        let mut conn = self.conn()?;
        let row =
            conn.query_opt("SELECT id::BIGINT FROM project WHERE name = $1", &[&name.as_str()])?;
        Ok(row.map(|row| ProjectId::new(row.get(0))))
    }

    /// Reads every message of a project.
    fn list_message_rows(
        &self,
        project: ProjectId,
    ) -> Result<BTreeMap<MessageName, String>, PostgresStoreError> {
        let mut conn = self.conn()?;
        let rows = conn.query(
            "SELECT name, text FROM message WHERE project_id = $1::BIGINT",
            &[&project.get()],
        )?;
        let mut messages = BTreeMap::new();
        for row in rows {
            let name: String = row.try_get(0)?;
            let text: String = row.try_get(1)?;
            messages.insert(MessageName::new(name), text);
        }
        Ok(messages)
    }

    /// Looks up a message id.
    fn find_message_row(
        &self,
        name: &MessageName,
        project: ProjectId,
    ) -> Result<Option<MessageId>, PostgresStoreError> {
        let mut conn = self.conn()?;
        let row = conn.query_opt(
            "SELECT id::BIGINT FROM message WHERE name = $1 AND project_id = $2::BIGINT",
            &[&name.as_str(), &project.get()],
        )?;
        Ok(row.map(|row| MessageId::new(row.get(0))))
    }

    /// Lists the variables of a message.
    fn list_variable_rows(
        &self,
        message: MessageId,
    ) -> Result<BTreeMap<String, VariableId>, PostgresStoreError> {
        let mut conn = self.conn()?;
        let rows = conn.query(
            "SELECT name, id::BIGINT FROM variable WHERE message_id = $1::BIGINT",
            &[&message.get()],
        )?;
        let mut variables = BTreeMap::new();
        for row in rows {
            let name: String = row.try_get(0)?;
            let id: i64 = row.try_get(1)?;
            variables.insert(name, VariableId::new(id));
        }
        Ok(variables)
    }

    /// Executes a statement returning a single id.
    fn insert_row(
        &self,
        sql: &str,
        params: &[&(dyn postgres::types::ToSql + Sync)],
    ) -> Result<i64, PostgresStoreError> {
        let mut conn = self.conn()?;
        let row = conn.query_one(sql, params)?;
        Ok(row.try_get(0)?)
    }

    /// Executes a delete by id.
    fn delete_row(&self, sql: &str, id: i64) -> Result<(), PostgresStoreError> {
        let mut conn = self.conn()?;
        conn.execute(sql, &[&id])?;
        Ok(())
    }
}

impl CatalogStore for PostgresCatalogStore {
    fn resolve_project(&self, name: &ProjectName) -> Result<ProjectId, StoreError> {
        Ok(self.resolve_project_row(name)?)
    }

    fn find_project(&self, name: &ProjectName) -> Result<Option<ProjectId>, StoreError> {
        Ok(self.find_project_row(name)?)
    }

    fn list_messages(
        &self,
        project: ProjectId,
    ) -> Result<BTreeMap<MessageName, String>, StoreError> {
        Ok(self.list_message_rows(project)?)
    }

    fn find_message_id(
        &self,
        name: &MessageName,
        project: ProjectId,
    ) -> Result<Option<MessageId>, StoreError> {
        Ok(self.find_message_row(name, project)?)
    }

    fn list_variable_ids(
        &self,
        message: MessageId,
    ) -> Result<BTreeMap<String, VariableId>, StoreError> {
        Ok(self.list_variable_rows(message)?)
    }

    fn delete_variable(&self, id: VariableId) -> Result<(), StoreError> {
        Ok(self.delete_row("DELETE FROM variable WHERE id = $1::BIGINT", id.get())?)
    }

    fn delete_message(&self, id: MessageId) -> Result<(), StoreError> {
        Ok(self.delete_row("DELETE FROM message WHERE id = $1::BIGINT", id.get())?)
    }

    fn insert_message(
        &self,
        name: &MessageName,
        text: &str,
        project: ProjectId,
    ) -> Result<MessageId, StoreError> {
        let id = self.insert_row(
            "INSERT INTO message (name, text, project_id) VALUES ($1, $2, $3::BIGINT) RETURNING \
             id::BIGINT",
            &[&name.as_str(), &text, &project.get()],
        )?;
        Ok(MessageId::new(id))
    }

    fn insert_variable(
        &self,
        name: &str,
        description: &str,
        message: MessageId,
    ) -> Result<VariableId, StoreError> {
        let id = self.insert_row(
            "INSERT INTO variable (name, description, message_id) VALUES ($1, $2, $3::BIGINT) \
             RETURNING id::BIGINT",
            &[&name, &description, &message.get()],
        )?;
        Ok(VariableId::new(id))
    }

    fn readiness(&self) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        conn.batch_execute("SELECT 1").map_err(PostgresStoreError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::PostgresStoreConfig;

    #[test]
    fn backoff_doubles_and_saturates() {
        let config = PostgresStoreConfig {
            retry_backoff_ms: 100,
            ..PostgresStoreConfig::default()
        };
        assert_eq!(config.backoff(1).as_millis(), 100);
        assert_eq!(config.backoff(2).as_millis(), 200);
        assert_eq!(config.backoff(3).as_millis(), 400);
        assert_eq!(config.backoff(50).as_millis(), 6_400);
    }

    #[test]
    fn driver_config_carries_connection_settings() {
        let config = PostgresStoreConfig {
            password: Some("secret".to_string()),
            ..PostgresStoreConfig::default()
        };
        let driver = config.driver_config();
        assert_eq!(driver.get_dbname(), Some("message_catalog"));
        assert_eq!(driver.get_user(), Some("message_catalog"));
        assert_eq!(driver.get_ports(), &[5432]);
        assert_eq!(driver.get_password(), Some(b"secret".as_slice()));
        assert_eq!(driver.get_options(), Some("-c statement_timeout=30000"));
    }
}

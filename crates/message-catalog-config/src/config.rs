// crates/message-catalog-config/src/config.rs
// ============================================================================
// Module: Message Catalog Configuration
// Description: Configuration loading and validation for the message catalog.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: message-catalog-core, message-catalog-store-*, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits,
//! then environment overrides are applied and the result is validated. The
//! loaded config doubles as the catalog's [`RuntimeSettings`]: `debug = true`
//! selects offline mode and `[store]` supplies the connector.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use message_catalog_core::ConfigureRequest;
use message_catalog_core::DynCatalogStore;
use message_catalog_core::IdentityError;
use message_catalog_core::IdentityResolver;
use message_catalog_core::MessageName;
use message_catalog_core::ProjectName;
use message_catalog_core::RuntimeSettings;
use message_catalog_core::StoreConnector;
use message_catalog_core::StoreError;
use message_catalog_core::SyncMode;
use message_catalog_store_postgres::PostgresStoreConfig;
use message_catalog_store_sqlite::SqliteStoreConfig;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::env::CatalogEnv;
use crate::env::nonempty;
use crate::env::parse_bool;
use crate::env::read_env_strict;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "message-catalog.toml";
/// Default definitions document path.
const DEFAULT_DEFINITIONS_PATH: &str = "messages.json";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of hard-list entries.
pub(crate) const MAX_HARD_LIST_ENTRIES: usize = 4096;

/// Environment lookup used for overrides; returns `Ok(None)` when unset.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Result<Option<String>, String>;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Message catalog configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Serve local definitions only; never contact the store.
    #[serde(default)]
    pub debug: bool,
    /// Persistent store backend.
    #[serde(default)]
    pub store: StoreConfig,
    /// Local definitions document.
    #[serde(default)]
    pub definitions: DefinitionsConfig,
    /// Reconciliation policy.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Serving identity.
    #[serde(default)]
    pub project: ProjectConfig,
}

/// Persistent store backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Shared Postgres database.
    Postgres(PostgresStoreConfig),
    /// Local `SQLite` file.
    Sqlite(SqliteStoreConfig),
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Postgres(PostgresStoreConfig::default())
    }
}

impl StoreConfig {
    /// Returns the backend label.
    #[must_use]
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Sqlite(_) => "sqlite",
        }
    }

    /// Validates backend-specific settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Postgres(config) => {
                config.validate().map_err(|err| ConfigError::Invalid(format!("store: {err}")))
            }
            Self::Sqlite(config) => {
                validate_path_string("store.path", &config.path.to_string_lossy())?;
                if config.busy_timeout_ms == 0 {
                    return Err(ConfigError::Invalid(
                        "store.busy_timeout_ms must be greater than zero".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

impl StoreConnector for StoreConfig {
    fn connect(&self) -> Result<Arc<DynCatalogStore>, StoreError> {
        match self {
            Self::Postgres(config) => config.connect(),
            Self::Sqlite(config) => config.connect(),
        }
    }
}

/// Local definitions document settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefinitionsConfig {
    /// Path to the definitions JSON document.
    #[serde(default = "default_definitions_path")]
    pub path: PathBuf,
}

impl Default for DefinitionsConfig {
    fn default() -> Self {
        Self {
            path: default_definitions_path(),
        }
    }
}

/// Returns the default definitions path.
fn default_definitions_path() -> PathBuf {
    PathBuf::from(DEFAULT_DEFINITIONS_PATH)
}

/// Reconciliation policy settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Allow force-overwrite of hard-listed names.
    #[serde(default)]
    pub hard: bool,
    /// Names to force-overwrite (hard mode) or retire (any mode).
    #[serde(default)]
    pub hard_list: Vec<String>,
}

impl SyncConfig {
    /// Returns the reconciliation mode.
    #[must_use]
    pub fn mode(&self) -> SyncMode {
        SyncMode {
            hard: self.hard,
            hard_list: self.hard_list.iter().map(|name| MessageName::new(name.as_str())).collect(),
        }
    }

    /// Validates hard-list entries.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.hard_list.len() > MAX_HARD_LIST_ENTRIES {
            return Err(ConfigError::Invalid("sync.hard_list has too many entries".to_string()));
        }
        if self.hard_list.iter().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "sync.hard_list entries must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Serving identity settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Project name the catalog is stored under.
    #[serde(default)]
    pub name: Option<String>,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl CatalogConfig {
    /// Loads configuration from disk using the default resolution rules and
    /// the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, &read_env_strict)
    }

    /// Loads configuration using `lookup` for every environment read.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_with_env(path: Option<&Path>, lookup: EnvLookup<'_>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path, lookup)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", resolved.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::parse(content)?;
        config.apply_env_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates configuration from TOML text without env overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config = Self::parse(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses TOML text.
    fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Applies `MESSAGE_CATALOG_DEBUG` and `MESSAGE_CATALOG_DB_PASSWORD`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when an override is malformed.
    pub fn apply_env_overrides(&mut self, lookup: EnvLookup<'_>) -> Result<(), ConfigError> {
        let debug_key = CatalogEnv::Debug.as_str();
        if let Some(raw) = read_override(debug_key, lookup)? {
            self.debug = parse_bool(debug_key, &raw).map_err(ConfigError::Invalid)?;
        }
        let password_key = CatalogEnv::DbPassword.as_str();
        if let Some(password) = read_override(password_key, lookup)? {
            match &mut self.store {
                StoreConfig::Postgres(config) => config.password = Some(password),
                StoreConfig::Sqlite(_) => {
                    return Err(ConfigError::Invalid(format!(
                        "{password_key} is only valid with the postgres backend"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("definitions.path", &self.definitions.path.to_string_lossy())?;
        self.sync.validate()?;
        if let Some(name) = &self.project.name
            && name.trim().is_empty()
        {
            return Err(ConfigError::Invalid("project.name must be non-empty".to_string()));
        }
        if !self.debug {
            self.store.validate()?;
        }
        Ok(())
    }

    /// Builds the configuration request for the catalog service.
    #[must_use]
    pub fn configure_request(&self) -> ConfigureRequest {
        ConfigureRequest::new(&self.definitions.path).with_mode(self.sync.mode())
    }
}

impl IdentityResolver for CatalogConfig {
    fn resolve_identity(&self) -> Result<ProjectName, IdentityError> {
        match self.project.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(ProjectName::new(name)),
            _ => Err(IdentityError("project.name is not configured".to_string())),
        }
    }
}

impl RuntimeSettings for CatalogConfig {
    fn offline(&self) -> bool {
        self.debug
    }

    fn connector(&self) -> &dyn StoreConnector {
        &self.store
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads one non-empty override value.
fn read_override(name: &str, lookup: EnvLookup<'_>) -> Result<Option<String>, ConfigError> {
    lookup(name).and_then(|value| nonempty(name, value)).map_err(ConfigError::Invalid)
}

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>, lookup: EnvLookup<'_>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Some(env_path) = read_override(CatalogEnv::ConfigPath.as_str(), lookup)? {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    let path = Path::new(trimmed);
    for component in path.components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

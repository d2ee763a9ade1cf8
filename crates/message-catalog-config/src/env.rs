// crates/message-catalog-config/src/env.rs
// ============================================================================
// Module: Catalog Environment
// Description: Environment variable names and strict value parsing.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8, empty values, and unrecognized booleans
//! fail closed.

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys recognized by the catalog configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogEnv {
    /// Config file path override.
    ConfigPath,
    /// Offline mode override (`true`/`false` or `1`/`0`).
    Debug,
    /// Postgres password override.
    DbPassword,
}

impl CatalogEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigPath => "MESSAGE_CATALOG_CONFIG",
            Self::Debug => "MESSAGE_CATALOG_DEBUG",
            Self::DbPassword => "MESSAGE_CATALOG_DB_PASSWORD",
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Rejects values that are set but empty or whitespace.
pub(crate) fn nonempty(name: &str, value: Option<String>) -> Result<Option<String>, String> {
    match value {
        Some(value) if value.trim().is_empty() => Err(format!("{name} must not be empty")),
        other => Ok(other),
    }
}

/// Parses a boolean flag value.
pub(crate) fn parse_bool(name: &str, raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(format!("{name} must be true/false or 1/0")),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_bool;

    #[test]
    fn parse_bool_accepts_words_and_digits() {
        assert_eq!(parse_bool("X", "TRUE"), Ok(true));
        assert_eq!(parse_bool("X", " 0 "), Ok(false));
        assert!(parse_bool("X", "yes").is_err());
    }
}

// crates/message-catalog-core/src/core/definitions.rs
// ============================================================================
// Module: Local Message Definitions
// Description: Typed model and loader for the locally authored definitions document.
// Purpose: Parse message templates and declared variables with strict, fail-closed checks.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The definitions document is a JSON object mapping message names to either
//! a plain text string or a structured form:
//!
//! ```json
//! {
//!   "welcome": "Hello!",
//!   "help": {
//!     "text": "Need help? Use {cmd}",
//!     "variables": [{ "name": "cmd", "description": "command name" }]
//!   }
//! }
//! ```
//!
//! Declared order is preserved because reconciliation inserts messages in the
//! order they were authored. Duplicate message names, duplicate variable
//! names, and unknown fields are rejected rather than silently collapsed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::MapAccess;
use serde::de::Visitor;
use thiserror::Error;

use crate::core::identifiers::MessageName;
use crate::core::snapshot::CatalogSnapshot;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum definitions document size in bytes.
pub const MAX_DEFINITIONS_FILE_SIZE: usize = 4 * 1024 * 1024;
/// Maximum total path length accepted for the definitions document.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Definitions loading errors.
///
/// # Invariants
/// - Error messages never embed message text bodies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionsError {
    /// The document could not be read.
    #[error("definitions io error: {0}")]
    Io(String),
    /// The document is not valid JSON of the expected shape.
    #[error("definitions parse error: {0}")]
    Parse(String),
    /// The document parsed but violates a definitions invariant.
    #[error("invalid definitions: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Definition Types
// ============================================================================

/// Declared placeholder attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableDefinition {
    /// Placeholder name.
    pub name: String,
    /// Human-readable description for catalog editors.
    pub description: String,
}

impl VariableDefinition {
    /// Creates a variable definition.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Structured message form carrying declared variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructuredMessage {
    /// Template text.
    pub text: String,
    /// Declared variables in authored order.
    #[serde(default)]
    pub variables: Vec<VariableDefinition>,
}

/// One locally authored message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageDefinition {
    /// Text with no declared variables.
    Plain(String),
    /// Text with declared variables.
    Structured(StructuredMessage),
}

impl MessageDefinition {
    /// Returns the template text.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(text) => text,
            Self::Structured(message) => &message.text,
        }
    }

    /// Returns the declared variables (empty for plain messages).
    #[must_use]
    pub fn variables(&self) -> &[VariableDefinition] {
        match self {
            Self::Plain(_) => &[],
            Self::Structured(message) => &message.variables,
        }
    }
}

impl From<&str> for MessageDefinition {
    fn from(value: &str) -> Self {
        Self::Plain(value.to_string())
    }
}

impl From<StructuredMessage> for MessageDefinition {
    fn from(value: StructuredMessage) -> Self {
        Self::Structured(value)
    }
}

// ============================================================================
// SECTION: Definitions Document
// ============================================================================

/// Ordered collection of local message definitions.
///
/// # Invariants
/// - Names are unique and non-empty.
/// - Variable names are unique and non-empty within each message.
/// - Iteration follows the authored order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Definitions {
    /// Entries in authored order.
    entries: Vec<(MessageName, MessageDefinition)>,
}

impl Definitions {
    /// Loads and validates a definitions document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionsError`] when the path is unsafe, the file is
    /// missing, oversized, not UTF-8, malformed, or violates an invariant.
    pub fn load(path: &Path) -> Result<Self, DefinitionsError> {
        validate_path(path)?;
        let bytes = fs::read(path)
            .map_err(|err| DefinitionsError::Io(format!("{}: {err}", path.display())))?;
        if bytes.len() > MAX_DEFINITIONS_FILE_SIZE {
            return Err(DefinitionsError::Invalid(
                "definitions file exceeds size limit".to_string(),
            ));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| DefinitionsError::Invalid("definitions file must be utf-8".to_string()))?;
        Self::from_json_str(content)
    }

    /// Parses and validates a definitions document from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionsError`] when the document is malformed or violates
    /// an invariant.
    pub fn from_json_str(content: &str) -> Result<Self, DefinitionsError> {
        let definitions: Self = serde_json::from_str(content)
            .map_err(|err| DefinitionsError::Parse(err.to_string()))?;
        definitions.validate()?;
        Ok(definitions)
    }

    /// Builds validated definitions from name/definition pairs.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionsError::Invalid`] on duplicate or empty names.
    pub fn from_entries<I, N, M>(entries: I) -> Result<Self, DefinitionsError>
    where
        I: IntoIterator<Item = (N, M)>,
        N: Into<MessageName>,
        M: Into<MessageDefinition>,
    {
        let definitions = Self {
            entries: entries.into_iter().map(|(name, def)| (name.into(), def.into())).collect(),
        };
        definitions.validate()?;
        Ok(definitions)
    }

    /// Checks name uniqueness and non-emptiness.
    fn validate(&self) -> Result<(), DefinitionsError> {
        let mut names = BTreeSet::new();
        for (name, definition) in &self.entries {
            if name.as_str().trim().is_empty() {
                return Err(DefinitionsError::Invalid("message name must be non-empty".to_string()));
            }
            if !names.insert(name.as_str()) {
                return Err(DefinitionsError::Invalid(format!("duplicate message name: {name}")));
            }
            let mut variables = BTreeSet::new();
            for variable in definition.variables() {
                if variable.name.trim().is_empty() {
                    return Err(DefinitionsError::Invalid(format!(
                        "message {name} declares a variable with an empty name"
                    )));
                }
                if !variables.insert(variable.name.as_str()) {
                    return Err(DefinitionsError::Invalid(format!(
                        "message {name} declares variable {} more than once",
                        variable.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Returns the definition for `name`, if declared.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MessageDefinition> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate.as_str() == name)
            .map(|(_, definition)| definition)
    }

    /// Returns true when `name` is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates over definitions in authored order.
    pub fn iter(&self) -> impl Iterator<Item = (&MessageName, &MessageDefinition)> {
        self.entries.iter().map(|(name, definition)| (name, definition))
    }

    /// Returns the number of declared messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no messages are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the texts as a snapshot, dropping variable declarations.
    #[must_use]
    pub fn to_snapshot(&self) -> CatalogSnapshot {
        self.entries
            .iter()
            .map(|(name, definition)| (name.clone(), definition.text().to_string()))
            .collect()
    }
}

impl Serialize for Definitions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(name, definition)| (name, definition)))
    }
}

impl<'de> Deserialize<'de> for Definitions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(DefinitionsVisitor)
    }
}

/// Order-preserving map visitor for [`Definitions`].
struct DefinitionsVisitor;

impl<'de> Visitor<'de> for DefinitionsVisitor {
    type Value = Definitions;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of message names to text or {text, variables}")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        let mut seen = BTreeSet::new();
        while let Some(name) = map.next_key::<String>()? {
            if !seen.insert(name.clone()) {
                return Err(serde::de::Error::custom(format!("duplicate message name: {name}")));
            }
            let definition = map.next_value::<MessageDefinition>()?;
            entries.push((MessageName::new(name), definition));
        }
        Ok(Definitions {
            entries,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates the definitions path against length limits.
fn validate_path(path: &Path) -> Result<(), DefinitionsError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(DefinitionsError::Invalid("definitions path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(DefinitionsError::Invalid(
                "definitions path component too long".to_string(),
            ));
        }
    }
    Ok(())
}

// crates/message-catalog-core/src/core/mod.rs
// ============================================================================
// Module: Message Catalog Core Types
// Description: Identifiers, snapshots, and local definitions.
// Purpose: Provide stable, serializable types shared by every catalog backend.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Core types describe what a catalog is (names, texts, declared variables)
//! independently of where it is persisted or how it is served.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod definitions;
pub mod identifiers;
pub mod snapshot;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use definitions::Definitions;
pub use definitions::DefinitionsError;
pub use definitions::MAX_DEFINITIONS_FILE_SIZE;
pub use definitions::MessageDefinition;
pub use definitions::StructuredMessage;
pub use definitions::VariableDefinition;
pub use identifiers::MessageId;
pub use identifiers::MessageName;
pub use identifiers::ProjectId;
pub use identifiers::ProjectName;
pub use identifiers::VariableId;
pub use snapshot::CatalogSnapshot;
pub use snapshot::MissingMessage;

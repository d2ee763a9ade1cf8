// crates/message-catalog-config/src/lib.rs
// ============================================================================
// Module: Message Catalog Config Library
// Description: Canonical config model, environment overrides, and validation.
// Purpose: Single source of truth for message-catalog.toml semantics.
// Dependencies: message-catalog-core, serde, toml
// ============================================================================

//! ## Overview
//! `message-catalog-config` defines the configuration model for the message
//! catalog: which store to use, where the local definitions live, how to
//! reconcile, and which project to serve. Loading is strict and fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Configuration model, loading, and validation.
pub mod config;
/// Environment variable names and strict readers.
pub mod env;
/// Canonical example configuration.
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use env::CatalogEnv;
pub use env::read_env_strict;
pub use examples::config_toml_example;

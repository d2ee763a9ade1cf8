// crates/message-catalog-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Catalog Store
// Description: Durable CatalogStore backend using SQLite.
// Purpose: Persist projects, messages, and variables in a local database file.
// Dependencies: message-catalog-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`CatalogStore`] for single-host
//! deployments and tests that need real SQL constraints. The schema mirrors
//! the shared Postgres layout: `project`, `message`, and `variable` tables
//! with per-parent uniqueness and foreign keys.
//!
//! [`CatalogStore`]: message_catalog_core::CatalogStore

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteCatalogStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;

// crates/message-catalog-store-postgres/src/lib.rs
// ============================================================================
// Module: Postgres Catalog Store
// Description: Shared CatalogStore backend using Postgres.
// Purpose: Let catalog editors and every bot instance share one database.
// Dependencies: message-catalog-core, postgres, r2d2, r2d2_postgres
// ============================================================================

//! Postgres-backed catalog storage with a long-lived connection pool.

/// Postgres-backed catalog store and pool configuration.
pub mod postgres_store;

pub use postgres_store::PostgresCatalogStore;
pub use postgres_store::PostgresStoreConfig;
pub use postgres_store::PostgresStoreError;

// crates/message-catalog-core/src/runtime/mod.rs
// ============================================================================
// Module: Message Catalog Runtime
// Description: Reconciliation, the catalog service, and host integration.
// Purpose: Synchronize local definitions and serve the catalog per request.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules reconcile local definitions with the store, keep the
//! fallback/live snapshot pair, and inject the catalog into host events.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod host;
pub mod identity;
pub mod reconcile;
pub mod service;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use host::CatalogMiddleware;
pub use host::EventContext;
pub use host::EventKind;
pub use identity::StaticIdentity;
pub use reconcile::PlannedMessage;
pub use reconcile::SyncMode;
pub use reconcile::SyncPlan;
pub use reconcile::reconcile;
pub use service::CatalogError;
pub use service::CatalogService;
pub use service::ConfigureRequest;
pub use service::ServiceState;
pub use service::SyncReport;
pub use store::InMemoryCatalogStore;
pub use store::SharedCatalogStore;

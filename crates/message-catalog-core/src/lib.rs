// crates/message-catalog-core/src/lib.rs
// ============================================================================
// Module: Message Catalog Core Library
// Description: Public API surface for the message catalog core.
// Purpose: Expose catalog types, store interfaces, and the catalog service.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! The message catalog keeps user-facing texts in a shared store so editors
//! can change them without a redeploy, while local definitions seed new
//! messages. Configuration reconciles the two once at startup; afterwards
//! every inbound event receives a fresh catalog, degrading to the last
//! known-good copy when the store is unreachable. Store backends plug in
//! through [`CatalogStore`] and [`StoreConnector`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::CatalogStore;
pub use interfaces::DynCatalogStore;
pub use interfaces::IdentityError;
pub use interfaces::IdentityResolver;
pub use interfaces::RuntimeSettings;
pub use interfaces::StoreConnector;
pub use interfaces::StoreError;
pub use runtime::CatalogError;
pub use runtime::CatalogMiddleware;
pub use runtime::CatalogService;
pub use runtime::ConfigureRequest;
pub use runtime::EventContext;
pub use runtime::EventKind;
pub use runtime::InMemoryCatalogStore;
pub use runtime::PlannedMessage;
pub use runtime::ServiceState;
pub use runtime::SharedCatalogStore;
pub use runtime::StaticIdentity;
pub use runtime::SyncMode;
pub use runtime::SyncPlan;
pub use runtime::SyncReport;
pub use runtime::reconcile;

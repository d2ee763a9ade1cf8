// crates/message-catalog-core/src/runtime/service.rs
// ============================================================================
// Module: Catalog Service
// Description: Configuration and per-request retrieval of the message catalog.
// Purpose: Own the fallback/live snapshot pair and the degradation policy.
// Dependencies: crate::{core, interfaces, runtime}, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`CatalogService`] is configured once, then serves the catalog on every
//! inbound event:
//!
//! ```text
//! Unconfigured --configure--> Configuring --ok--> Configured | ConfiguredOffline
//!                                  |
//!                                  +--err--> Failed (reported as Unconfigured)
//! ```
//!
//! Configuration is attempted at most once; a failed attempt is not retried
//! and the service keeps serving the empty fallback snapshot.
//!
//! Snapshots are shared as `Arc<CatalogSnapshot>`. The snapshot lock is held
//! only to clone or swap pointers, never across a store round trip, so a slow
//! store cannot block readers. A failed refresh returns the fallback snapshot
//! and leaves both snapshots untouched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::core::CatalogSnapshot;
use crate::core::Definitions;
use crate::core::DefinitionsError;
use crate::core::MessageName;
use crate::core::ProjectId;
use crate::core::ProjectName;
use crate::interfaces::CatalogStore;
use crate::interfaces::IdentityError;
use crate::interfaces::IdentityResolver;
use crate::interfaces::RuntimeSettings;
use crate::interfaces::StoreConnector;
use crate::interfaces::StoreError;
use crate::runtime::reconcile::SyncMode;
use crate::runtime::reconcile::SyncPlan;
use crate::runtime::reconcile::reconcile;
use crate::runtime::store::SharedCatalogStore;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Catalog service errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Definitions or identity could not be loaded, or the lifecycle was violated.
    #[error("catalog configuration error: {0}")]
    Configuration(String),
    /// The persistent store failed during configuration.
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}

impl From<DefinitionsError> for CatalogError {
    fn from(error: DefinitionsError) -> Self {
        Self::Configuration(error.to_string())
    }
}

impl From<IdentityError> for CatalogError {
    fn from(error: IdentityError) -> Self {
        Self::Configuration(error.to_string())
    }
}

/// Internal signal selecting the pre-configuration fallback path.
#[derive(Debug, Clone, Copy, Error)]
#[error("catalog service is not configured")]
pub(crate) struct CatalogNotConfigured;

// ============================================================================
// SECTION: Requests and Reports
// ============================================================================

/// Externally visible lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    /// `configure` has not run (or failed).
    Unconfigured,
    /// `configure` is running.
    Configuring,
    /// Configured against the persistent store.
    Configured,
    /// Configured from local definitions only.
    ConfiguredOffline,
}

/// Inputs for one configuration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureRequest {
    /// Path to the local definitions document.
    pub definitions_path: PathBuf,
    /// Reconciliation policy.
    pub mode: SyncMode,
}

impl ConfigureRequest {
    /// Creates a soft-mode request for the given definitions document.
    #[must_use]
    pub fn new(definitions_path: impl Into<PathBuf>) -> Self {
        Self {
            definitions_path: definitions_path.into(),
            mode: SyncMode::soft(),
        }
    }

    /// Replaces the reconciliation policy.
    #[must_use]
    pub fn with_mode(mut self, mode: SyncMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Summary of what a configuration run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// True when configured from local definitions only.
    pub offline: bool,
    /// Resolved project name (online only).
    pub project: Option<ProjectName>,
    /// Resolved project id (online only).
    pub project_id: Option<ProjectId>,
    /// Names inserted fresh.
    pub inserted: Vec<MessageName>,
    /// Names whose existing message was replaced.
    pub replaced: Vec<MessageName>,
    /// Names whose message was deleted.
    pub retired: Vec<MessageName>,
    /// Names left untouched because the store already had them.
    pub preserved: Vec<MessageName>,
    /// Number of entries in the resulting snapshot.
    pub catalog_size: usize,
}

// ============================================================================
// SECTION: Internal State
// ============================================================================

/// Store handle bound at configuration time.
#[derive(Clone)]
struct StoreBinding {
    /// Long-lived store connection.
    store: SharedCatalogStore,
    /// Project owning the catalog.
    project: ProjectId,
}

/// Lifecycle phase.
enum Phase {
    /// Not configured.
    Unconfigured,
    /// Configuration in progress.
    Configuring,
    /// Configuration failed; further attempts are rejected.
    Failed,
    /// Configured against the store.
    Online(StoreBinding),
    /// Configured from local definitions only.
    Offline,
}

impl Phase {
    /// Returns the public state label.
    const fn state(&self) -> ServiceState {
        match self {
            Self::Unconfigured | Self::Failed => ServiceState::Unconfigured,
            Self::Configuring => ServiceState::Configuring,
            Self::Online(_) => ServiceState::Configured,
            Self::Offline => ServiceState::ConfiguredOffline,
        }
    }
}

/// Fallback and live snapshots, swapped together under one lock.
#[derive(Default)]
struct SnapshotPair {
    /// Best-known-good catalog.
    fallback: Arc<CatalogSnapshot>,
    /// Catalog as of the most recent successful refresh.
    live: Arc<CatalogSnapshot>,
}

/// Result of a configuration run before it is installed.
struct Prepared {
    /// Phase to enter.
    phase: Phase,
    /// Snapshot seeding both fallback and live.
    snapshot: CatalogSnapshot,
    /// Report returned to the caller.
    report: SyncReport,
}

/// Store writes performed while applying a plan.
#[derive(Default)]
struct AppliedPlan {
    /// Names inserted fresh.
    inserted: Vec<MessageName>,
    /// Names replaced.
    replaced: Vec<MessageName>,
    /// Names deleted.
    retired: Vec<MessageName>,
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Message catalog service with fallback caching.
///
/// # Invariants
/// - Configured at most once per instance.
/// - The fallback snapshot is replaced only by configuration or by a
///   successful store read, always wholesale.
/// - No lock is held across a store call.
pub struct CatalogService {
    /// Lifecycle phase.
    phase: Mutex<Phase>,
    /// Snapshot pair.
    snapshots: Mutex<SnapshotPair>,
}

impl Default for CatalogService {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogService {
    /// Creates an unconfigured service with empty snapshots.
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(Phase::Unconfigured),
            snapshots: Mutex::new(SnapshotPair::default()),
        }
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ServiceState {
        self.lock_phase().state()
    }

    /// Returns the current fallback snapshot.
    #[must_use]
    pub fn fallback(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&self.lock_snapshots().fallback)
    }

    /// Returns the current live snapshot.
    #[must_use]
    pub fn live(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&self.lock_snapshots().live)
    }

    /// Synchronizes local definitions with the store and seeds both snapshots.
    ///
    /// Offline runtimes skip the identity lookup and the store entirely.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Configuration`] when the service was already
    /// configured, the definitions cannot be loaded, or the identity cannot be
    /// resolved; returns [`CatalogError::StoreUnavailable`] when any store
    /// operation fails. On error the service reports itself unconfigured,
    /// keeps its snapshots untouched, and rejects any further configuration.
    pub fn configure(
        &self,
        identity: &dyn IdentityResolver,
        runtime: &dyn RuntimeSettings,
        request: &ConfigureRequest,
    ) -> Result<SyncReport, CatalogError> {
        self.begin_configuring()?;
        let outcome = if runtime.offline() {
            Self::prepare_offline(request)
        } else {
            Self::prepare_online(identity, runtime.connector(), request)
        };
        match outcome {
            Ok(Prepared {
                phase,
                snapshot,
                report,
            }) => {
                self.install(snapshot);
                *self.lock_phase() = phase;
                info!(
                    offline = report.offline,
                    project = report.project.as_ref().map(ProjectName::as_str),
                    inserted = report.inserted.len(),
                    replaced = report.replaced.len(),
                    retired = report.retired.len(),
                    preserved = report.preserved.len(),
                    catalog_size = report.catalog_size,
                    "message catalog configured"
                );
                Ok(report)
            }
            Err(err) => {
                *self.lock_phase() = Phase::Failed;
                warn!(error = %err, "message catalog configuration failed");
                Err(err)
            }
        }
    }

    /// Returns the catalog for the current request.
    ///
    /// Before configuration and in offline mode this is the fallback snapshot.
    /// Otherwise the store is read and the result overlaid onto the live
    /// snapshot; a store failure degrades to the fallback snapshot and is not
    /// reported to the caller.
    #[must_use]
    pub fn actualize(&self) -> Arc<CatalogSnapshot> {
        let binding = match self.store_binding() {
            Ok(Some(binding)) => binding,
            Ok(None) => return self.fallback(),
            Err(CatalogNotConfigured) => {
                debug!("message catalog not configured; serving fallback snapshot");
                return self.fallback();
            }
        };
        match binding.store.list_messages(binding.project) {
            Ok(rows) => self.promote(rows),
            Err(err) => {
                warn!(
                    error = %err,
                    project_id = binding.project.get(),
                    "message catalog refresh failed; serving fallback snapshot"
                );
                self.fallback()
            }
        }
    }

    /// Moves `Unconfigured` to `Configuring`.
    fn begin_configuring(&self) -> Result<(), CatalogError> {
        let mut phase = self.lock_phase();
        match *phase {
            Phase::Unconfigured => {
                *phase = Phase::Configuring;
                Ok(())
            }
            Phase::Configuring => Err(CatalogError::Configuration(
                "catalog configuration already in progress".to_string(),
            )),
            Phase::Failed => Err(CatalogError::Configuration(
                "catalog configuration already attempted".to_string(),
            )),
            Phase::Online(_) | Phase::Offline => Err(CatalogError::Configuration(
                "catalog service already configured".to_string(),
            )),
        }
    }

    /// Builds the offline catalog from local definitions.
    fn prepare_offline(request: &ConfigureRequest) -> Result<Prepared, CatalogError> {
        let definitions = Definitions::load(&request.definitions_path)?;
        let snapshot = definitions.to_snapshot();
        let report = SyncReport {
            offline: true,
            catalog_size: snapshot.len(),
            ..SyncReport::default()
        };
        Ok(Prepared {
            phase: Phase::Offline,
            snapshot,
            report,
        })
    }

    /// Reconciles local definitions against the store.
    fn prepare_online(
        identity: &dyn IdentityResolver,
        connector: &dyn StoreConnector,
        request: &ConfigureRequest,
    ) -> Result<Prepared, CatalogError> {
        let definitions = Definitions::load(&request.definitions_path)?;
        let project = identity.resolve_identity()?;
        let store = SharedCatalogStore::new(connector.connect()?);
        let project_id = store.resolve_project(&project)?;
        let persisted = CatalogSnapshot::from_entries(store.list_messages(project_id)?);
        let plan = reconcile(&definitions, &persisted, &request.mode);
        let applied = apply_plan(&store, project_id, &plan)?;

        let snapshot = persisted.without(&plan.retire).with_overlay(
            plan.upsert.iter().map(|planned| (planned.name.clone(), planned.text.clone())),
        );
        let report = SyncReport {
            offline: false,
            project: Some(project),
            project_id: Some(project_id),
            inserted: applied.inserted,
            replaced: applied.replaced,
            retired: applied.retired,
            preserved: plan.preserved,
            catalog_size: snapshot.len(),
        };
        Ok(Prepared {
            phase: Phase::Online(StoreBinding {
                store,
                project: project_id,
            }),
            snapshot,
            report,
        })
    }

    /// Returns the store binding, `None` when offline.
    fn store_binding(&self) -> Result<Option<StoreBinding>, CatalogNotConfigured> {
        match &*self.lock_phase() {
            Phase::Unconfigured | Phase::Configuring | Phase::Failed => {
                Err(CatalogNotConfigured)
            }
            Phase::Offline => Ok(None),
            Phase::Online(binding) => Ok(Some(binding.clone())),
        }
    }

    /// Seeds both snapshots with the same catalog.
    fn install(&self, snapshot: CatalogSnapshot) {
        let snapshot = Arc::new(snapshot);
        let mut pair = self.lock_snapshots();
        pair.fallback = Arc::clone(&snapshot);
        pair.live = snapshot;
    }

    /// Overlays a successful store read onto live and promotes it to fallback.
    fn promote(&self, rows: BTreeMap<MessageName, String>) -> Arc<CatalogSnapshot> {
        let base = self.live();
        let refreshed = Arc::new(base.with_overlay(rows));
        let mut pair = self.lock_snapshots();
        pair.live = Arc::clone(&refreshed);
        pair.fallback = Arc::clone(&refreshed);
        drop(pair);
        refreshed
    }

    /// Locks the lifecycle phase, recovering from poisoning.
    fn lock_phase(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the snapshot pair, recovering from poisoning.
    ///
    /// Holders only swap `Arc` pointers, so the pair is consistent even after
    /// a panic elsewhere.
    fn lock_snapshots(&self) -> MutexGuard<'_, SnapshotPair> {
        self.snapshots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// SECTION: Plan Application
// ============================================================================

/// Applies retirements, then upserts, in plan order.
fn apply_plan(
    store: &dyn CatalogStore,
    project: ProjectId,
    plan: &SyncPlan,
) -> Result<AppliedPlan, StoreError> {
    let mut applied = AppliedPlan::default();
    for name in &plan.retire {
        if remove_message(store, project, name)? {
            debug!(name = %name, "retired message");
            applied.retired.push(name.clone());
        }
    }
    for planned in &plan.upsert {
        let replaced = planned.replace_existing && remove_message(store, project, &planned.name)?;
        let message_id = store.insert_message(&planned.name, &planned.text, project)?;
        for variable in &planned.variables {
            store.insert_variable(&variable.name, &variable.description, message_id)?;
        }
        if replaced {
            debug!(name = %planned.name, "replaced message");
            applied.replaced.push(planned.name.clone());
        } else {
            applied.inserted.push(planned.name.clone());
        }
    }
    Ok(applied)
}

/// Deletes a message and its variables; returns false when it did not exist.
fn remove_message(
    store: &dyn CatalogStore,
    project: ProjectId,
    name: &MessageName,
) -> Result<bool, StoreError> {
    let Some(message_id) = store.find_message_id(name, project)? else {
        return Ok(false);
    };
    for variable_id in store.list_variable_ids(message_id)?.into_values() {
        store.delete_variable(variable_id)?;
    }
    store.delete_message(message_id)?;
    Ok(true)
}

//! Collaborator interfaces consumed by the entitlement service.

use crate::error::{ReconfigureResult, StoreResult};
use async_trait::async_trait;
use entitle_license::License;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub use entitle_license::LicenseValidator;

/// The currently committed entitlement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LicenseState {
    #[default]
    Absent,
    Active(Arc<License>),
}

impl LicenseState {
    /// Returns the active license, if any.
    #[must_use]
    pub fn license(&self) -> Option<&Arc<License>> {
        match self {
            Self::Absent => None,
            Self::Active(license) => Some(license),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }
}

/// Holds the active license.
///
/// `replace` and `clear` are each a single commit point and must be mutually
/// exclusive; `current` only ever observes committed values.
#[async_trait]
pub trait LicenseStore: Send + Sync {
    /// Atomically makes `license` the active license, discarding any prior one.
    async fn replace(&self, license: Arc<License>) -> StoreResult<()>;

    /// Atomically removes the active license. Clearing an empty store is a no-op.
    async fn clear(&self) -> StoreResult<()>;

    /// Returns the committed state.
    async fn current(&self) -> StoreResult<LicenseState>;
}

/// A restartable background job subsystem.
///
/// Implementations serialize their own start/stop transitions; callers may
/// invoke these concurrently.
#[async_trait]
pub trait JobController: Send + Sync {
    /// Stops any running workers and rebuilds the worker set for `license`.
    async fn reinitialize(&self, license: &License) -> ReconfigureResult<()>;

    /// Starts the workers built by the last `reinitialize`.
    async fn start(&self) -> ReconfigureResult<()>;

    /// Stops all running workers.
    async fn stop(&self) -> ReconfigureResult<()>;
}

/// Reacts to a newly committed license.
#[async_trait]
pub trait EntitlementListener: Send + Sync {
    /// Short name used in logs and warnings.
    fn name(&self) -> &str;

    async fn entitlement_changed(&self, license: &License) -> ReconfigureResult<()>;
}

/// Counts users that occupy a license seat.
#[async_trait]
pub trait UserCounter: Send + Sync {
    async fn active_users(&self) -> StoreResult<u64>;
}

/// Restarts a [`JobController`] whenever the entitlement changes.
///
/// The controller is always configured from the store's committed license
/// rather than the one in the notification, and read-then-restart is
/// serialized, so concurrent activations leave the workers matching the
/// last commit.
pub struct JobRestartListener {
    controller: Arc<dyn JobController>,
    store: Arc<dyn LicenseStore>,
    restarting: Mutex<()>,
}

impl JobRestartListener {
    pub fn new(controller: Arc<dyn JobController>, store: Arc<dyn LicenseStore>) -> Self {
        Self {
            controller,
            store,
            restarting: Mutex::new(()),
        }
    }
}

#[async_trait]
impl EntitlementListener for JobRestartListener {
    fn name(&self) -> &str {
        "jobs"
    }

    async fn entitlement_changed(&self, license: &License) -> ReconfigureResult<()> {
        let _restarting = self.restarting.lock().await;
        match self.store.current().await? {
            LicenseState::Active(committed) => {
                if committed.id() != license.id() {
                    debug!(
                        notified = license.id(),
                        committed = committed.id(),
                        "newer license committed, configuring jobs for it"
                    );
                }
                self.controller.reinitialize(&committed).await?;
                self.controller.start().await
            }
            LicenseState::Absent => self.controller.stop().await,
        }
    }
}

//! Restartable background worker pool.
//!
//! The pool owns one task per [`WorkerKind`]. Kinds gated on a license
//! feature only run while the active license enables that feature, so a new
//! license takes effect through `reinitialize` + `start` without a process
//! restart.

use crate::error::{ReconfigureError, ReconfigureResult};
use crate::ports::JobController;
use async_trait::async_trait;
use entitle_license::{Feature, License};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A category of background job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WorkerKind {
    Migrations,
    Plugins,
    DataRetention,
    MessageExport,
    ElasticsearchIndexing,
    LdapSync,
}

impl WorkerKind {
    /// Returns the license feature this kind requires, if any.
    #[must_use]
    pub fn required_feature(&self) -> Option<Feature> {
        match self {
            Self::Migrations | Self::Plugins => None,
            Self::DataRetention => Some(Feature::DataRetention),
            Self::MessageExport => Some(Feature::MessageExport),
            Self::ElasticsearchIndexing => Some(Feature::Elasticsearch),
            Self::LdapSync => Some(Feature::Ldap),
        }
    }

    /// Returns true if `license` allows this kind to run.
    #[must_use]
    pub fn is_licensed(&self, license: &License) -> bool {
        self.required_feature()
            .is_none_or(|feature| license.has_feature(feature))
    }
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Migrations => "migrations",
            Self::Plugins => "plugins",
            Self::DataRetention => "data_retention",
            Self::MessageExport => "message_export",
            Self::ElasticsearchIndexing => "elasticsearch_indexing",
            Self::LdapSync => "ldap_sync",
        };
        f.write_str(name)
    }
}

/// A long-running worker. `run` must return once `shutdown` flips to true.
#[async_trait]
pub trait JobWorker: Send + Sync {
    async fn run(&self, kind: WorkerKind, shutdown: watch::Receiver<bool>);
}

/// Worker that idles until shutdown, logging a heartbeat.
#[derive(Debug, Clone)]
pub struct HeartbeatWorker {
    interval: Duration,
}

impl HeartbeatWorker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for HeartbeatWorker {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[async_trait]
impl JobWorker for HeartbeatWorker {
    async fn run(&self, kind: WorkerKind, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => debug!(%kind, "worker heartbeat"),
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }
}

struct RunningWorker {
    kind: WorkerKind,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct PoolState {
    /// Kinds selected by the last `reinitialize`; None until then.
    planned: Option<Vec<WorkerKind>>,
    running: Vec<RunningWorker>,
}

/// Worker pool implementing [`JobController`].
///
/// Transitions are serialized by an internal lock, so overlapping restarts
/// from concurrent license changes apply one after the other.
pub struct WorkerPool {
    workers: BTreeMap<WorkerKind, Arc<dyn JobWorker>>,
    state: Mutex<PoolState>,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerPool {
    pub fn new() -> Self {
        Self {
            workers: BTreeMap::new(),
            state: Mutex::new(PoolState::default()),
        }
    }

    /// Registers the worker that runs jobs of `kind`.
    #[must_use]
    pub fn register(mut self, kind: WorkerKind, worker: Arc<dyn JobWorker>) -> Self {
        self.workers.insert(kind, worker);
        self
    }

    /// Returns the kinds selected by the last `reinitialize`.
    pub async fn planned_kinds(&self) -> Option<Vec<WorkerKind>> {
        self.state.lock().await.planned.clone()
    }

    /// Returns the kinds whose tasks are currently running.
    pub async fn running_kinds(&self) -> Vec<WorkerKind> {
        self.state
            .lock()
            .await
            .running
            .iter()
            .filter(|w| !w.handle.is_finished())
            .map(|w| w.kind)
            .collect()
    }

    async fn stop_locked(state: &mut PoolState) -> ReconfigureResult<()> {
        let mut first_error = None;
        for worker in state.running.drain(..) {
            // A worker that already exited has dropped its receiver.
            let _ = worker.shutdown.send(true);
            if let Err(e) = worker.handle.await {
                warn!(kind = %worker.kind, error = %e, "worker ended abnormally");
                first_error.get_or_insert(ReconfigureError::StopFailed {
                    kind: worker.kind.to_string(),
                    reason: e.to_string(),
                });
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl JobController for WorkerPool {
    async fn reinitialize(&self, license: &License) -> ReconfigureResult<()> {
        let mut state = self.state.lock().await;
        let stopped = Self::stop_locked(&mut state).await;

        let planned: Vec<WorkerKind> = self
            .workers
            .keys()
            .copied()
            .filter(|kind| kind.is_licensed(license))
            .collect();
        info!(
            license_id = license.id(),
            workers = planned.len(),
            "worker pool reinitialized"
        );
        state.planned = Some(planned);
        stopped
    }

    async fn start(&self) -> ReconfigureResult<()> {
        let mut state = self.state.lock().await;
        let planned = state
            .planned
            .clone()
            .ok_or(ReconfigureError::NotInitialized)?;
        if !state.running.is_empty() {
            return Ok(());
        }

        for kind in planned {
            let Some(worker) = self.workers.get(&kind).cloned() else {
                continue;
            };
            let (shutdown, rx) = watch::channel(false);
            let handle = tokio::spawn(async move {
                worker.run(kind, rx).await;
                debug!(%kind, "worker stopped");
            });
            state.running.push(RunningWorker {
                kind,
                shutdown,
                handle,
            });
        }
        info!(running = state.running.len(), "worker pool started");
        Ok(())
    }

    async fn stop(&self) -> ReconfigureResult<()> {
        let mut state = self.state.lock().await;
        let result = Self::stop_locked(&mut state).await;
        info!("worker pool stopped");
        result
    }
}

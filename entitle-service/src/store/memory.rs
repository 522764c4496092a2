//! In-process license store.

use crate::error::StoreResult;
use crate::ports::{LicenseState, LicenseStore};
use async_trait::async_trait;
use entitle_license::License;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keeps the active license in memory behind a single-writer lock.
#[derive(Debug, Default)]
pub struct MemoryLicenseStore {
    state: RwLock<LicenseState>,
}

impl MemoryLicenseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that starts with `license` active.
    pub fn with_license(license: Arc<License>) -> Self {
        Self {
            state: RwLock::new(LicenseState::Active(license)),
        }
    }
}

#[async_trait]
impl LicenseStore for MemoryLicenseStore {
    async fn replace(&self, license: Arc<License>) -> StoreResult<()> {
        *self.state.write().await = LicenseState::Active(license);
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        *self.state.write().await = LicenseState::Absent;
        Ok(())
    }

    async fn current(&self) -> StoreResult<LicenseState> {
        Ok(self.state.read().await.clone())
    }
}

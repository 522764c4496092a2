//! Service configuration.

use serde::{Deserialize, Serialize};

/// Default cap on an uploaded license attachment (50 MiB).
pub const DEFAULT_MAX_FILE_SIZE: usize = 50 * 1024 * 1024;

/// Configuration for the entitlement service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Whether this deployment runs background jobs. When false, license
    /// changes never restart the job subsystem.
    pub run_jobs: bool,
    /// Denies license changes to every actor, including system admins.
    pub restrict_system_admin: bool,
    /// Maximum accepted upload size in bytes.
    pub max_file_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            run_jobs: true,
            restrict_system_admin: false,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl ServiceConfig {
    /// Parses a JSON configuration document; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

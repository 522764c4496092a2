//! License entitlement lifecycle for Entitle.
//!
//! Accepts signed license uploads, activates them atomically, exposes a
//! permission-aware view of the active license, and restarts the background
//! job subsystem so license-gated workers pick up the new entitlement.
//!
//! # Components
//!
//! - **Ports**: traits for the validator, store, job controller and listeners
//! - **Service**: orchestrates validate → commit → reconfigure
//! - **Audit**: one record per privileged operation, emitted on every path
//! - **Stores**: in-memory and SQLite implementations of [`LicenseStore`]
//! - **Jobs**: a restartable [`WorkerPool`] gated on license features
//!
//! # Example
//!
//! ```
//! use entitle_service::{
//!     Actor, EntitlementService, MemoryAuditRecorder, MemoryLicenseStore, ServiceConfig,
//! };
//! use entitle_license::SignedLicenseValidator;
//! use ed25519_dalek::SigningKey;
//! use std::sync::Arc;
//!
//! let verifying_key = SigningKey::from_bytes(&[1u8; 32]).verifying_key();
//! let validator = SignedLicenseValidator::new(verifying_key);
//! let service = EntitlementService::new(
//!     ServiceConfig::default(),
//!     Arc::new(validator),
//!     Arc::new(MemoryLicenseStore::new()),
//!     Arc::new(MemoryAuditRecorder::new()),
//! );
//! assert!(!service.config().restrict_system_admin);
//! let _ = Actor::system_admin("admin");
//! ```

mod actor;
pub mod audit;
mod config;
mod error;
pub mod jobs;
pub mod ports;
mod service;
pub mod store;

pub use actor::{Actor, Permission};
pub use audit::{
    AuditGuard, AuditOutcome, AuditRecord, AuditRecorder, MemoryAuditRecorder,
    TracingAuditRecorder,
};
pub use config::{DEFAULT_MAX_FILE_SIZE, ServiceConfig};
pub use error::{
    EntitlementError, EntitlementResult, MalformedUpload, ReconfigureError, ReconfigureResult,
    StoreError, StoreResult,
};
pub use jobs::{HeartbeatWorker, JobWorker, WorkerKind, WorkerPool};
pub use ports::{
    EntitlementListener, JobController, JobRestartListener, LicenseState, LicenseStore,
    LicenseValidator, UserCounter,
};
pub use service::{Activation, EntitlementService, LicenseUpload, OP_ADD_LICENSE, OP_REMOVE_LICENSE};
pub use store::{MemoryLicenseStore, SqliteLicenseStore};

//! Shared test helpers for entitlement service tests.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use ed25519_dalek::{Signer, SigningKey};
use entitle_license::{License, LicenseError, LicenseResult, LicenseValidator, SignedLicenseValidator};
use entitle_service::{
    Actor, EntitlementService, JobController, LicenseState, LicenseStore, LicenseUpload,
    MalformedUpload, MemoryAuditRecorder, MemoryLicenseStore, ReconfigureError,
    ReconfigureResult, ServiceConfig, StoreError, StoreResult, UserCounter,
};
use serde_json::json;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const NOW: i64 = 1_750_000_000;
pub const DAY: i64 = 24 * 60 * 60;

/// Returns a deterministic Ed25519 signing key from a fixed seed.
pub fn signing_key() -> SigningKey {
    let seed: [u8; 32] = [
        1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
        25, 26, 27, 28, 29, 30, 31, 32,
    ];
    SigningKey::from_bytes(&seed)
}

pub fn validator() -> SignedLicenseValidator {
    SignedLicenseValidator::new(signing_key().verifying_key()).with_fixed_time(NOW)
}

pub fn sign(payload_json: &str) -> String {
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload_json.as_bytes());
    let signature = signing_key().sign(payload_b64.as_bytes());
    format!("{payload_b64}.{}", URL_SAFE_NO_PAD.encode(signature.to_bytes()))
}

/// A signed key valid at [`NOW`] with the given id, seats and features.
pub fn license_key(id: &str, users: u32, features: &[&str]) -> String {
    sign(
        &json!({
            "id": id,
            "issued_at": NOW - DAY,
            "expires_at": NOW + 365 * DAY,
            "customer": {
                "id": "cust-1",
                "name": "Grace Hopper",
                "email": "grace@example.com",
                "company": "Compilers Inc"
            },
            "features": { "users": users, "enabled": features },
            "sku_name": "Enterprise Edition",
            "sku_short_name": "E20",
            "is_trial": false
        })
        .to_string(),
    )
}

pub fn expired_key() -> String {
    sign(
        &json!({
            "id": "lic-expired",
            "issued_at": NOW - 60 * DAY,
            "expires_at": NOW - DAY,
            "customer": { "id": "c", "name": "n", "email": "e" }
        })
        .to_string(),
    )
}

pub fn upload(key: &str) -> Result<Option<LicenseUpload>, MalformedUpload> {
    Ok(Some(LicenseUpload::new(
        Some("license.key".to_string()),
        key.as_bytes().to_vec(),
    )))
}

pub fn validate(key: &str) -> License {
    validator().validate(key.as_bytes()).unwrap()
}

pub fn admin() -> Actor {
    Actor::system_admin("admin-1")
}

/// Job controller that records calls and optionally fails `start`.
#[derive(Default)]
pub struct RecordingJobs {
    pub calls: Mutex<Vec<String>>,
    pub fail_start: bool,
}

impl RecordingJobs {
    pub fn failing() -> Self {
        Self {
            fail_start: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobController for RecordingJobs {
    async fn reinitialize(&self, license: &License) -> ReconfigureResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("reinitialize:{}", license.id()));
        Ok(())
    }

    async fn start(&self) -> ReconfigureResult<()> {
        self.calls.lock().unwrap().push("start".to_string());
        if self.fail_start {
            return Err(ReconfigureError::Other("scheduler offline".to_string()));
        }
        Ok(())
    }

    async fn stop(&self) -> ReconfigureResult<()> {
        self.calls.lock().unwrap().push("stop".to_string());
        Ok(())
    }
}

/// Validator that always fails with the error built by `make`.
pub struct FailingValidator {
    pub make: fn() -> LicenseError,
    pub calls: AtomicUsize,
}

impl FailingValidator {
    pub fn new(make: fn() -> LicenseError) -> Self {
        Self {
            make,
            calls: AtomicUsize::new(0),
        }
    }
}

impl LicenseValidator for FailingValidator {
    fn validate(&self, _raw: &[u8]) -> LicenseResult<License> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err((self.make)())
    }
}

/// Store whose every operation fails.
pub struct UnavailableStore;

#[async_trait]
impl LicenseStore for UnavailableStore {
    async fn replace(&self, _license: Arc<License>) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn clear(&self) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn current(&self) -> StoreResult<LicenseState> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

/// User counter returning a fixed count.
pub struct FixedUsers(pub AtomicU64);

#[async_trait]
impl UserCounter for FixedUsers {
    async fn active_users(&self) -> StoreResult<u64> {
        Ok(self.0.load(Ordering::SeqCst))
    }
}

/// A service wired to in-memory collaborators.
pub struct Harness {
    pub service: EntitlementService,
    pub store: Arc<MemoryLicenseStore>,
    pub audit: Arc<MemoryAuditRecorder>,
    pub jobs: Arc<RecordingJobs>,
}

impl Harness {
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_jobs(config, RecordingJobs::default())
    }

    pub fn with_jobs(config: ServiceConfig, jobs: RecordingJobs) -> Self {
        let store = Arc::new(MemoryLicenseStore::new());
        let audit = Arc::new(MemoryAuditRecorder::new());
        let jobs = Arc::new(jobs);
        let service = EntitlementService::new(
            config,
            Arc::new(validator()),
            store.clone(),
            audit.clone(),
        )
        .with_job_controller(jobs.clone());
        Self {
            service,
            store,
            audit,
            jobs,
        }
    }

    pub async fn state(&self) -> LicenseState {
        self.store.current().await.unwrap()
    }
}

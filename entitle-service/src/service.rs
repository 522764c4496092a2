//! The entitlement service: license activation, removal and read views.

use crate::actor::{Actor, Permission};
use crate::audit::{AuditGuard, AuditRecorder, META_FILENAME};
use crate::config::ServiceConfig;
use crate::error::{EntitlementError, EntitlementResult, MalformedUpload};
use crate::ports::{
    EntitlementListener, JobController, JobRestartListener, LicenseState, LicenseStore,
    LicenseValidator, UserCounter,
};
use entitle_license::{AttributeMap, FailureCategory, License, LicenseError, RedactionPolicy};
use std::sync::Arc;
use tracing::{info, warn};

/// Audit operation name for license uploads.
pub const OP_ADD_LICENSE: &str = "addLicense";
/// Audit operation name for license removal.
pub const OP_REMOVE_LICENSE: &str = "removeLicense";

/// A license attachment extracted from an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseUpload {
    /// Client-supplied filename, recorded in the audit trail.
    pub filename: Option<String>,
    /// The fully buffered attachment.
    pub bytes: Vec<u8>,
}

impl LicenseUpload {
    pub fn new(filename: Option<String>, bytes: Vec<u8>) -> Self {
        Self { filename, bytes }
    }
}

/// Result of a successful license upload.
#[derive(Debug, Clone)]
pub struct Activation {
    /// The license now in force, unredacted.
    pub license: Arc<License>,
    /// Post-commit reconfiguration failures. The license stays active.
    pub warnings: Vec<String>,
}

/// Orchestrates validate → commit → reconfigure for license changes.
pub struct EntitlementService {
    config: ServiceConfig,
    validator: Arc<dyn LicenseValidator>,
    store: Arc<dyn LicenseStore>,
    audit: Arc<dyn AuditRecorder>,
    listeners: Vec<Arc<dyn EntitlementListener>>,
    user_counter: Option<Arc<dyn UserCounter>>,
    redaction: RedactionPolicy,
}

impl EntitlementService {
    /// Creates a service with no listeners and the current redaction policy.
    pub fn new(
        config: ServiceConfig,
        validator: Arc<dyn LicenseValidator>,
        store: Arc<dyn LicenseStore>,
        audit: Arc<dyn AuditRecorder>,
    ) -> Self {
        Self {
            config,
            validator,
            store,
            audit,
            listeners: Vec::new(),
            user_counter: None,
            redaction: RedactionPolicy::CURRENT,
        }
    }

    /// Restarts `controller` after each activation, if `run_jobs` is enabled.
    #[must_use]
    pub fn with_job_controller(self, controller: Arc<dyn JobController>) -> Self {
        if !self.config.run_jobs {
            info!("jobs disabled, license changes will not restart workers");
            return self;
        }
        let listener = JobRestartListener::new(controller, Arc::clone(&self.store));
        self.with_listener(Arc::new(listener))
    }

    /// Registers a listener notified after each activation. Listeners are
    /// skipped entirely when `run_jobs` is disabled.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn EntitlementListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Rejects licenses with fewer seats than `counter` reports.
    #[must_use]
    pub fn with_user_counter(mut self, counter: Arc<dyn UserCounter>) -> Self {
        self.user_counter = Some(counter);
        self
    }

    #[must_use]
    pub fn with_redaction_policy(mut self, policy: RedactionPolicy) -> Self {
        self.redaction = policy;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Validates and activates an uploaded license.
    ///
    /// `upload` is whatever the transport managed to extract: an error when
    /// the body could not be parsed, `None` when no attachment was found.
    /// The store is untouched unless validation succeeds. Exactly one audit
    /// record is emitted whichever way this returns.
    pub async fn add_license(
        &self,
        actor: &Actor,
        upload: Result<Option<LicenseUpload>, MalformedUpload>,
    ) -> EntitlementResult<Activation> {
        let mut audit = AuditGuard::begin(Arc::clone(&self.audit), OP_ADD_LICENSE, actor);

        if let Err(e) = self.authorize(actor) {
            audit.fail("permission denied");
            return Err(e);
        }

        let upload = match upload {
            Ok(Some(upload)) => upload,
            Err(e) => {
                audit.fail("unable to parse multipart form");
                return Err(e.into());
            }
            Ok(None) => {
                audit.fail("no license file");
                return Err(EntitlementError::MissingArtifact);
            }
        };
        if let Some(filename) = &upload.filename {
            audit.annotate(META_FILENAME, filename.clone());
        }
        if upload.bytes.is_empty() {
            audit.fail("empty license file");
            return Err(EntitlementError::MissingArtifact);
        }

        let license = match self.validate(&upload.bytes).await {
            Ok(license) => Arc::new(license),
            Err(e) => {
                audit.fail(match &e {
                    EntitlementError::ValidationExpired(_) => "expired or non-started license",
                    EntitlementError::ValidationInvalid(_) => "invalid license",
                    _ => "unable to save license",
                });
                return Err(e);
            }
        };

        if let Err(e) = self.store.replace(Arc::clone(&license)).await {
            audit.fail("unable to save license");
            return Err(e.into());
        }
        info!(license_id = license.id(), actor = actor.audit_id(), "license activated");

        let warnings = self.notify_listeners(&license).await;

        audit.succeed();
        Ok(Activation { license, warnings })
    }

    /// Clears the active license. Removing when none is active succeeds.
    pub async fn remove_license(&self, actor: &Actor) -> EntitlementResult<()> {
        let mut audit = AuditGuard::begin(Arc::clone(&self.audit), OP_REMOVE_LICENSE, actor);

        if let Err(e) = self.authorize(actor) {
            audit.fail("permission denied");
            return Err(e);
        }

        if let Err(e) = self.store.clear().await {
            audit.fail("unable to remove license");
            return Err(e.into());
        }
        info!(actor = actor.audit_id(), "license removed");

        audit.succeed();
        Ok(())
    }

    /// Returns the license attributes `actor` may see.
    ///
    /// `ManageSystem` holders get the full map; everyone else gets the
    /// redacted view. Both are empty when no license is active.
    pub async fn license_view(&self, actor: &Actor) -> EntitlementResult<AttributeMap> {
        let state = self.store.current().await?;
        let Some(license) = state.license() else {
            return Ok(AttributeMap::new());
        };

        let attributes = license.attributes();
        if actor.has_permission(Permission::ManageSystem) {
            Ok(attributes)
        } else {
            Ok(self.redaction.sanitize(&attributes))
        }
    }

    /// Re-validates the stored license and clears it if it no longer passes.
    ///
    /// Run at startup, before workers are configured from the store, so an
    /// entitlement that lapsed while the process was down is not revived.
    pub async fn revalidate_stored_license(&self) -> EntitlementResult<LicenseState> {
        let state = self.store.current().await?;
        let LicenseState::Active(stored) = &state else {
            return Ok(LicenseState::Absent);
        };

        match self.validator.validate(stored.raw().as_bytes()) {
            Ok(license) => {
                info!(license_id = license.id(), "stored license still valid");
                Ok(LicenseState::Active(Arc::new(license)))
            }
            Err(e) => {
                warn!(license_id = stored.id(), error = %e, "stored license no longer valid, removing it");
                self.store.clear().await?;
                Ok(LicenseState::Absent)
            }
        }
    }

    /// Returns the committed license state.
    pub async fn current_license(&self) -> EntitlementResult<LicenseState> {
        Ok(self.store.current().await?)
    }

    fn authorize(&self, actor: &Actor) -> EntitlementResult<()> {
        if !actor.has_permission(Permission::ManageSystem) {
            return Err(EntitlementError::PermissionDenied(
                "manage_system permission required".to_string(),
            ));
        }
        if self.config.restrict_system_admin {
            return Err(EntitlementError::PermissionDenied(
                "license changes are restricted on this deployment".to_string(),
            ));
        }
        Ok(())
    }

    async fn validate(&self, raw: &[u8]) -> EntitlementResult<License> {
        let license = self.validator.validate(raw).map_err(classify)?;

        if let (Some(counter), Some(seats)) = (&self.user_counter, license.seats()) {
            let active = counter.active_users().await.map_err(|e| {
                EntitlementError::ValidationOtherFailure(format!("unable to count users: {e}"))
            })?;
            if active > u64::from(seats) {
                return Err(classify(LicenseError::SeatLimitExceeded {
                    licensed: seats,
                    active,
                }));
            }
        }

        Ok(license)
    }

    async fn notify_listeners(&self, license: &License) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.config.run_jobs {
            return warnings;
        }
        for listener in &self.listeners {
            if let Err(e) = listener.entitlement_changed(license).await {
                warn!(listener = listener.name(), error = %e, "reconfiguration after license change failed");
                warnings.push(format!("{}: {e}", listener.name()));
            }
        }
        warnings
    }
}

fn classify(err: LicenseError) -> EntitlementError {
    match err.category() {
        FailureCategory::Expired => EntitlementError::ValidationExpired(err),
        FailureCategory::Invalid => EntitlementError::ValidationInvalid(err),
        FailureCategory::Other => EntitlementError::ValidationOtherFailure(err.to_string()),
    }
}

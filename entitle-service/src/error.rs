//! Error types for the entitlement service.

use entitle_license::LicenseError;
use thiserror::Error;

/// Result type for entitlement operations.
pub type EntitlementResult<T> = Result<T, EntitlementError>;

/// Result type for license store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for job reconfiguration.
pub type ReconfigureResult<T> = Result<T, ReconfigureError>;

/// Errors surfaced to callers of [`crate::EntitlementService`].
#[derive(Debug, Error)]
pub enum EntitlementError {
    /// The request body could not be read as a license upload.
    #[error("malformed upload: {0}")]
    MalformedUpload(#[from] MalformedUpload),

    /// No license attachment was submitted, or it was empty.
    #[error("no license file was attached")]
    MissingArtifact,

    /// Signed correctly but outside its validity window.
    #[error("expired or non-started license: {0}")]
    ValidationExpired(#[source] LicenseError),

    /// Signature, encoding or schema failure.
    #[error("invalid license: {0}")]
    ValidationInvalid(#[source] LicenseError),

    /// Any other reason the license could not be accepted.
    #[error("unable to save license: {0}")]
    ValidationOtherFailure(String),

    /// The license store could not be read or written.
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    /// The actor may not perform this operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
}

impl EntitlementError {
    /// Returns a stable, machine-readable code for client tooling.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedUpload(_) => "license.malformed_upload",
            Self::MissingArtifact => "license.missing_artifact",
            Self::ValidationExpired(_) => "license.expired",
            Self::ValidationInvalid(_) => "license.invalid",
            Self::ValidationOtherFailure(_) => "license.save_failed",
            Self::StoreUnavailable(_) => "license.store_unavailable",
            Self::PermissionDenied(_) => "license.permission_denied",
        }
    }
}

/// Transport-level failure reading an upload, e.g. a body that is not a
/// multipart form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct MalformedUpload(pub String);

/// License store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend could not be reached or returned an error.
    #[error("license store unavailable: {0}")]
    Unavailable(String),

    /// A persisted record could not be decoded.
    #[error("corrupt license record: {0}")]
    Corrupt(String),
}

/// Failures while reconfiguring subsystems after an entitlement change.
#[derive(Debug, Error)]
pub enum ReconfigureError {
    /// `start` was called before `reinitialize`.
    #[error("worker pool has not been initialized")]
    NotInitialized,

    /// A worker task ended abnormally while being stopped.
    #[error("worker {kind} failed to stop: {reason}")]
    StopFailed { kind: String, reason: String },

    /// The committed license could not be read back.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Listener-specific failure.
    #[error("{0}")]
    Other(String),
}

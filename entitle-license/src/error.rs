//! Error types for license parsing and validation.

use thiserror::Error;

/// Coarse classification of a validation failure.
///
/// Callers branch on the category rather than on individual variants so that
/// new failure modes can be added without touching every match site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    /// Signed correctly, but outside its validity window.
    Expired,
    /// Signature, encoding or payload schema failure.
    Invalid,
    /// Anything else (configuration, seat limits, collaborator failures).
    Other,
}

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Invalid license key format.
    #[error("invalid license key format: {0}")]
    InvalidKeyFormat(String),

    /// Ed25519 signature verification failed.
    #[error("license key signature invalid")]
    InvalidSignature,

    /// Payload JSON is malformed or missing required fields.
    #[error("invalid license payload: {0}")]
    InvalidPayload(String),

    /// License has expired.
    #[error("license expired at {0}")]
    Expired(String),

    /// License validity window has not started yet.
    #[error("license not valid until {0}")]
    NotStarted(String),

    /// The verifying key could not be constructed.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// More active users than the license grants.
    #[error("license allows {licensed} users but {active} are active")]
    SeatLimitExceeded { licensed: u32, active: u64 },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LicenseError {
    /// Returns the failure category used for audit annotation and error mapping.
    #[must_use]
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::Expired(_) | Self::NotStarted(_) => FailureCategory::Expired,
            Self::InvalidKeyFormat(_)
            | Self::InvalidSignature
            | Self::InvalidPayload(_)
            | Self::Serialization(_) => FailureCategory::Invalid,
            Self::InvalidPublicKey(_) | Self::SeatLimitExceeded { .. } => FailureCategory::Other,
        }
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;

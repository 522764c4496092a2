//! Validation of raw license bytes into a [`License`].

use crate::error::{LicenseError, LicenseResult};
use crate::key;
use crate::license::License;
use chrono::{DateTime, Utc};
use ed25519_dalek::VerifyingKey;

/// Turns an uploaded artifact into a validated license.
///
/// Implementations must classify every failure through
/// [`LicenseError::category`]; callers rely on it to tell expired keys apart
/// from forged or corrupt ones.
pub trait LicenseValidator: Send + Sync {
    /// Validates the fully buffered artifact.
    fn validate(&self, raw: &[u8]) -> LicenseResult<License>;
}

/// Ed25519 validator for `base64url(payload).base64url(signature)` keys.
#[derive(Debug, Clone)]
pub struct SignedLicenseValidator {
    verifying_key: VerifyingKey,
    /// Fixed "now" (seconds since epoch); None reads the system clock.
    fixed_now: Option<i64>,
}

impl SignedLicenseValidator {
    /// Creates a validator trusting the given public key.
    #[must_use]
    pub fn new(verifying_key: VerifyingKey) -> Self {
        Self {
            verifying_key,
            fixed_now: None,
        }
    }

    /// Creates a validator from raw 32-byte public key material.
    pub fn from_public_key_bytes(bytes: &[u8; 32]) -> LicenseResult<Self> {
        key::verifying_key_from_bytes(bytes).map(Self::new)
    }

    /// Creates a validator from a base64-encoded public key.
    pub fn from_public_key_base64(encoded: &str) -> LicenseResult<Self> {
        key::verifying_key_from_base64(encoded).map(Self::new)
    }

    /// Pins the validator's clock. Used for testing validity windows.
    #[must_use]
    pub fn with_fixed_time(mut self, now_secs: i64) -> Self {
        self.fixed_now = Some(now_secs);
        self
    }

    /// Validates `raw` as of `now` (seconds since epoch).
    pub fn validate_at(&self, raw: &[u8], now: i64) -> LicenseResult<License> {
        let license = key::decode(raw, &self.verifying_key)?;

        if !license.is_started_at(now) {
            return Err(LicenseError::NotStarted(format_ts(license.starts_at_secs())));
        }
        if let Some(exp) = license.expires_at_secs() {
            if license.is_expired_at(now) {
                return Err(LicenseError::Expired(format_ts(exp)));
            }
        }

        Ok(license)
    }
}

impl LicenseValidator for SignedLicenseValidator {
    fn validate(&self, raw: &[u8]) -> LicenseResult<License> {
        let now = self.fixed_now.unwrap_or_else(|| Utc::now().timestamp());
        self.validate_at(raw, now)
    }
}

fn format_ts(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}

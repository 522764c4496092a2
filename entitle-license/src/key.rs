//! License key decoding and Ed25519 signature verification.
//!
//! License keys use the format: `base64url(payload).base64url(signature)`
//!
//! The payload is a JSON [`LicensePayload`]. The signature covers
//! `payload_b64.as_bytes()` (the base64url-encoded payload string, not the
//! decoded JSON), matching the signing service.

use crate::error::{LicenseError, LicenseResult};
use crate::license::{License, LicensePayload};
use base64::{
    Engine,
    engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD},
};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

/// Upper bound on an uploaded key, checked before any decoding.
pub const MAX_KEY_LEN: usize = 64 * 1024;

/// Builds a verifying key from raw 32-byte public key material.
pub fn verifying_key_from_bytes(bytes: &[u8; 32]) -> LicenseResult<VerifyingKey> {
    VerifyingKey::from_bytes(bytes).map_err(|e| LicenseError::InvalidPublicKey(e.to_string()))
}

/// Builds a verifying key from base64 (standard or url-safe, padding optional).
pub fn verifying_key_from_base64(encoded: &str) -> LicenseResult<VerifyingKey> {
    let trimmed = encoded.trim().trim_end_matches('=');
    let decoded = URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .map_err(|e| LicenseError::InvalidPublicKey(format!("invalid base64: {e}")))?;
    let bytes: [u8; 32] = decoded
        .try_into()
        .map_err(|_| LicenseError::InvalidPublicKey("expected 32 bytes".to_string()))?;
    verifying_key_from_bytes(&bytes)
}

/// Decodes and verifies a license key, without checking its validity window.
///
/// # Errors
///
/// Returns an `Invalid`-category error if the key format, signature, or
/// payload JSON is bad.
pub fn decode(raw: &[u8], verifying_key: &VerifyingKey) -> LicenseResult<License> {
    if raw.len() > MAX_KEY_LEN {
        return Err(LicenseError::InvalidKeyFormat(format!(
            "key exceeds {MAX_KEY_LEN} bytes"
        )));
    }

    let key = std::str::from_utf8(raw)
        .map_err(|_| LicenseError::InvalidKeyFormat("key is not valid UTF-8".to_string()))?
        .trim();

    // Split into payload and signature parts
    let Some((payload_b64, signature_b64)) = key.split_once('.') else {
        return Err(LicenseError::InvalidKeyFormat(
            "key must have exactly two parts separated by a dot".to_string(),
        ));
    };
    if signature_b64.contains('.') {
        return Err(LicenseError::InvalidKeyFormat(
            "key must have exactly two parts separated by a dot".to_string(),
        ));
    }

    let sig_bytes = URL_SAFE_NO_PAD.decode(signature_b64).map_err(|e| {
        LicenseError::InvalidKeyFormat(format!("invalid signature base64: {e}"))
    })?;

    let signature = Signature::from_slice(&sig_bytes)
        .map_err(|_| LicenseError::InvalidKeyFormat("invalid signature length".to_string()))?;

    verifying_key
        .verify(payload_b64.as_bytes(), &signature)
        .map_err(|_| LicenseError::InvalidSignature)?;

    let payload_json = URL_SAFE_NO_PAD.decode(payload_b64).map_err(|e| {
        LicenseError::InvalidKeyFormat(format!("invalid payload base64: {e}"))
    })?;

    let payload: LicensePayload = serde_json::from_slice(&payload_json)
        .map_err(|e| LicenseError::InvalidPayload(format!("invalid payload JSON: {e}")))?;

    if payload.id.trim().is_empty() {
        return Err(LicenseError::InvalidPayload("license id is empty".to_string()));
    }
    if let (Some(exp), Some(start)) = (payload.expires_at, payload.starts_at) {
        if exp < start {
            return Err(LicenseError::InvalidPayload(
                "expires_at precedes starts_at".to_string(),
            ));
        }
    }

    Ok(License::new(key.to_string(), payload))
}

//! Shared test helpers for license tests.

#![allow(dead_code)]

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use ed25519_dalek::{Signer, SigningKey};
use serde_json::json;

/// A fixed "now" used by tests that pin the validator clock.
pub const NOW: i64 = 1_750_000_000;
pub const DAY: i64 = 24 * 60 * 60;

/// Returns a deterministic Ed25519 key pair from a fixed seed.
pub fn test_keypair() -> (SigningKey, [u8; 32]) {
    let seed: [u8; 32] = [
        1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
        25, 26, 27, 28, 29, 30, 31, 32,
    ];
    let signing_key = SigningKey::from_bytes(&seed);
    let verifying_key = signing_key.verifying_key();
    (signing_key, verifying_key.to_bytes())
}

/// A second key pair whose signatures the test validator must reject.
pub fn foreign_keypair() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

/// Creates a signed license key string: `base64url(payload_json).base64url(signature)`.
/// Signs over the base64url-encoded payload bytes.
pub fn sign_key(signing_key: &SigningKey, payload_json: &str) -> String {
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload_json.as_bytes());
    let signature = signing_key.sign(payload_b64.as_bytes());
    let sig_b64 = URL_SAFE_NO_PAD.encode(signature.to_bytes());
    format!("{payload_b64}.{sig_b64}")
}

/// A payload valid from `starts_at` to `expires_at` with LDAP and Cluster enabled.
pub fn payload(id: &str, starts_at: i64, expires_at: Option<i64>) -> serde_json::Value {
    json!({
        "id": id,
        "issued_at": starts_at,
        "starts_at": starts_at,
        "expires_at": expires_at,
        "customer": {
            "id": "cust-1",
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "company": "Analytical Engines Ltd"
        },
        "features": {
            "users": 250,
            "enabled": ["ldap", "cluster"]
        },
        "sku_name": "Enterprise Edition",
        "sku_short_name": "E20",
        "is_trial": false
    })
}

/// A key valid for a year around [`NOW`].
pub fn make_current_key(signing_key: &SigningKey) -> String {
    sign_key(
        signing_key,
        &payload("lic-current", NOW - DAY, Some(NOW + 365 * DAY)).to_string(),
    )
}

/// A key that expired one day before [`NOW`].
pub fn make_expired_key(signing_key: &SigningKey) -> String {
    sign_key(
        signing_key,
        &payload("lic-expired", NOW - 30 * DAY, Some(NOW - DAY)).to_string(),
    )
}

/// A key whose window opens one day after [`NOW`].
pub fn make_future_key(signing_key: &SigningKey) -> String {
    sign_key(
        signing_key,
        &payload("lic-future", NOW + DAY, Some(NOW + 30 * DAY)).to_string(),
    )
}

/// A key that never expires.
pub fn make_perpetual_key(signing_key: &SigningKey) -> String {
    sign_key(signing_key, &payload("lic-perpetual", NOW - DAY, None).to_string())
}

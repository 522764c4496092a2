mod common;

use common::{
    DAY, NOW, foreign_keypair, make_current_key, make_expired_key, make_future_key,
    make_perpetual_key, payload, sign_key, test_keypair,
};
use entitle_license::{
    Feature, FailureCategory, License, LicenseError, LicenseValidator, SignedLicenseValidator,
    verifying_key_from_base64,
};

fn validator() -> SignedLicenseValidator {
    let (_, pk) = test_keypair();
    SignedLicenseValidator::from_public_key_bytes(&pk)
        .unwrap()
        .with_fixed_time(NOW)
}

// ── Valid keys ───────────────────────────────────────────────────

#[test]
fn validate_current_key() {
    let (sk, _) = test_keypair();
    let key = make_current_key(&sk);
    let license = validator().validate(key.as_bytes()).unwrap();

    assert_eq!(license.id(), "lic-current");
    assert_eq!(license.seats(), Some(250));
    assert!(license.has_feature(Feature::Ldap));
    assert!(license.has_feature(Feature::Cluster));
    assert!(!license.has_feature(Feature::DataRetention));
}

#[test]
fn validate_perpetual_key() {
    let (sk, _) = test_keypair();
    let key = make_perpetual_key(&sk);
    let license = validator().validate(key.as_bytes()).unwrap();
    assert!(license.expires_at_secs().is_none());
    assert!(!license.is_expired_at(i64::MAX));
}

#[test]
fn validate_with_whitespace() {
    let (sk, _) = test_keypair();
    let padded = format!("  {}\n", make_current_key(&sk));
    let license = validator().validate(padded.as_bytes()).unwrap();
    assert_eq!(license.raw(), padded.trim());
}

#[test]
fn starts_at_defaults_to_issued_at() {
    let (sk, _) = test_keypair();
    let mut body = payload("lic-no-start", NOW - DAY, None);
    body.as_object_mut().unwrap().remove("starts_at");
    let key = sign_key(&sk, &body.to_string());

    let license = validator().validate(key.as_bytes()).unwrap();
    assert_eq!(license.starts_at_secs(), NOW - DAY);
}

#[test]
fn validate_against_system_clock() {
    let (sk, pk) = test_keypair();
    let now = chrono::Utc::now().timestamp();
    let key = sign_key(&sk, &payload("lic-live", now - DAY, Some(now + DAY)).to_string());
    let license = SignedLicenseValidator::from_public_key_bytes(&pk)
        .unwrap()
        .validate(key.as_bytes());
    assert!(license.is_ok());
}

// ── Validity window ──────────────────────────────────────────────

#[test]
fn expired_key_classified_expired() {
    let (sk, _) = test_keypair();
    let err = validator()
        .validate(make_expired_key(&sk).as_bytes())
        .unwrap_err();
    assert!(matches!(err, LicenseError::Expired(_)));
    assert_eq!(err.category(), FailureCategory::Expired);
}

#[test]
fn not_started_key_classified_expired() {
    let (sk, _) = test_keypair();
    let err = validator()
        .validate(make_future_key(&sk).as_bytes())
        .unwrap_err();
    assert!(matches!(err, LicenseError::NotStarted(_)));
    assert_eq!(err.category(), FailureCategory::Expired);
}

#[test]
fn expiry_boundary_is_inclusive() {
    let (sk, _) = test_keypair();
    let key = sign_key(&sk, &payload("lic-edge", NOW - DAY, Some(NOW)).to_string());
    assert!(validator().validate(key.as_bytes()).is_ok());
    let later = validator().with_fixed_time(NOW + 1);
    assert!(later.validate(key.as_bytes()).is_err());
}

// ── Invalid keys ─────────────────────────────────────────────────

#[test]
fn invalid_no_dot() {
    let err = validator().validate(b"nodothere").unwrap_err();
    assert!(matches!(err, LicenseError::InvalidKeyFormat(_)));
    assert_eq!(err.category(), FailureCategory::Invalid);
}

#[test]
fn invalid_three_parts() {
    let err = validator().validate(b"a.b.c").unwrap_err();
    assert!(matches!(err, LicenseError::InvalidKeyFormat(_)));
}

#[test]
fn invalid_not_utf8() {
    let err = validator().validate(&[0xff, 0xfe, b'.', 0x00]).unwrap_err();
    assert_eq!(err.category(), FailureCategory::Invalid);
}

#[test]
fn invalid_tampered_payload() {
    let (sk, _) = test_keypair();
    let key = make_current_key(&sk);
    let (payload_b64, sig_b64) = key.split_once('.').unwrap();
    let tampered = format!("X{}.{}", &payload_b64[1..], sig_b64);
    let err = validator().validate(tampered.as_bytes()).unwrap_err();
    assert_eq!(err.category(), FailureCategory::Invalid);
}

#[test]
fn invalid_foreign_signer() {
    let key = make_current_key(&foreign_keypair());
    let err = validator().validate(key.as_bytes()).unwrap_err();
    assert!(matches!(err, LicenseError::InvalidSignature));
}

#[test]
fn invalid_bad_base64() {
    let err = validator().validate(b"!!!.!!!").unwrap_err();
    assert_eq!(err.category(), FailureCategory::Invalid);
}

#[test]
fn invalid_json() {
    let (sk, _) = test_keypair();
    let key = sign_key(&sk, "not json at all");
    let err = validator().validate(key.as_bytes()).unwrap_err();
    assert!(matches!(err, LicenseError::InvalidPayload(_)));
}

#[test]
fn invalid_missing_fields() {
    let (sk, _) = test_keypair();
    let key = sign_key(&sk, r#"{"id":"lic-1"}"#);
    let err = validator().validate(key.as_bytes()).unwrap_err();
    assert!(matches!(err, LicenseError::InvalidPayload(_)));
}

#[test]
fn invalid_window_reversed() {
    let (sk, _) = test_keypair();
    let key = sign_key(&sk, &payload("lic-rev", NOW, Some(NOW - DAY)).to_string());
    let err = validator().validate(key.as_bytes()).unwrap_err();
    assert!(matches!(err, LicenseError::InvalidPayload(_)));
}

#[test]
fn oversized_key_rejected_before_decoding() {
    let raw = vec![b'a'; entitle_license::MAX_KEY_LEN + 1];
    let err = validator().validate(&raw).unwrap_err();
    assert!(matches!(err, LicenseError::InvalidKeyFormat(_)));
}

// ── Public keys ──────────────────────────────────────────────────

#[test]
fn public_key_from_base64() {
    use base64::{Engine, engine::general_purpose::STANDARD};
    let (_, pk) = test_keypair();
    let encoded = STANDARD.encode(pk);
    let key = verifying_key_from_base64(&encoded).unwrap();
    assert_eq!(key.to_bytes(), pk);
}

#[test]
fn public_key_wrong_length() {
    let err = verifying_key_from_base64("AAAA").unwrap_err();
    assert_eq!(err.category(), FailureCategory::Other);
}

// ── Serde ────────────────────────────────────────────────────────

#[test]
fn license_serialization_preserves_raw_key() {
    let (sk, _) = test_keypair();
    let key = make_current_key(&sk);
    let license = validator().validate(key.as_bytes()).unwrap();
    let json = serde_json::to_string(&license).unwrap();
    let restored: License = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, license);
    assert_eq!(restored.raw(), key);
}

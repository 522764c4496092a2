//! Signed license artifacts for Entitle.
//!
//! This crate handles:
//! - License key decoding and Ed25519 signature verification
//! - Validity window checks (not-yet-started and expired keys)
//! - Classification of validation failures
//! - The attribute map exposed to clients and its redaction policy
//!
//! # License Key Format
//!
//! Keys are formatted as: `base64url(payload).base64url(signature)`
//! The payload is a JSON object signed with Ed25519, containing:
//! - License id, issue time and validity window
//! - Customer details, seat count and feature flags
//! - SKU names and the trial marker

mod error;
mod key;
mod license;
mod redaction;
mod validator;

pub use error::{FailureCategory, LicenseError, LicenseResult};
pub use key::{MAX_KEY_LEN, decode, verifying_key_from_base64, verifying_key_from_bytes};
pub use license::{AttributeMap, Customer, Feature, Features, License, LicensePayload, keys};
pub use redaction::RedactionPolicy;
pub use validator::{LicenseValidator, SignedLicenseValidator};

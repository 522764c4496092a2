//! Shared helpers for HTTP API tests.

#![allow(dead_code)]

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use ed25519_dalek::{Signer, SigningKey};
use entitle_license::SignedLicenseValidator;
use entitle_server::{AppState, StaticSessionResolver, build_router};
use entitle_service::{
    Actor, EntitlementService, MemoryAuditRecorder, MemoryLicenseStore, ServiceConfig,
};
use serde_json::json;
use std::sync::Arc;

pub const ADMIN_TOKEN: &str = "admin-token";
pub const USER_TOKEN: &str = "user-token";

pub fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[9u8; 32])
}

pub fn sign(payload_json: &str) -> String {
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload_json.as_bytes());
    let signature = signing_key().sign(payload_b64.as_bytes());
    format!("{payload_b64}.{}", URL_SAFE_NO_PAD.encode(signature.to_bytes()))
}

/// A key valid for a day either side of now.
pub fn valid_key(id: &str) -> String {
    let now = unix_now();
    sign(
        &json!({
            "id": id,
            "issued_at": now - 86_400,
            "expires_at": now + 86_400,
            "customer": {
                "id": "cust-1",
                "name": "Katherine Johnson",
                "email": "kj@example.com",
                "company": "Orbital Mechanics"
            },
            "features": { "users": 500, "enabled": ["compliance"] },
            "sku_name": "Enterprise Edition",
            "sku_short_name": "E20"
        })
        .to_string(),
    )
}

pub fn expired_key() -> String {
    let now = unix_now();
    sign(
        &json!({
            "id": "lic-old",
            "issued_at": now - 90 * 86_400,
            "expires_at": now - 86_400,
            "customer": { "id": "c", "name": "n", "email": "e" }
        })
        .to_string(),
    )
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

pub struct TestServer {
    pub base: String,
    pub audit: Arc<MemoryAuditRecorder>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

/// Spin up the HTTP server on an OS-assigned port.
pub async fn spawn_test_server(config: ServiceConfig) -> TestServer {
    let audit = Arc::new(MemoryAuditRecorder::new());
    let service = EntitlementService::new(
        config,
        Arc::new(SignedLicenseValidator::new(signing_key().verifying_key())),
        Arc::new(MemoryLicenseStore::new()),
        audit.clone(),
    );
    let sessions = StaticSessionResolver::new()
        .with_token(ADMIN_TOKEN, Actor::system_admin("admin-1"))
        .with_token(USER_TOKEN, Actor::user("user-1"));

    let app = build_router(AppState::new(Arc::new(service), Arc::new(sessions)));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        audit,
    }
}

pub fn license_form(key: &str) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(key.as_bytes().to_vec()).file_name("license.key");
    reqwest::multipart::Form::new().part("license", part)
}

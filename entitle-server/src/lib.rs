//! HTTP API for license management.
//!
//! - `POST /api/v4/license`: multipart upload, attachment field `license`
//! - `DELETE /api/v4/license`: remove the active license
//! - `GET /api/v4/license/client?format=old`: attribute map for the caller

mod error;
mod session;

pub use error::ApiError;
pub use session::{SessionResolver, StaticSessionResolver};

use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, FromRequestParts, Multipart, Query, State};
use axum::http::request::Parts;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use entitle_license::{AttributeMap, LicensePayload};
use entitle_service::{Actor, EntitlementService, LicenseUpload, MalformedUpload};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

/// Multipart field carrying the license file.
pub const LICENSE_FIELD: &str = "license";

/// Shared state for the license routes.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<EntitlementService>,
    pub sessions: Arc<dyn SessionResolver>,
}

impl AppState {
    pub fn new(service: Arc<EntitlementService>, sessions: Arc<dyn SessionResolver>) -> Self {
        Self { service, sessions }
    }
}

/// The caller, as resolved by the state's [`SessionResolver`].
pub struct Caller(pub Actor);

impl FromRequestParts<AppState> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Caller(state.sessions.resolve(&parts.headers)))
    }
}

/// Body returned after a successful upload.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AddLicenseResponse {
    pub license: LicensePayload,
    /// Reconfiguration problems that did not prevent activation.
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Deserialize, Debug)]
pub struct ClientLicenseQuery {
    format: Option<String>,
}

fn require_session(actor: &Actor) -> Result<(), ApiError> {
    match actor.user_id() {
        Some(_) => Ok(()),
        None => Err(ApiError::Unauthorized("a valid session is required".to_string())),
    }
}

/// Pulls the `license` field out of the form. Parse failures are handed to
/// the service so they land in the audit trail.
async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Option<LicenseUpload>, MalformedUpload> {
    let mut multipart = multipart.map_err(|e| MalformedUpload(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| MalformedUpload(e.body_text()))?
    {
        if field.name() != Some(LICENSE_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| MalformedUpload(e.body_text()))?;
        debug!(?filename, len = bytes.len(), "received license attachment");
        return Ok(Some(LicenseUpload::new(filename, bytes.to_vec())));
    }
    Ok(None)
}

async fn add_license_handler(
    State(state): State<AppState>,
    Caller(actor): Caller,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AddLicenseResponse>, ApiError> {
    require_session(&actor)?;
    let upload = read_upload(multipart).await;
    let activation = state.service.add_license(&actor, upload).await?;
    Ok(Json(AddLicenseResponse {
        license: activation.license.payload().clone(),
        warnings: activation.warnings,
    }))
}

async fn remove_license_handler(
    State(state): State<AppState>,
    Caller(actor): Caller,
) -> Result<Json<StatusResponse>, ApiError> {
    require_session(&actor)?;
    state.service.remove_license(&actor).await?;
    Ok(Json(StatusResponse {
        status: "OK".to_string(),
    }))
}

async fn client_license_handler(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Query(query): Query<ClientLicenseQuery>,
) -> Result<Json<AttributeMap>, ApiError> {
    match query.format.as_deref() {
        Some("old") => {}
        Some(other) => {
            return Err(ApiError::BadRequest(format!(
                "unsupported format {other:?}, expected \"old\""
            )));
        }
        None => {
            return Err(ApiError::BadRequest(
                "format query parameter is required".to_string(),
            ));
        }
    }
    Ok(Json(state.service.license_view(&actor).await?))
}

/// Build the HTTP API router for the given state.
pub fn build_router(state: AppState) -> Router {
    let max_body = state.service.config().max_file_size;
    Router::new()
        .route(
            "/api/v4/license",
            post(add_license_handler).delete(remove_license_handler),
        )
        .route("/api/v4/license/client", get(client_license_handler))
        .layer(DefaultBodyLimit::max(max_body))
        .with_state(state)
}

//! Maps service errors to structured HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use entitle_service::EntitlementError;
use thiserror::Error;

/// Errors returned by the license endpoints.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Failure reported by the entitlement service.
    #[error(transparent)]
    Entitlement(#[from] EntitlementError),

    /// The request itself was malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No valid session accompanied the request.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Entitlement(e) => match e {
                EntitlementError::MalformedUpload(_)
                | EntitlementError::MissingArtifact
                | EntitlementError::ValidationExpired(_)
                | EntitlementError::ValidationInvalid(_)
                | EntitlementError::ValidationOtherFailure(_) => StatusCode::BAD_REQUEST,
                EntitlementError::PermissionDenied(_) => StatusCode::FORBIDDEN,
                EntitlementError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Stable error code echoed in the response body.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Entitlement(e) => e.code(),
            Self::BadRequest(_) => "api.bad_request",
            Self::Unauthorized(_) => "api.unauthorized",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
                "status": status.as_u16(),
            }
        });
        (status, axum::Json(body)).into_response()
    }
}

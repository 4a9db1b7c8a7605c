//! Request-boundary error mapping.
//!
//! Every error leaving a handler becomes `{"error": "..."}` JSON with
//! the status the taxonomy assigns. Storage failures are logged and
//! collapsed to a bare 500 so query details never reach clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::types::StarfallError;

/// Wrapper that lets handlers return `Result<_, ApiError>` with `?`.
#[derive(Debug)]
pub struct ApiError(pub StarfallError);

impl From<StarfallError> for ApiError {
    fn from(err: StarfallError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            StarfallError::InvalidInput(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            StarfallError::UserNotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            StarfallError::InsufficientFunds { .. } => {
                (StatusCode::BAD_REQUEST, self.0.to_string())
            }
            StarfallError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.0.to_string()),
            StarfallError::Forbidden => (StatusCode::FORBIDDEN, self.0.to_string()),
            StarfallError::Storage(err) => {
                error!(error = %err, "Storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

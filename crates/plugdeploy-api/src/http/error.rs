//! Application error type mapping to the error envelope.
//!
//! Every failure answers `400` with `{"error": message}`. Only validation
//! and storage messages reach the caller verbatim; anything else is logged
//! and reported as "Unexpected Error".

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use plugdeploy_infra::auth::webhook::WebhookError;
use plugdeploy_types::error::{AuthError, DeployError};

pub const MUST_LOG_IN: &str = "Must log in";
pub const UNEXPECTED_ERROR: &str = "Unexpected Error";

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Missing or rejected credential.
    Unauthorized(String),
    /// Request body could not be read as the expected payload.
    BadRequest(String),
    /// Pipeline failure.
    Deploy(DeployError),
}

impl From<DeployError> for AppError {
    fn from(e: DeployError) -> Self {
        AppError::Deploy(e)
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Unauthorized(e.to_string())
    }
}

/// A bad or missing signature is a validation failure; a key that HMAC
/// cannot use is a server fault.
impl From<WebhookError> for AppError {
    fn from(e: WebhookError) -> Self {
        match e {
            WebhookError::InvalidKey(_) => AppError::Deploy(DeployError::Unexpected(e.to_string())),
            _ => AppError::Deploy(DeployError::Validation(e.to_string())),
        }
    }
}

impl AppError {
    /// Message safe to return to the caller.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Unauthorized(_) => MUST_LOG_IN.to_string(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Deploy(DeployError::Validation(msg)) => msg.clone(),
            AppError::Deploy(e @ DeployError::Storage { .. }) => e.to_string(),
            AppError::Deploy(_) => UNEXPECTED_ERROR.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Unauthorized(reason) => {
                tracing::info!(reason = %reason, "rejected unauthenticated request");
            }
            AppError::BadRequest(reason) => {
                tracing::info!(reason = %reason, "rejected malformed request");
            }
            AppError::Deploy(e) if e.is_user_visible() => {
                tracing::warn!(error = %e, "deployment request failed");
            }
            AppError::Deploy(e) => {
                tracing::error!(error = %e, "unexpected deployment failure");
            }
        }

        let body = json!({ "error": self.public_message() });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

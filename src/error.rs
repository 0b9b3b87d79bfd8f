//! Gateway error types with Axum response mapping.
//!
//! Every variant renders as `{"error": "..."}` so the frontend only ever
//! has to handle one failure shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::backend::client::UpstreamError;

pub const NO_TOKEN_MESSAGE: &str = "No authentication token found";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No authentication token found")]
    AuthenticationMissing,

    #[error("Unauthorized: invalid or missing app key")]
    InvalidAppKey,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("{0}")]
    LoginFailed(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("reCAPTCHA verification failed")]
    CaptchaRejected,

    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Map an upstream failure, using `fallback` when the backend gave no message.
    pub fn from_upstream(err: UpstreamError, fallback: &str) -> Self {
        match err {
            UpstreamError::Status { status, message } => AppError::Upstream {
                status: if status.is_client_error() || status.is_server_error() {
                    status
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                },
                message: message.unwrap_or_else(|| fallback.to_string()),
            },
            UpstreamError::Timeout => AppError::Timeout,
            UpstreamError::Transport(e) | UpstreamError::Decode(e) => {
                tracing::error!("Upstream call failed: {}", e);
                AppError::Upstream {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: fallback.to_string(),
                }
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AuthenticationMissing
            | AppError::InvalidAppKey
            | AppError::InvalidToken
            | AppError::LoginFailed(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) | AppError::CaptchaRejected => StatusCode::BAD_REQUEST,
            AppError::Upstream { status, .. } => *status,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

/// Response for a panic caught at the router boundary.
pub fn panic_response(_err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    tracing::error!("Handler panicked");
    AppError::Internal("Internal server error".into()).into_response()
}

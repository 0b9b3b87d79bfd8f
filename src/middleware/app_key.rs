//! Application Key gate: require `x-app-key` to match the configured key.
//!
//! Runs before token resolution, so a bad key never reaches the backend.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::AppState;
use crate::audit;
use crate::backend::client::APP_KEY_HEADER;
use crate::error::AppError;

/// Constant-time comparison of a presented key with the expected key.
pub fn app_key_matches(presented: Option<&str>, expected: &str) -> bool {
    match presented {
        Some(key) if !expected.is_empty() => key.as_bytes().ct_eq(expected.as_bytes()).into(),
        _ => false,
    }
}

/// Axum middleware that rejects requests without the exact Application Key.
pub async fn require_app_key(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = req
        .headers()
        .get(APP_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if !app_key_matches(presented, &state.config.app_key) {
        audit::access_denied_event(
            req.uri().path(),
            if presented.is_some() {
                "invalid app key"
            } else {
                "missing app key"
            },
            None,
        );
        return Err(AppError::InvalidAppKey);
    }
    Ok(next.run(req).await)
}

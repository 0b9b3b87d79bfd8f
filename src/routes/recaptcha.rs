//! POST /api/recaptcha/verify

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use std::sync::Arc;

use crate::AppState;
use crate::backend::recaptcha::verify_token;
use crate::error::AppError;
use crate::routes::proxy::parse_json_body;
use crate::types::RecaptchaResponse;

const VERIFY_FAILED: &str = "reCAPTCHA verification failed";

/// Verify a client reCAPTCHA token server-side.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<RecaptchaResponse>, AppError> {
    let body = parse_json_body(&body)?;
    let token = body
        .get("token")
        .and_then(|v| v.as_str())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("reCAPTCHA token is required".into()))?;

    if state.config.recaptcha_secret.is_empty() {
        return Err(AppError::NotConfigured("reCAPTCHA"));
    }

    let verdict = verify_token(state.backend.http(), &state.config, token)
        .await
        .map_err(|e| AppError::from_upstream(e, VERIFY_FAILED))?;

    if !verdict.passes() {
        tracing::info!(
            score = verdict.score,
            action = verdict.action.as_deref().unwrap_or("-"),
            errors = ?verdict.error_codes,
            "reCAPTCHA rejected"
        );
        return Err(AppError::CaptchaRejected);
    }

    Ok(Json(RecaptchaResponse {
        success: true,
        score: verdict.score,
    }))
}

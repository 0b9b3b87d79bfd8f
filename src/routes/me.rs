//! GET /api/auth/me and GET /api/staff/me

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use std::sync::Arc;

use crate::AppState;
use crate::error::AppError;
use crate::token::{TokenRequirement, resolve_bearer};
use crate::types::UserClaimsResponse;

/// Claims snapshot of the general token.
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<UserClaimsResponse>, AppError> {
    snapshot(&state, &headers, TokenRequirement::General)
}

/// Claims snapshot of the staff token.
pub async fn staff_me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<UserClaimsResponse>, AppError> {
    snapshot(&state, &headers, TokenRequirement::Staff)
}

/// Decoded fresh on every call, so a replaced token is never stale here.
fn snapshot(
    state: &AppState,
    headers: &HeaderMap,
    requirement: TokenRequirement,
) -> Result<Json<UserClaimsResponse>, AppError> {
    let token = resolve_bearer(headers, requirement).ok_or(AppError::AuthenticationMissing)?;

    let claims = state.claims.decode(&token).map_err(|e| {
        tracing::debug!("Rejecting token in claims snapshot: {}", e);
        AppError::InvalidToken
    })?;

    Ok(Json(claims.into()))
}

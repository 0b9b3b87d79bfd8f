//! POST /api/auth/logout and POST /api/staff/logout

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::AppState;
use crate::audit;
use crate::token::{TokenKind, delete_cookie, read_cookie};
use crate::types::SuccessResponse;

pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    logout_from(&state, &headers, TokenKind::General, "general")
}

pub async fn staff_logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    logout_from(&state, &headers, TokenKind::Staff, "staff")
}

/// Expire the realm's cookie. Always succeeds, even without a session.
fn logout_from(state: &AppState, headers: &HeaderMap, kind: TokenKind, realm: &str) -> Response {
    // Best-effort extraction before the cookie goes away
    let username = read_cookie(headers, kind)
        .and_then(|token| state.claims.read(&token))
        .and_then(|claims| claims.username);

    let mut response = Json(SuccessResponse { success: true }).into_response();
    if let Some(cookie) = delete_cookie(kind, state.cookie_secure(kind)) {
        response.headers_mut().append(SET_COOKIE, cookie);
    }

    audit::authentication_event(
        audit::ACTIVITY_LOGOFF,
        audit::STATUS_SUCCESS,
        audit::SEVERITY_INFORMATIONAL,
        realm,
        username.as_deref(),
        "User logged out",
    );

    response
}

//! POST /api/auth/login and POST /api/staff/login

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::Method;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::AppState;
use crate::audit;
use crate::backend::client::{Payload, UpstreamError, UpstreamRequest, extract_token};
use crate::error::AppError;
use crate::routes::proxy::parse_json_body;
use crate::token::{TokenKind, set_cookie};
use crate::types::SuccessResponse;

const LOGIN_FAILED: &str = "Login failed";

/// Where a login lands: backend endpoint, cookie, and audit realm.
#[derive(Debug, Clone, Copy)]
pub struct LoginRealm {
    pub upstream: &'static str,
    pub kind: TokenKind,
    pub name: &'static str,
}

pub const GENERAL: LoginRealm = LoginRealm {
    upstream: "/auth/login",
    kind: TokenKind::General,
    name: "general",
};

pub const STAFF: LoginRealm = LoginRealm {
    upstream: "/staff/auth/login",
    kind: TokenKind::Staff,
    name: "staff",
};

/// Citizen/admin login.
pub async fn login(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, AppError> {
    login_with(&state, GENERAL, &body).await
}

/// Field-officer login.
pub async fn staff_login(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, AppError> {
    login_with(&state, STAFF, &body).await
}

/// Exchange credentials with the backend and store the issued token in
/// the realm's cookie. No cookie is set on failure.
pub async fn login_with(
    state: &AppState,
    realm: LoginRealm,
    body: &Bytes,
) -> Result<Response, AppError> {
    let credentials = parse_json_body(body)?;
    let username = credentials
        .get("username")
        .and_then(|v| v.as_str())
        .map(String::from);

    let request =
        UpstreamRequest::new(Method::POST, realm.upstream).payload(Payload::Json(credentials));

    let resp = match state.backend.send(request).await {
        Ok(resp) => resp,
        Err(e) => {
            audit::authentication_event(
                audit::ACTIVITY_LOGON,
                audit::STATUS_FAILURE,
                audit::SEVERITY_MEDIUM,
                realm.name,
                username.as_deref(),
                &format!("Login failed: {e}"),
            );
            return Err(match e {
                UpstreamError::Status { message, .. } => {
                    AppError::LoginFailed(message.unwrap_or_else(|| LOGIN_FAILED.into()))
                }
                other => AppError::from_upstream(other, LOGIN_FAILED),
            });
        }
    };

    let token = extract_token(&resp.body)
        .ok_or_else(|| AppError::Internal("Login response did not include a token".into()))?;
    let cookie = set_cookie(realm.kind, &token, state.cookie_secure(realm.kind))
        .ok_or_else(|| AppError::Internal(LOGIN_FAILED.into()))?;

    audit::authentication_event(
        audit::ACTIVITY_LOGON,
        audit::STATUS_SUCCESS,
        audit::SEVERITY_INFORMATIONAL,
        realm.name,
        username.as_deref(),
        "Login succeeded",
    );

    let mut response = Json(SuccessResponse { success: true }).into_response();
    response.headers_mut().append(SET_COOKIE, cookie);
    Ok(response)
}

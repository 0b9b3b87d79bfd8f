//! GET /api/registry/household

use axum::Json;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, Uri};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::AppState;
use crate::audit;
use crate::backend::registry::RegistryClient;
use crate::error::AppError;
use crate::routes::proxy::{filter_query, require_fields};
use crate::token::{TokenKind, TokenRequirement, read_cookie, resolve_bearer, set_cookie};

const HOUSEHOLD_QUERY: &[&str] = &["householdId", "memberId"];
const HOUSEHOLD_FAILED: &str = "Failed to fetch household";

/// Household lookup against the registry, using the cached registry token.
///
/// A freshly issued registry token is stored in its cookie whether or not
/// the lookup itself succeeds.
pub async fn household(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, AppError> {
    resolve_bearer(&headers, TokenRequirement::Staff).ok_or(AppError::AuthenticationMissing)?;

    let registry = RegistryClient::new(state.backend.http(), &state.config)
        .ok_or(AppError::NotConfigured("Household registry"))?;

    let query = filter_query(&uri, HOUSEHOLD_QUERY);
    require_fields(&["householdId"], |f| query.iter().any(|(k, _)| k == f))?;

    let token = registry
        .ensure_token(read_cookie(&headers, TokenKind::Registry))
        .await
        .map_err(|e| AppError::from_upstream(e, HOUSEHOLD_FAILED))?;

    let refreshed = if token.refreshed {
        audit::authentication_event(
            audit::ACTIVITY_SERVICE_TICKET,
            audit::STATUS_SUCCESS,
            audit::SEVERITY_INFORMATIONAL,
            "registry",
            None,
            "Registry token refreshed",
        );
        set_cookie(
            TokenKind::Registry,
            &token.value,
            state.cookie_secure(TokenKind::Registry),
        )
    } else {
        None
    };

    let mut response = match registry.household(&token.value, &query).await {
        Ok(resp) => (resp.status, Json(resp.body)).into_response(),
        Err(e) => AppError::from_upstream(e, HOUSEHOLD_FAILED).into_response(),
    };
    if let Some(cookie) = refreshed {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    Ok(response)
}

//! Fallback for page navigations: relays to the frontend server.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, USER_AGENT};
use axum::http::{HeaderName, Method};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::AppState;
use crate::error::AppError;

const FORWARDED_HEADERS: [HeaderName; 4] = [ACCEPT, ACCEPT_LANGUAGE, COOKIE, USER_AGENT];

/// Relay GET/HEAD navigations that passed the gate to `FRONTEND_UPSTREAM`.
///
/// Without an upstream configured every unmatched path is a 404.
pub async fn relay(State(state): State<Arc<AppState>>, req: Request) -> Result<Response, AppError> {
    let Some(upstream) = state.config.frontend_upstream.as_deref() else {
        return Err(AppError::NotFound);
    };
    if req.method() != Method::GET && req.method() != Method::HEAD {
        return Err(AppError::NotFound);
    }

    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("{upstream}{path_and_query}");

    let mut builder = state.backend.http().request(req.method().clone(), url);
    for name in FORWARDED_HEADERS {
        if let Some(value) = req.headers().get(&name) {
            builder = builder.header(name, value);
        }
    }

    let resp = builder.send().await.map_err(|e| {
        if e.is_timeout() {
            AppError::Timeout
        } else {
            tracing::error!("Frontend relay failed: {}", e);
            AppError::Internal("Frontend unavailable".into())
        }
    })?;

    let status = resp.status();
    let content_type = resp.headers().get(CONTENT_TYPE).cloned();
    let bytes = resp.bytes().await.map_err(|e| {
        if e.is_timeout() {
            AppError::Timeout
        } else {
            AppError::Internal(format!("Frontend body unreadable: {e}"))
        }
    })?;

    let mut response = (status, Body::from(bytes)).into_response();
    if let Some(ct) = content_type {
        response.headers_mut().insert(CONTENT_TYPE, ct);
    }
    Ok(response)
}

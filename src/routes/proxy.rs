//! Resource proxy handlers.
//!
//! Each backend resource is described by a static `ProxyRoute`; one generic
//! handler resolves the bearer token, validates input, forwards to the
//! backend and translates the response.

use axum::Json;
use axum::Router;
use axum::body::{Body, Bytes, to_bytes};
use axum::extract::{Path, Query, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodFilter, MethodRouter, on};
use serde_json::Value;
use std::sync::Arc;

use crate::AppState;
use crate::backend::client::{Payload, UpstreamRequest, is_mutating};
use crate::error::AppError;
use crate::token::{TokenRequirement, resolve_bearer};

/// Largest inbound body forwarded upstream (document uploads included).
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Static description of one proxied resource.
#[derive(Debug)]
pub struct ProxyRoute {
    /// Backend path; `{id}` is replaced by the inbound path parameter.
    pub upstream: &'static str,
    pub token: TokenRequirement,
    /// Query parameters forwarded upstream, in inbound order.
    pub query: &'static [&'static str],
    /// Fields that must be present (query for GET, JSON body otherwise).
    pub required: &'static [&'static str],
    /// Error message when the backend gives none.
    pub failure: &'static str,
}

static ADMIN_DASHBOARD: ProxyRoute = ProxyRoute {
    upstream: "/admin/dashboard",
    token: TokenRequirement::General,
    query: &["fromDate", "toDate", "locationCode"],
    required: &[],
    failure: "Failed to fetch dashboard",
};

static ADMIN_REPORTS: ProxyRoute = ProxyRoute {
    upstream: "/admin/reports",
    token: TokenRequirement::General,
    query: &["page", "limit", "reportType", "fromDate", "toDate", "locationCode"],
    required: &[],
    failure: "Failed to fetch reports",
};

static ADMIN_USERS_LIST: ProxyRoute = ProxyRoute {
    upstream: "/admin/users",
    token: TokenRequirement::General,
    query: &["page", "limit", "search", "role"],
    required: &[],
    failure: "Failed to fetch users",
};

static ADMIN_USERS_CREATE: ProxyRoute = ProxyRoute {
    upstream: "/admin/users",
    token: TokenRequirement::General,
    query: &[],
    required: &["username", "role"],
    failure: "Failed to create user",
};

static BENEFICIARY_PROFILE: ProxyRoute = ProxyRoute {
    upstream: "/beneficiary/profile",
    token: TokenRequirement::General,
    query: &[],
    required: &[],
    failure: "Failed to fetch profile",
};

static GRIEVANCE_CREATE: ProxyRoute = ProxyRoute {
    upstream: "/beneficiary/grievances",
    token: TokenRequirement::General,
    query: &[],
    required: &["subject", "description"],
    failure: "Failed to submit grievance",
};

static STAFF_BENEFICIARIES_LIST: ProxyRoute = ProxyRoute {
    upstream: "/staff/beneficiaries",
    token: TokenRequirement::Staff,
    query: &["page", "limit"],
    required: &[],
    failure: "Failed to fetch beneficiaries",
};

static STAFF_BENEFICIARIES_CREATE: ProxyRoute = ProxyRoute {
    upstream: "/staff/beneficiaries",
    token: TokenRequirement::Staff,
    query: &[],
    required: &["name"],
    failure: "Failed to create beneficiary",
};

static BENEFICIARY_DETAIL: ProxyRoute = ProxyRoute {
    upstream: "/staff/beneficiaries/{id}",
    token: TokenRequirement::Either,
    query: &[],
    required: &[],
    failure: "Failed to fetch beneficiary",
};

static BENEFICIARY_UPDATE: ProxyRoute = ProxyRoute {
    upstream: "/staff/beneficiaries/{id}",
    token: TokenRequirement::Staff,
    query: &[],
    required: &[],
    failure: "Failed to update beneficiary",
};

static BENEFICIARY_DOCUMENTS: ProxyRoute = ProxyRoute {
    upstream: "/staff/beneficiaries/{id}/documents",
    token: TokenRequirement::Staff,
    query: &[],
    required: &[],
    failure: "Failed to upload documents",
};

static EMPOWERMENT_ASSESSMENTS: ProxyRoute = ProxyRoute {
    upstream: "/staff/empowerment-assessments",
    token: TokenRequirement::Staff,
    query: &["beneficiaryId", "page", "limit"],
    required: &["beneficiaryId"],
    failure: "Failed to fetch empowerment assessments",
};

/// Resource routes, relative to `/api`.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/dashboard", proxy(MethodFilter::GET, &ADMIN_DASHBOARD))
        .route("/admin/reports", proxy(MethodFilter::GET, &ADMIN_REPORTS))
        .route(
            "/admin/users",
            proxy(MethodFilter::GET, &ADMIN_USERS_LIST)
                .merge(proxy(MethodFilter::POST, &ADMIN_USERS_CREATE)),
        )
        .route(
            "/beneficiary/profile",
            proxy(MethodFilter::GET, &BENEFICIARY_PROFILE),
        )
        .route(
            "/beneficiary/grievances",
            proxy(MethodFilter::POST, &GRIEVANCE_CREATE),
        )
        .route(
            "/staff/beneficiaries",
            proxy(MethodFilter::GET, &STAFF_BENEFICIARIES_LIST)
                .merge(proxy(MethodFilter::POST, &STAFF_BENEFICIARIES_CREATE)),
        )
        .route(
            "/staff/beneficiaries/{id}",
            proxy(MethodFilter::GET, &BENEFICIARY_DETAIL)
                .merge(proxy(MethodFilter::PUT, &BENEFICIARY_UPDATE)),
        )
        .route(
            "/staff/beneficiaries/{id}/documents",
            proxy(MethodFilter::POST, &BENEFICIARY_DOCUMENTS),
        )
        .route(
            "/staff/empowerment",
            proxy(MethodFilter::GET, &EMPOWERMENT_ASSESSMENTS),
        )
}

fn proxy(filter: MethodFilter, route: &'static ProxyRoute) -> MethodRouter<Arc<AppState>> {
    if route.upstream.contains("{id}") {
        on(
            filter,
            move |State(state): State<Arc<AppState>>, Path(id): Path<String>, req: Request| {
                forward(state, route, Some(id), req)
            },
        )
    } else {
        on(
            filter,
            move |State(state): State<Arc<AppState>>, req: Request| {
                forward(state, route, None, req)
            },
        )
    }
}

/// Authenticate, validate and forward one request.
pub async fn forward(
    state: Arc<AppState>,
    route: &'static ProxyRoute,
    id: Option<String>,
    req: Request,
) -> Result<Response, AppError> {
    let (parts, body) = req.into_parts();

    let token =
        resolve_bearer(&parts.headers, route.token).ok_or(AppError::AuthenticationMissing)?;

    let query = filter_query(&parts.uri, route.query);
    let payload = if is_mutating(&parts.method) {
        read_payload(&parts.headers, body).await?
    } else {
        Payload::Empty
    };

    match &payload {
        Payload::Json(value) => require_fields(route.required, |f| json_has(value, f))?,
        Payload::Empty => {
            if is_mutating(&parts.method) {
                require_fields(route.required, |_| false)?
            } else {
                require_fields(route.required, |f| query.iter().any(|(k, _)| k == f))?
            }
        }
        // Opaque bodies only pass through on routes with nothing to check
        Payload::Raw { .. } => require_fields(route.required, |_| false)?,
    }

    let path = match id {
        Some(id) => route.upstream.replace("{id}", &urlencoding::encode(&id)),
        None => route.upstream.to_string(),
    };

    let upstream = UpstreamRequest::new(parts.method, path)
        .bearer(token)
        .query(query)
        .payload(payload);

    match state.backend.send(upstream).await {
        Ok(resp) => Ok((resp.status, Json(resp.body)).into_response()),
        Err(e) => Err(AppError::from_upstream(e, route.failure)),
    }
}

/// Whitelisted, non-empty query pairs in inbound order.
pub fn filter_query(uri: &Uri, allowed: &[&str]) -> Vec<(String, String)> {
    if allowed.is_empty() {
        return Vec::new();
    }
    Query::<Vec<(String, String)>>::try_from_uri(uri)
        .map(|Query(pairs)| pairs)
        .unwrap_or_default()
        .into_iter()
        .filter(|(k, v)| !v.is_empty() && allowed.contains(&k.as_str()))
        .collect()
}

/// 400 for the first required field `present` rejects.
pub fn require_fields(
    required: &[&str],
    present: impl Fn(&str) -> bool,
) -> Result<(), AppError> {
    match required.iter().find(|&&f| !present(f)) {
        Some(field) => Err(AppError::BadRequest(format!("{field} is required"))),
        None => Ok(()),
    }
}

fn json_has(body: &Value, field: &str) -> bool {
    match body.get(field) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

/// Parse a JSON request body into the error envelope's terms.
pub fn parse_json_body(bytes: &Bytes) -> Result<Value, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(bytes).map_err(|_| AppError::BadRequest("Invalid JSON body".into()))
}

/// Read an inbound body for forwarding.
///
/// Multipart and other non-JSON bodies pass through untouched.
pub async fn read_payload(headers: &HeaderMap, body: Body) -> Result<Payload, AppError> {
    let bytes = to_bytes(body, BODY_LIMIT)
        .await
        .map_err(|_| AppError::BadRequest("Request body too large or unreadable".into()))?;
    if bytes.is_empty() {
        return Ok(Payload::Empty);
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json");

    if content_type.starts_with("application/json") {
        parse_json_body(&bytes).map(Payload::Json)
    } else {
        Ok(Payload::Raw {
            content_type: content_type.to_string(),
            bytes,
        })
    }
}

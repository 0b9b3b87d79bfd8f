//! Request Gate: role-based redirects for page navigations.
//!
//! Facts come from the `accessToken` and `staffAccessToken` cookies via the
//! claim reader. An undecodable or missing token is the same as no claims.
//! Rules, in order:
//!
//! 1. admin path and not admin → admin fallback
//! 2. staff path and staff role is not the allowed one → staff fallback
//! 3. admin on a staff path → admin fallback
//! 4. otherwise continue

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use std::sync::Arc;

use crate::AppState;
use crate::audit;
use crate::backend::jwt::ClaimReader;
use crate::config::Config;
use crate::token::{TokenKind, read_cookie};

/// Static route sets and redirect targets.
#[derive(Debug, Clone)]
pub struct GatePolicy {
    pub admin_role: String,
    pub staff_role: String,
    pub admin_paths: Vec<String>,
    pub staff_paths: Vec<String>,
    pub admin_fallback: String,
    pub staff_fallback: String,
}

/// Per-request facts derived from the token cookies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateFacts {
    pub is_admin: bool,
    pub staff_role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Continue,
    Redirect(String),
}

impl GatePolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            admin_role: config.admin_role.clone(),
            staff_role: config.staff_role.clone(),
            admin_paths: config.admin_paths.clone(),
            staff_paths: config.staff_paths.clone(),
            admin_fallback: config.admin_fallback_path.clone(),
            staff_fallback: config.staff_fallback_path.clone(),
        }
    }

    /// Decode both token cookies into gate facts.
    pub fn facts(&self, headers: &HeaderMap, reader: &ClaimReader) -> GateFacts {
        let role_of = |kind| {
            read_cookie(headers, kind)
                .and_then(|token| reader.read(&token))
                .and_then(|claims| claims.role_name().map(String::from))
        };

        GateFacts {
            is_admin: role_of(TokenKind::General).is_some_and(|r| r == self.admin_role),
            staff_role: role_of(TokenKind::Staff),
        }
    }

    /// Apply the gate rules to a path, matched in its normalized form.
    pub fn evaluate(&self, path: &str, facts: &GateFacts) -> GateDecision {
        let path = normalize_path(path);
        let path = path.as_str();
        let in_admin = matches_any(path, &self.admin_paths);
        let in_staff = matches_any(path, &self.staff_paths);

        if in_admin && !facts.is_admin {
            return GateDecision::Redirect(self.admin_fallback.clone());
        }
        if in_staff && facts.staff_role.as_deref() != Some(self.staff_role.as_str()) {
            return GateDecision::Redirect(self.staff_fallback.clone());
        }
        if facts.is_admin && in_staff {
            return GateDecision::Redirect(self.admin_fallback.clone());
        }
        GateDecision::Continue
    }
}

/// Percent-decode, collapse empty and `.` segments, and resolve `..`, so
/// `/%61dmin`, `//admin` and `/staff/../admin` all read as `/admin`.
fn normalize_path(raw: &str) -> String {
    let decoded = urlencoding::decode_binary(raw.as_bytes());
    let decoded = String::from_utf8_lossy(&decoded);

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Prefix match on path-segment boundaries.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn matches_any(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|p| matches_prefix(path, p))
}

/// Axum middleware applying the gate to every request.
pub async fn request_gate(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let facts = state.gate.facts(req.headers(), &state.claims);

    match state.gate.evaluate(req.uri().path(), &facts) {
        GateDecision::Continue => next.run(req).await,
        GateDecision::Redirect(target) => {
            audit::access_denied_event(req.uri().path(), "role not permitted", Some(&target));
            Redirect::temporary(&target).into_response()
        }
    }
}

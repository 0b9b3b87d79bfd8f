//! Bearer token storage.
//!
//! Server side the tokens live in HTTP-only cookies: `read_cookie` and
//! `has_cookie` look at the inbound `Cookie` header, `set_cookie` and
//! `delete_cookie` build `Set-Cookie` values for the response. The
//! multi-backend store used by non-browser clients is in [`store`].

pub mod store;

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::{HeaderMap, HeaderValue};

const DAY_SECS: u64 = 24 * 3600;

/// The three bearer tokens the gateway keeps in cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Citizen/admin token issued by the backend login.
    General,
    /// Field-officer token issued by the staff login.
    Staff,
    /// Household registry service token.
    Registry,
}

impl TokenKind {
    pub fn cookie_name(self) -> &'static str {
        match self {
            TokenKind::General => "accessToken",
            TokenKind::Staff => "staffAccessToken",
            TokenKind::Registry => "wbbAuthToken",
        }
    }

    pub fn max_age_secs(self) -> u64 {
        match self {
            TokenKind::General | TokenKind::Staff => 7 * DAY_SECS,
            TokenKind::Registry => DAY_SECS,
        }
    }
}

/// Which cookie(s) a route accepts before falling back to the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRequirement {
    General,
    Staff,
    /// General first, then staff.
    Either,
}

impl TokenRequirement {
    fn kinds(self) -> &'static [TokenKind] {
        match self {
            TokenRequirement::General => &[TokenKind::General],
            TokenRequirement::Staff => &[TokenKind::Staff],
            TokenRequirement::Either => &[TokenKind::General, TokenKind::Staff],
        }
    }
}

/// Read a token cookie from the inbound headers. Empty values count as absent.
pub fn read_cookie(headers: &HeaderMap, kind: TokenKind) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|header| parse_cookie(header, kind.cookie_name()))
        .filter(|v| !v.is_empty())
        .map(String::from)
}

pub fn has_cookie(headers: &HeaderMap, kind: TokenKind) -> bool {
    read_cookie(headers, kind).is_some()
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_header(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

/// Resolve the bearer token for a route: cookies first, header fallback.
pub fn resolve_bearer(headers: &HeaderMap, requirement: TokenRequirement) -> Option<String> {
    requirement
        .kinds()
        .iter()
        .find_map(|kind| read_cookie(headers, *kind))
        .or_else(|| bearer_header(headers))
}

/// `Set-Cookie` value storing `value` under the token's cookie name.
pub fn set_cookie(kind: TokenKind, value: &str, secure: bool) -> Option<HeaderValue> {
    let mut parts = vec![
        format!("{}={}", kind.cookie_name(), value),
        format!("Max-Age={}", kind.max_age_secs()),
        "Path=/".into(),
        "HttpOnly".into(),
        "SameSite=Lax".into(),
    ];
    if secure {
        parts.push("Secure".into());
    }
    to_header_value(parts)
}

/// `Set-Cookie` value that expires the token's cookie.
pub fn delete_cookie(kind: TokenKind, secure: bool) -> Option<HeaderValue> {
    let mut parts = vec![
        format!("{}=", kind.cookie_name()),
        "Max-Age=0".into(),
        "Path=/".into(),
        "HttpOnly".into(),
        "SameSite=Lax".into(),
    ];
    if secure {
        parts.push("Secure".into());
    }
    to_header_value(parts)
}

fn to_header_value(parts: Vec<String>) -> Option<HeaderValue> {
    match HeaderValue::from_str(&parts.join("; ")) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::error!("Refusing to emit malformed Set-Cookie: {}", e);
            None
        }
    }
}

/// Parse a specific cookie from a Cookie header value.
fn parse_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    for part in header.split(';') {
        let trimmed = part.trim();
        if let Some(value) = trimmed.strip_prefix(name)
            && let Some(value) = value.strip_prefix('=')
        {
            return Some(value);
        }
    }
    None
}

//! Backend REST client.
//!
//! All outbound calls go through one `reqwest::Client` built with the
//! shared timeout, and every response is decoded here into either an
//! `UpstreamResponse` or a tagged `UpstreamError`.

use axum::body::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;

use crate::config::Config;

pub const APP_KEY_HEADER: &str = "x-app-key";

/// Build the shared HTTP client with the gateway's single timeout policy.
pub fn build_http_client(config: &Config) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(config.upstream_timeout)
        .build()
}

/// Body forwarded to the backend.
#[derive(Debug, Clone)]
pub enum Payload {
    Empty,
    Json(Value),
    /// Forwarded byte-for-byte (multipart uploads keep their boundary).
    Raw { content_type: String, bytes: Bytes },
}

/// One outbound call to the beneficiary backend.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub query: Vec<(String, String)>,
    pub payload: Payload,
}

impl UpstreamRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            bearer: None,
            query: Vec::new(),
            payload: Payload::Empty,
        }
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }
}

/// Successful backend response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Client for the configured backend base URL.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    app_key: String,
}

impl BackendClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            base_url: config.api_base_url.clone(),
            app_key: config.app_key.clone(),
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Send a request to `{base_url}{path}`.
    ///
    /// Mutating methods carry the Application Key header.
    pub async fn send(&self, req: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let url = format!("{}{}", self.base_url, req.path);
        let mutating = is_mutating(&req.method);
        let mut builder = self.http.request(req.method, url);

        if let Some(token) = req.bearer {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if mutating {
            builder = builder.header(APP_KEY_HEADER, &self.app_key);
        }
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        builder = match req.payload {
            Payload::Empty => builder,
            Payload::Json(value) => builder.json(&value),
            Payload::Raw {
                content_type,
                bytes,
            } => builder.header(CONTENT_TYPE, content_type).body(bytes),
        };

        execute(builder).await
    }
}

pub fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Send a prepared request and decode the JSON response.
pub async fn execute(builder: RequestBuilder) -> Result<UpstreamResponse, UpstreamError> {
    let resp = builder.send().await.map_err(UpstreamError::from_reqwest)?;

    // Capture status before consuming the body
    let status = resp.status();
    let bytes = resp.bytes().await.map_err(UpstreamError::from_reqwest)?;

    let body = if bytes.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(v) => v,
            Err(_) if !status.is_success() => Value::Null,
            Err(e) => return Err(UpstreamError::Decode(e.to_string())),
        }
    };

    if !status.is_success() {
        return Err(UpstreamError::Status {
            status,
            message: extract_message(&body),
        });
    }

    Ok(UpstreamResponse { status, body })
}

/// Pull a human-readable message out of a backend error body.
pub fn extract_message(body: &Value) -> Option<String> {
    for key in ["message", "error", "detail"] {
        match body.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Object(inner)) => {
                if let Some(Value::String(s)) = inner.get("message") {
                    return Some(s.clone());
                }
            }
            _ => {}
        }
    }
    None
}

/// Bearer token from a login response (`token`/`accessToken`, top level or under `data`).
pub fn extract_token(body: &Value) -> Option<String> {
    let scopes = [Some(body), body.get("data")];
    scopes.into_iter().flatten().find_map(|scope| {
        ["token", "accessToken", "access_token"]
            .iter()
            .find_map(|key| scope.get(*key).and_then(Value::as_str))
            .filter(|t| !t.is_empty())
            .map(String::from)
    })
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("Upstream returned {status}")]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("Upstream request timed out")]
    Timeout,

    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("Invalid upstream response: {0}")]
    Decode(String),
}

impl UpstreamError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

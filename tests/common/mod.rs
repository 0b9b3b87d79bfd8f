//! Test utilities: JWT factory, test app builder, wiremock backend.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::Request;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use beneficiary_gateway::backend::client::build_http_client;
use beneficiary_gateway::config::Config;
use beneficiary_gateway::{AppState, create_app};
use jsonwebtoken::{EncodingKey, Header};
use serde_json::{Value, json};
use std::sync::Arc;
use wiremock::MockServer;

pub const APP_KEY: &str = "test-app-key";
pub const JWT_SECRET: &str = "test-jwt-secret";

/// Build an unsigned JWT (claims read in advisory mode).
pub fn make_unsigned_jwt(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
    let sig = URL_SAFE_NO_PAD.encode(b"fake-signature");
    format!("{header}.{payload}.{sig}")
}

/// Build an HS256 JWT signed with `secret`.
pub fn sign_jwt(claims: &Value, secret: &str) -> String {
    jsonwebtoken::encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to sign JWT")
}

fn future_exp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
        + 3600
}

/// Claims for a general (citizen/admin) token with a bare role name.
pub fn general_claims(id: u64, username: &str, role: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "role": role,
        "exp": future_exp()
    })
}

/// Claims for a staff token with a detailed role object.
pub fn staff_claims(id: u64, username: &str, role: &str, location: &str) -> Value {
    json!({
        "sub": id.to_string(),
        "username": username,
        "role": {
            "name": role,
            "canAdd": true,
            "canUpdate": true,
            "canDelete": false
        },
        "locationCode": location,
        "exp": future_exp()
    })
}

/// Config whose backend base URL points at a wiremock server.
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::test_default();
    config.api_base_url = server.uri();
    config
}

/// Build the full app around `config`.
pub fn build_test_app(config: Config) -> (axum::Router, Arc<AppState>) {
    let http_client = build_http_client(&config).expect("failed to build HTTP client");
    let state = Arc::new(AppState::new(config, http_client));
    (create_app(state.clone()), state)
}

/// Build the app against a wiremock backend with default settings.
pub fn build_test_app_for(server: &MockServer) -> (axum::Router, Arc<AppState>) {
    build_test_app(config_for(server))
}

/// Read response body as JSON.
pub async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// All `Set-Cookie` values on a response.
pub fn set_cookies(response: &axum::response::Response) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok().map(String::from))
        .collect()
}

/// Keyed request with a JSON body.
pub fn keyed_json(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("x-app-key", APP_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Keyed request carrying `cookie`.
pub fn keyed_with_cookie(method: &str, uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-app-key", APP_KEY)
        .header("Cookie", cookie)
        .body(Body::empty())
        .unwrap()
}

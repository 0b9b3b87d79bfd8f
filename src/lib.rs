//! Beneficiary Gateway: cookie-based auth front for the beneficiary
//! management backend.
//!
//! Same Axum router runs in both Lambda and local dev contexts.
//! Detection via `AWS_LAMBDA_RUNTIME_API` env var.

pub mod audit;
pub mod backend;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod token;
pub mod types;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::backend::client::{APP_KEY_HEADER, BackendClient};
use crate::backend::jwt::ClaimReader;
use crate::config::Config;
use crate::error::panic_response;
use crate::middleware::app_key::require_app_key;
use crate::middleware::gate::{GatePolicy, request_gate};
use crate::token::TokenKind;

/// Shared application state available to all route handlers.
pub struct AppState {
    pub config: Config,
    pub backend: BackendClient,
    pub claims: ClaimReader,
    pub gate: GatePolicy,
}

impl AppState {
    pub fn new(config: Config, http_client: reqwest::Client) -> Self {
        let backend = BackendClient::new(http_client, &config);
        let claims = ClaimReader::new(config.jwt_secret.as_deref());
        let gate = GatePolicy::from_config(&config);
        Self {
            config,
            backend,
            claims,
            gate,
        }
    }

    /// `Secure` attribute for a token cookie.
    pub fn cookie_secure(&self, kind: TokenKind) -> bool {
        match kind {
            TokenKind::General | TokenKind::Registry => self.config.cookie_secure,
            TokenKind::Staff => self.config.staff_cookie_secure,
        }
    }
}

/// Build the Axum router with all middleware and routes.
pub fn create_app(state: Arc<AppState>) -> Router {
    let allow_origin = match HeaderValue::from_str(&state.config.frontend_url) {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(e) => {
            tracing::warn!(
                "FRONTEND_URL is not a valid origin ({}), CORS disabled",
                e
            );
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    // CORS: allow single frontend origin with credentials
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(APP_KEY_HEADER),
        ])
        .allow_credentials(true);

    // Routes that require the Application Key
    let keyed_routes = Router::new()
        .route("/auth/login", post(routes::login::login))
        .route("/staff/login", post(routes::login::staff_login))
        .route("/recaptcha/verify", post(routes::recaptcha::verify))
        .route("/registry/household", get(routes::registry::household))
        .merge(routes::proxy::routes())
        .route_layer(from_fn_with_state(state.clone(), require_app_key));

    // Session routes without the Application Key
    let open_routes = Router::new()
        .route("/auth/logout", post(routes::logout::logout))
        .route("/auth/me", get(routes::me::me))
        .route("/staff/logout", post(routes::logout::staff_logout))
        .route("/staff/me", get(routes::me::staff_me));

    let api_routes = Router::new()
        .merge(keyed_routes)
        .merge(open_routes)
        .fallback(routes::api_not_found);

    Router::new()
        .route("/health", get(routes::health::health))
        .nest("/api", api_routes)
        .fallback(routes::frontend::relay)
        .layer(from_fn_with_state(state.clone(), request_gate))
        .layer(cors)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

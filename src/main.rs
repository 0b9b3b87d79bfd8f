//! Dual-mode entrypoint: Lambda or local dev server.
//!
//! Detects Lambda runtime via `AWS_LAMBDA_RUNTIME_API` env var.
//! - Lambda: `lambda_http::run(app)`, API Gateway v2 to HTTP
//! - Local: `axum::serve(listener, app)`, plain TCP server

use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt};

use beneficiary_gateway::backend::client::build_http_client;
use beneficiary_gateway::config::Config;
use beneficiary_gateway::{AppState, create_app};

#[tokio::main]
async fn main() -> ExitCode {
    let is_lambda = env::var("AWS_LAMBDA_RUNTIME_API").is_ok();

    // Init tracing: JSON for Lambda, pretty for local
    if is_lambda {
        fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    } else {
        // Load .env for local dev
        let _ = dotenvy::dotenv();
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let http_client = match build_http_client(&config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if config.jwt_secret.is_none() {
        tracing::warn!("JWT_SECRET not set, token claims are read without verification");
    }
    if config.registry_base_url.is_none() {
        tracing::info!("REGISTRY_BASE_URL not set, household lookups disabled");
    }

    let port = config.port;
    let app = create_app(Arc::new(AppState::new(config, http_client)));

    if is_lambda {
        tracing::info!("Starting in Lambda mode");
        if let Err(e) = lambda_http::run(app).await {
            tracing::error!("Lambda runtime error: {}", e);
            return ExitCode::FAILURE;
        }
    } else {
        let addr = format!("0.0.0.0:{port}");
        tracing::info!("Starting local server on {}", addr);
        let listener = match tokio::net::TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!("Failed to bind {}: {}", addr, e);
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Server error: {}", e);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

//! GET /health

use axum::Json;
use axum::extract::State;
use std::sync::Arc;

use crate::AppState;
use crate::types::HealthResponse;

/// Liveness plus how claims are read and whether the registry is wired up.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let claims = if state.claims.verifies() {
        "verified"
    } else {
        "advisory"
    };
    let registry = if state.config.registry_base_url.is_some() {
        "configured"
    } else {
        "unconfigured"
    };
    Json(HealthResponse {
        status: "ok".into(),
        mode: "gateway".into(),
        claims: claims.into(),
        registry: registry.into(),
    })
}

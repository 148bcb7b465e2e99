//! Service health endpoint.

use crate::lifecycle::LifecycleStatus;
use crate::state::SharedState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub model_status: LifecycleStatus,
    pub model_loaded: bool,
    pub model_generation: u64,
}

/// GET /health
///
/// Always 200: the service is healthy even while no model is loaded, it
/// just cannot classify yet.
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let model_status = state.lifecycle.status().await;
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
        model_status,
        model_loaded: !matches!(model_status, LifecycleStatus::Unloaded),
        model_generation: state.lifecycle.generation(),
    })
}

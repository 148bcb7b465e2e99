//! Retraining trigger and job status endpoints.

use crate::orchestrator::{RetrainResponse, RetrainingJob};
use crate::state::SharedState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct RetrainAck {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
}

/// POST /retrain
///
/// Acknowledges immediately; the pipeline runs in the background. A
/// trigger while a job is in flight is a no-op acknowledgment, not an
/// error: both outcomes are 200 and the body says which one happened.
pub async fn retrain(State(state): State<SharedState>) -> Json<RetrainAck> {
    let response = state
        .orchestrator
        .request_retrain(state.pipeline_config(), state.lifecycle.clone())
        .await;

    match response {
        RetrainResponse::Started { job_id } => Json(RetrainAck {
            status: "started",
            job_id: Some(job_id),
        }),
        RetrainResponse::AlreadyRunning => Json(RetrainAck {
            status: "already-running",
            job_id: None,
        }),
    }
}

/// GET /retrain/status
pub async fn retrain_status(State(state): State<SharedState>) -> Json<RetrainingJob> {
    Json(state.orchestrator.last_job().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AppState, ServerConfig};
    use ecosort_core::DataPaths;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn state_in(temp_dir: &TempDir) -> SharedState {
        Arc::new(AppState::new(ServerConfig {
            paths: DataPaths::new(
                temp_dir.path().join("data"),
                temp_dir.path().join("models"),
            ),
            ..ServerConfig::default()
        }))
    }

    #[tokio::test]
    async fn test_trigger_while_running_is_acknowledged() {
        let temp_dir = TempDir::new().unwrap();
        let state = state_in(&temp_dir);

        let _held = state.orchestrator.claim_slot().unwrap();
        let ack = retrain(State(state.clone())).await;
        assert_eq!(ack.status, "already-running");
        assert!(ack.job_id.is_none());
    }

    #[tokio::test]
    async fn test_trigger_starts_job() {
        let temp_dir = TempDir::new().unwrap();
        let state = state_in(&temp_dir);

        let ack = retrain(State(state.clone())).await;
        assert_eq!(ack.status, "started");
        assert!(ack.job_id.is_some());
    }
}

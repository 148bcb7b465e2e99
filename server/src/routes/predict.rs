//! Classification endpoint.

use crate::routes::error_response;
use crate::state::SharedState;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use ecosort_core::Category;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub filename: Option<String>,
    pub label: Category,
    pub confidence: f32,
    pub raw_score: f32,
}

/// POST /predict
///
/// Accepts one multipart image under the `file` field and returns the
/// thresholded binary decision with its confidence.
pub async fn predict(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<PredictResponse>, (StatusCode, String)> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Invalid multipart payload: {}", e),
        )
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(|s| s.to_string());
        let bytes = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read upload: {}", e),
            )
        })?;

        let prediction = state.classify(&bytes).await.map_err(error_response)?;
        info!(
            "Classified {} as {} (confidence {:.4})",
            filename.as_deref().unwrap_or("<unnamed>"),
            prediction.label,
            prediction.confidence
        );
        return Ok(Json(PredictResponse {
            filename,
            label: prediction.label,
            confidence: prediction.confidence,
            raw_score: prediction.raw_score,
        }));
    }

    Err((
        StatusCode::BAD_REQUEST,
        "Missing multipart field 'file'".to_string(),
    ))
}

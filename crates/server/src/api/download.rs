//! Batch download endpoint.

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::{error, info, warn};

use mediarelay_core::{BatchReport, BatchRequest};

use super::handlers::ErrorResponse;
use crate::state::AppState;

/// POST /download and POST /api/v1/download
///
/// Runs the whole batch and answers once every task has a record.
/// Per-task failures are part of a 200 response.
pub async fn download(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchReport>, (StatusCode, Json<ErrorResponse>)> {
    let Json(request) = payload.map_err(|e| {
        warn!("Rejected download request: {}", e);
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Invalid request format".to_string(),
            }),
        )
    })?;

    info!(tasks = request.tasks.len(), "Download batch received");

    match state.orchestrator().run_batch(request).await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            error!("Batch aborted: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

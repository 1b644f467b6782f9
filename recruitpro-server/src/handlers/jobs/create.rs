use std::sync::Arc;

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub job_type: String,
    #[serde(default)]
    pub payload: Value,
}

/// POST /api/jobs
/// Create a durable job record and enqueue it for background processing.
/// The record commits before the queue sees it, so pollers and the worker
/// always find the row. Responds immediately; completion is observed via
/// polling or the event stream.
pub async fn create(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if body.job_type.trim().is_empty() {
        return Err(ApiError::bad_request("jobType must not be empty"));
    }

    let created = state
        .job_queue
        .create_job(&state.db_pool, &body.job_type, body.payload)
        .await?;

    tracing::info!(job_id = %created.job_id, job_type = %body.job_type, "job enqueued");

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "id": created.job_id,
            "jobType": body.job_type,
            "status": "pending",
        })),
    ))
}

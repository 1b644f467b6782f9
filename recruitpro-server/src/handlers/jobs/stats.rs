use std::sync::Arc;

use axum::extract::Extension;
use axum::Json;
use serde_json::Value;

use crate::{error::ApiError, state::AppState};

/// GET /api/jobs/stats
/// Worker-level observability counters. Derived state only; job status
/// truth lives in the records.
pub async fn stats(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let stats = state.job_queue.stats().await;
    Ok(Json(serde_json::to_value(stats)?))
}

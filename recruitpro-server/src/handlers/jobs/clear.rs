use std::sync::Arc;

use axum::extract::Extension;
use axum::Json;
use serde_json::{json, Value};

use recruitpro_db::job_records;

use crate::{error::ApiError, state::AppState};

/// DELETE /api/jobs
/// Prune terminal job records. Pending and running records are kept.
pub async fn clear(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let cleared = job_records::delete_terminal(&state.db_pool).await?;
    tracing::info!(cleared, "pruned terminal job records");
    Ok(Json(json!({ "cleared": cleared })))
}

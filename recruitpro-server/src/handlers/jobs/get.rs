use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::Json;
use serde_json::Value;
use uuid::Uuid;

use recruitpro_db::job_records;

use crate::handlers::utils::record_to_payload;
use crate::{error::ApiError, state::AppState};

/// GET /api/jobs/{id}
/// Fetch the durable record for one job. This is the polling endpoint:
/// a failed job always carries a non-empty error string here.
pub async fn get_job(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let row = job_records::fetch_by_id(&state.db_pool, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("job {id} not found")))?;

    Ok(Json(record_to_payload(&row)))
}

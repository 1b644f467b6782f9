use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Extension, Query};
use axum::Json;
use serde_json::{json, Value};

use recruitpro_db::job_records::{self, JobStatus};

use crate::handlers::utils::{parse_positive_usize, record_to_payload};
use crate::{error::ApiError, state::AppState};

/// GET /api/jobs
/// List job records with optional filtering and pagination.
pub async fn list(
    Extension(state): Extension<Arc<AppState>>,
    query: Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let params = query.0;
    let page = parse_positive_usize(params.get("page"), 1, "page")?;
    let per_page = parse_positive_usize(params.get("perPage"), 20, "perPage")?;
    let offset = (page - 1) * per_page;
    let job_type_filter = params.get("jobType").map(|s| s.as_str());
    let status_filter = params
        .get("status")
        .map(|s| s.parse::<JobStatus>())
        .transpose()
        .map_err(ApiError::bad_request)?;

    let total = job_records::count(&state.db_pool, job_type_filter, status_filter).await?;
    let rows = job_records::list(
        &state.db_pool,
        job_type_filter,
        status_filter,
        per_page as i64,
        offset as i64,
    )
    .await?;

    let items: Vec<Value> = rows.iter().map(record_to_payload).collect();

    Ok(Json(json!({
        "items": items,
        "pagination": {
            "page": page,
            "perPage": per_page,
            "total": total,
        }
    })))
}

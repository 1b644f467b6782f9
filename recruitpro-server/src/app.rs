use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Extension},
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::handlers::{events, jobs};
use crate::state::AppState;

// Job payloads are small JSON documents; anything larger is a client bug.
const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Build the primary axum router with the provided shared application state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route(
            "/jobs",
            axum::routing::post(jobs::create::create)
                .get(jobs::list::list)
                .delete(jobs::clear::clear),
        )
        .route("/jobs/stats", get(jobs::stats::stats))
        .route("/jobs/events", get(events::stream::stream))
        .route("/jobs/{id}", get(jobs::get::get_job))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
        .layer(Extension(state));

    Router::new().nest("/api", api)
}

async fn health_handler() -> impl IntoResponse {
    // Liveness: always return 200 OK when process is alive.
    (axum::http::StatusCode::OK, "OK")
}

async fn ready_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> impl IntoResponse {
    // Readiness: the service is useful once the worker is consuming.
    if state.job_queue.stats().await.worker_running {
        (axum::http::StatusCode::OK, "OK")
    } else {
        (axum::http::StatusCode::SERVICE_UNAVAILABLE, "worker not running")
    }
}

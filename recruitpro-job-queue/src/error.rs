//! Error types for the job queue system.

use thiserror::Error;
use uuid::Uuid;

/// Errors that may occur while interacting with the job queue.
#[derive(Debug, Error)]
pub enum JobQueueError {
    #[error("job queue is shut down")]
    Closed,

    #[error("job not found: {0}")]
    NotFound(Uuid),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("job execution failed: {0}")]
    ExecutionFailed(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

//! Startup reconciliation for jobs abandoned by a previous process.

use recruitpro_db::{job_records, DbPool};
use recruitpro_job_queue::{JobQueue, JobQueueError, JobRequest};
use serde_json::Value;
use tracing::{info, warn};

/// Re-enqueue every `pending` record.
///
/// Items left in the in-memory channel at shutdown are lost, but their
/// records survive as `pending` rows. Runs after executor registration
/// and before the worker starts consuming, so replayed jobs are handled
/// exactly like fresh ones.
pub async fn requeue_abandoned(pool: &DbPool, queue: &JobQueue) -> Result<usize, JobQueueError> {
    let rows = job_records::pending_jobs(pool).await?;

    let mut requeued = 0usize;
    for row in rows {
        let payload: Value = match serde_json::from_str(&row.payload) {
            Ok(value) => value,
            Err(error) => {
                warn!(job_id = %row.id, %error, "skipping pending record with unreadable payload");
                continue;
            }
        };
        queue.enqueue(JobRequest::new(row.job_type.clone(), payload))?;
        requeued += 1;
    }

    if requeued > 0 {
        info!(requeued, "re-enqueued pending jobs from a previous run");
    }
    Ok(requeued)
}

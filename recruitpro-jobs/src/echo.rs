//! Diagnostic echo job.

use recruitpro_job_queue::{
    async_trait, JobContext, JobExecutor, JobQueueError, PAYLOAD_JOB_ID,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::job_types;

/// Payload for the queue.echo job.
#[derive(Debug, Deserialize)]
pub struct EchoPayload {
    pub job_id: Uuid,
}

/// Executor for queue.echo jobs.
///
/// Copies its payload (minus the record reference) into the record's
/// result. Exists to verify the full submit/claim/complete/notify path
/// end to end without any domain side effects.
#[derive(Debug, Default)]
pub struct EchoExecutor;

impl EchoExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl JobExecutor for EchoExecutor {
    fn job_type(&self) -> &str {
        job_types::ECHO
    }

    async fn execute(&self, ctx: &JobContext, payload: Value) -> Result<(), JobQueueError> {
        let parsed: EchoPayload = serde_json::from_value(payload.clone())
            .map_err(|e| JobQueueError::InvalidPayload(format!("queue.echo payload: {e}")))?;
        let id = parsed.job_id;

        // A failed claim means the record is gone or was already handled;
        // either way there is nothing left to do.
        if !ctx.claim(id).await? {
            debug!(job_id = %id, "echo record already handled; skipping");
            return Ok(());
        }

        let mut result = match payload {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        result.remove(PAYLOAD_JOB_ID);
        let result = Value::Object(result);

        match ctx.complete(id, self.job_type(), &result).await {
            Ok(_) => {
                info!(job_id = %id, "echo job completed");
                Ok(())
            }
            Err(err) => {
                // Leave a failure reason instead of a stuck running record.
                let _ = ctx.fail(id, self.job_type(), &err.to_string()).await;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recruitpro_db::job_records::{self, JobStatus};
    use recruitpro_job_queue::{JobContext, JobNotifier, JobQueue};
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_ctx() -> (recruitpro_db::DbPool, JobContext) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("open in-memory database");
        recruitpro_db::MIGRATOR.run(&pool).await.expect("migrations");

        let notifier = JobNotifier::default();
        let (queue, _rx) = JobQueue::channel(notifier.clone());
        let ctx = JobContext::new(pool.clone(), queue, notifier);
        (pool, ctx)
    }

    #[tokio::test]
    async fn echoes_payload_into_result() {
        let (pool, ctx) = test_ctx().await;
        let executor = EchoExecutor::new();
        assert_eq!(executor.job_type(), "queue.echo");

        let id = Uuid::new_v4();
        let payload = json!({ "job_id": id, "value": 42 });
        job_records::insert_pending(&pool, &id, job_types::ECHO, &payload.to_string())
            .await
            .unwrap();

        executor.execute(&ctx, payload).await.unwrap();

        let row = job_records::fetch_by_id(&pool, &id).await.unwrap().unwrap();
        assert_eq!(row.status, JobStatus::Completed);
        let result: Value = serde_json::from_str(row.result.as_deref().unwrap()).unwrap();
        assert_eq!(result, json!({ "value": 42 }));
        assert!(row.error.is_none());
    }

    #[tokio::test]
    async fn missing_record_is_not_an_error() {
        let (_pool, ctx) = test_ctx().await;
        let executor = EchoExecutor::new();

        let payload = json!({ "job_id": Uuid::new_v4(), "value": 1 });
        executor.execute(&ctx, payload).await.unwrap();
    }

    #[tokio::test]
    async fn payload_without_record_reference_is_rejected() {
        let (_pool, ctx) = test_ctx().await;
        let executor = EchoExecutor::new();

        let err = executor
            .execute(&ctx, json!({ "value": 1 }))
            .await
            .unwrap_err();
        assert!(matches!(err, JobQueueError::InvalidPayload(_)));
    }
}

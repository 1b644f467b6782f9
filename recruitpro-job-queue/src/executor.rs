//! Executor trait and the context handed to every job execution.

use async_trait::async_trait;
use recruitpro_db::{job_records, DbPool};
use serde_json::Value;
use uuid::Uuid;

use crate::error::JobQueueError;
use crate::notify::JobNotifier;
use crate::queue::JobQueue;
use crate::types::{JobEvent, JobStatus};

/// Shared services available to executors while they run.
///
/// Carries the database pool for record transitions, the queue handle for
/// enqueueing follow-on jobs, and the notifier for terminal-state events.
/// Executors must not keep state across invocations; everything they need
/// travels through this context and their payload.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub db: DbPool,
    pub queue: JobQueue,
    pub notifier: JobNotifier,
}

impl JobContext {
    pub fn new(db: DbPool, queue: JobQueue, notifier: JobNotifier) -> Self {
        Self {
            db,
            queue,
            notifier,
        }
    }

    /// Move the record `pending -> running`. A `false` return means the
    /// record is missing, already claimed, or terminal; the executor must
    /// then return without side effects. This is also what makes
    /// follow-on enqueues idempotent: chaining only ever happens behind a
    /// successful claim.
    pub async fn claim(&self, id: Uuid) -> Result<bool, JobQueueError> {
        Ok(job_records::claim_pending(&self.db, &id).await?)
    }

    /// Store the result, move the record `running -> completed`, and
    /// publish the terminal event. The transition commits before the
    /// event is published.
    pub async fn complete(
        &self,
        id: Uuid,
        job_type: &str,
        result: &Value,
    ) -> Result<bool, JobQueueError> {
        let stored = job_records::mark_completed(&self.db, &id, &result.to_string()).await?;
        if stored {
            self.notifier.publish(JobEvent {
                job_id: id,
                job_type: job_type.to_owned(),
                status: JobStatus::Completed,
                error: None,
            });
        }
        Ok(stored)
    }

    /// Store the error, move the record `running -> failed`, and publish
    /// the terminal event.
    pub async fn fail(
        &self,
        id: Uuid,
        job_type: &str,
        message: &str,
    ) -> Result<bool, JobQueueError> {
        let stored = job_records::mark_failed(&self.db, &id, message).await?;
        if stored {
            self.notifier.publish(JobEvent {
                job_id: id,
                job_type: job_type.to_owned(),
                status: JobStatus::Failed,
                error: Some(message.to_owned()),
            });
        }
        Ok(stored)
    }
}

/// Trait for implementing job executors.
///
/// Each job type is a concrete type implementing this trait, registered
/// with the queue before the worker starts consuming. An executor owns
/// its record's lifecycle: it claims the record before doing any
/// externally-visible work, and leaves it in a terminal state before
/// returning. An executor that returns with its record still `running`
/// relies on the stale-record sweep to repair it.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    /// Returns the job type this executor handles.
    fn job_type(&self) -> &str;

    /// Execute the job with the given payload.
    async fn execute(&self, ctx: &JobContext, payload: Value) -> Result<(), JobQueueError>;
}

/// An executor that immediately succeeds without touching any record.
///
/// Useful as a placeholder while a real implementation is pending, and in
/// tests that only care about dispatch mechanics.
#[derive(Debug, Default, Clone)]
pub struct NoOpExecutor {
    job_type: String,
}

impl NoOpExecutor {
    pub fn new(job_type: impl Into<String>) -> Self {
        Self {
            job_type: job_type.into(),
        }
    }
}

#[async_trait]
impl JobExecutor for NoOpExecutor {
    fn job_type(&self) -> &str {
        &self.job_type
    }

    async fn execute(&self, _ctx: &JobContext, _payload: Value) -> Result<(), JobQueueError> {
        Ok(())
    }
}

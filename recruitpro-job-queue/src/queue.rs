//! Queue client: the producer-facing half of the subsystem.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use recruitpro_db::{job_records, DbPool};
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::JobQueueError;
use crate::executor::JobExecutor;
use crate::notify::JobNotifier;
use crate::registry::ExecutorRegistry;
use crate::types::{EnqueueResult, JobRequest, LastJob, QueueStats, PAYLOAD_JOB_ID};

/// Receiving half of the queue channel, consumed by exactly one
/// [`Worker`](crate::Worker).
pub type JobReceiver = mpsc::UnboundedReceiver<JobRequest>;

#[derive(Debug, Default)]
struct LastInfo {
    last_job: Option<LastJob>,
    last_error: Option<String>,
}

/// Worker-level counters, separate from durable record state on purpose:
/// an executor can fail partway through its own record updates while the
/// loop still reports a clean failure count here.
#[derive(Debug, Default)]
pub(crate) struct StatsInner {
    queued: AtomicUsize,
    processed: AtomicU64,
    failed: AtomicU64,
    dispatch_failures: AtomicU64,
    worker_running: AtomicBool,
    last: Mutex<LastInfo>,
}

impl StatsInner {
    pub(crate) fn inc_queued(&self) {
        self.queued.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn dec_queued(&self) {
        let _ = self
            .queued
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| {
                Some(v.saturating_sub(1))
            });
    }

    pub(crate) fn set_worker_running(&self, running: bool) {
        self.worker_running.store(running, Ordering::SeqCst);
    }

    pub(crate) fn record_processed(&self, job_type: &str) {
        self.processed.fetch_add(1, Ordering::SeqCst);
        let mut last = self.last.lock().unwrap();
        last.last_job = Some(LastJob {
            job_type: job_type.to_owned(),
            finished_at: Utc::now(),
        });
    }

    pub(crate) fn record_failed(&self, message: String) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        let mut last = self.last.lock().unwrap();
        last.last_error = Some(message);
    }

    pub(crate) fn record_dispatch_failure(&self, job_type: &str) {
        self.dispatch_failures.fetch_add(1, Ordering::SeqCst);
        let mut last = self.last.lock().unwrap();
        last.last_error = Some(format!("no executor registered for job type '{job_type}'"));
    }
}

/// Handle for enqueueing jobs and inspecting queue state.
///
/// One instance is constructed at process startup and handed to every
/// producer and to the worker entry point; there is no process-global
/// queue. Cloning is cheap and all clones share the same channel.
#[derive(Debug, Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<JobRequest>,
    pub(crate) registry: ExecutorRegistry,
    pub(crate) stats: Arc<StatsInner>,
    notifier: JobNotifier,
}

impl JobQueue {
    /// Create the queue and the receiving end for its worker.
    pub fn channel(notifier: JobNotifier) -> (Self, JobReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue = Self {
            tx,
            registry: ExecutorRegistry::new(),
            stats: Arc::new(StatsInner::default()),
            notifier,
        };
        (queue, rx)
    }

    /// Register an executor. Last registration for a job type wins.
    pub async fn register<E: JobExecutor + 'static>(&self, executor: E) {
        self.registry.register(executor).await;
    }

    /// Append a job to the queue tail. Never blocks the producer.
    pub fn enqueue(&self, request: JobRequest) -> Result<(), JobQueueError> {
        self.tx.send(request).map_err(|_| JobQueueError::Closed)?;
        self.stats.inc_queued();
        Ok(())
    }

    /// Create a durable `pending` record and enqueue a reference to it.
    ///
    /// The insert commits before the item is pushed, so the worker can
    /// never dequeue an id whose row is not yet visible. The record id is
    /// stored in the payload under [`PAYLOAD_JOB_ID`], which is how
    /// executors find their record.
    pub async fn create_job(
        &self,
        db: &DbPool,
        job_type: &str,
        payload: Value,
    ) -> Result<EnqueueResult, JobQueueError> {
        let mut fields = match payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(JobQueueError::InvalidPayload(format!(
                    "payload must be a JSON object, got {other}"
                )))
            }
        };

        let job_id = Uuid::new_v4();
        fields.insert(PAYLOAD_JOB_ID.to_owned(), Value::String(job_id.to_string()));
        let payload = Value::Object(fields);

        job_records::insert_pending(db, &job_id, job_type, &payload.to_string()).await?;
        self.enqueue(JobRequest::new(job_type, payload))?;

        Ok(EnqueueResult { job_id })
    }

    /// Snapshot the worker-level counters.
    pub async fn stats(&self) -> QueueStats {
        let executors = self.registry.job_types().await;
        let stats = &self.stats;
        let last = stats.last.lock().unwrap();
        QueueStats {
            queued: stats.queued.load(Ordering::SeqCst),
            executors,
            processed: stats.processed.load(Ordering::SeqCst),
            failed: stats.failed.load(Ordering::SeqCst),
            dispatch_failures: stats.dispatch_failures.load(Ordering::SeqCst),
            last_job: last.last_job.clone(),
            last_error: last.last_error.clone(),
            worker_running: stats.worker_running.load(Ordering::SeqCst),
        }
    }

    pub fn notifier(&self) -> &JobNotifier {
        &self.notifier
    }
}

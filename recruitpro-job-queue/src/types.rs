//! Core types for the job queue system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub use recruitpro_db::job_records::JobStatus;

/// Payload key under which [`JobQueue::create_job`](crate::JobQueue::create_job)
/// stores the durable record id. Queue items themselves stay bare
/// `(job_type, payload)` pairs; this key is the only link between an item
/// and its record.
pub const PAYLOAD_JOB_ID: &str = "job_id";

/// A queued unit of work: the executor name plus its input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    pub job_type: String,
    pub payload: Value,
}

impl JobRequest {
    #[inline]
    pub fn new(job_type: impl Into<String>, payload: Value) -> Self {
        Self {
            job_type: job_type.into(),
            payload,
        }
    }
}

/// Result returned after a job record has been created and enqueued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueResult {
    pub job_id: Uuid,
}

/// Event published when a job record reaches a terminal state.
///
/// Delivery is at-most-once and only to currently-connected subscribers;
/// anything that needs the outcome reliably must poll the record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEvent {
    pub job_id: Uuid,
    pub job_type: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of the most recently processed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastJob {
    pub job_type: String,
    pub finished_at: DateTime<Utc>,
}

/// Snapshot of worker-level observability counters.
///
/// Derived state only: nothing here is a source of truth for job status,
/// which always lives in the durable record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub queued: usize,
    pub executors: Vec<String>,
    pub processed: u64,
    pub failed: u64,
    pub dispatch_failures: u64,
    pub last_job: Option<LastJob>,
    pub last_error: Option<String>,
    pub worker_running: bool,
}

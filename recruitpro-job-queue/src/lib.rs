//! Background job queue used by the RecruitPro backend.
//!
//! Producers create a durable job record and push a lightweight reference
//! onto an in-memory FIFO channel; a single background worker dequeues,
//! looks the job type up in a typed executor registry, and runs the
//! executor. Executors own their record's status transitions
//! (`pending -> running -> completed|failed`); the worker only keeps
//! coarse observability counters. Completion is observed by polling the
//! record store or, opportunistically, through the at-most-once
//! [`JobNotifier`] event stream.
//!
//! # Architecture
//!
//! - [`JobQueue`] - producer handle: enqueue, create records, read stats
//! - [`Worker`] - the single consumer loop, spawned once per process
//! - [`JobExecutor`] - trait implemented by each concrete job type
//! - [`JobContext`] - services handed to executors (db, queue, notifier)
//! - [`JobNotifier`] - fire-and-forget terminal-state events
//!
//! # Example
//!
//! ```rust,no_run
//! use recruitpro_db::{create_pool, DbConnectionConfig};
//! use recruitpro_job_queue::{
//!     JobContext, JobNotifier, JobQueue, NoOpExecutor, Worker, WorkerOptions,
//! };
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DbConnectionConfig::new("sqlite::memory:")).await?;
//!     recruitpro_db::MIGRATOR.run(&pool).await?;
//!
//!     let notifier = JobNotifier::default();
//!     let (queue, receiver) = JobQueue::channel(notifier.clone());
//!     let ctx = JobContext::new(pool.clone(), queue.clone(), notifier);
//!
//!     // Executors register before the worker starts consuming.
//!     queue.register(NoOpExecutor::new("queue.noop")).await;
//!     let worker = Worker::spawn(receiver, ctx, WorkerOptions::default());
//!
//!     let created = queue.create_job(&pool, "queue.noop", json!({})).await?;
//!     println!("enqueued job {}", created.job_id);
//!
//!     worker.shutdown().await;
//!     Ok(())
//! }
//! ```

mod error;
mod executor;
mod notify;
mod queue;
mod registry;
mod types;
mod worker;

pub use error::JobQueueError;
pub use executor::{JobContext, JobExecutor, NoOpExecutor};
pub use notify::JobNotifier;
pub use queue::{JobQueue, JobReceiver};
pub use registry::ExecutorRegistry;
pub use types::{
    EnqueueResult, JobEvent, JobRequest, JobStatus, LastJob, QueueStats, PAYLOAD_JOB_ID,
};
pub use worker::{Worker, WorkerHandle, WorkerOptions};

// Re-export async_trait for convenience when implementing JobExecutor
pub use async_trait::async_trait;

//! Concrete job implementations for the RecruitPro backend.
//!
//! This crate provides implementations of the
//! [`JobExecutor`](recruitpro_job_queue::JobExecutor) trait for the job
//! types the backend registers at startup.
//!
//! # Job Types
//!
//! - `queue.echo` - Diagnostic job that copies its payload into its result
//! - `housekeeping.sweep_stale` - Fail `running` records whose executor
//!   died without updating them
//!
//! # Usage
//!
//! ```rust,no_run
//! use recruitpro_job_queue::{JobNotifier, JobQueue};
//! use recruitpro_jobs::register_all_executors;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (queue, _rx) = JobQueue::channel(JobNotifier::default());
//!     register_all_executors(&queue, Duration::from_secs(600)).await;
//! }
//! ```

mod echo;
mod sweep;

pub use echo::EchoExecutor;
pub use sweep::StaleSweepExecutor;

use std::time::Duration;

use recruitpro_job_queue::JobQueue;

/// Register all available job executors with the queue.
///
/// Must run before the worker starts consuming; the host bootstrap owns
/// that ordering.
pub async fn register_all_executors(queue: &JobQueue, stale_after: Duration) {
    queue.register(EchoExecutor::new()).await;
    queue.register(StaleSweepExecutor::new(stale_after)).await;
}

/// Job type constants for type-safe job references.
pub mod job_types {
    pub const ECHO: &str = "queue.echo";
    pub const SWEEP_STALE: &str = "housekeeping.sweep_stale";
}

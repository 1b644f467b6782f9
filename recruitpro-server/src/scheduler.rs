//! Interval scheduler for housekeeping jobs.

use std::time::Duration;

use recruitpro_job_queue::{JobQueue, JobRequest};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Periodically enqueue the stale-record sweep.
///
/// The sweep runs as a regular queued job so it shares the worker's
/// single-consumer guarantees. The task stops on its own once the queue
/// shuts down.
pub fn spawn_sweep_scheduler(queue: JobQueue, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it so a fresh process
        // does not sweep before requeued jobs have had a chance to run.
        interval.tick().await;

        loop {
            interval.tick().await;
            let request = JobRequest::new(
                recruitpro_jobs::job_types::SWEEP_STALE,
                serde_json::json!({}),
            );
            if let Err(error) = queue.enqueue(request) {
                debug!(%error, "queue closed; stopping sweep scheduler");
                break;
            }
        }
    })
}

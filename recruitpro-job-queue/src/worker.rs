//! The single consumer loop turning queued items into executor runs.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::executor::JobContext;
use crate::queue::{JobReceiver, StatsInner};
use crate::registry::ExecutorRegistry;
use crate::types::JobRequest;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Tuning knobs for the worker loop.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Upper bound on a single blocking dequeue. The bounded wait is what
    /// lets the loop notice the cooperative shutdown flag.
    pub poll_interval: Duration,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// The background consumer. Exactly one per queue: single-consumer
/// execution is a property the rest of the design leans on.
pub struct Worker {
    rx: JobReceiver,
    ctx: JobContext,
    registry: ExecutorRegistry,
    stats: Arc<StatsInner>,
    shutdown: Arc<AtomicBool>,
    poll_interval: Duration,
}

impl Worker {
    /// Start consuming on a background task and return a handle for
    /// graceful shutdown. Executors must be registered before this is
    /// called if jobs may already be queued.
    pub fn spawn(rx: JobReceiver, ctx: JobContext, options: WorkerOptions) -> WorkerHandle {
        let shutdown = Arc::new(AtomicBool::new(false));
        let worker = Worker {
            rx,
            registry: ctx.queue.registry.clone(),
            stats: ctx.queue.stats.clone(),
            ctx,
            shutdown: shutdown.clone(),
            poll_interval: options.poll_interval,
        };
        let handle = tokio::spawn(worker.run());
        WorkerHandle { shutdown, handle }
    }

    async fn run(mut self) {
        self.stats.set_worker_running(true);
        info!("job worker started");

        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                debug!("shutdown flag set; stopping worker");
                break;
            }
            match timeout(self.poll_interval, self.rx.recv()).await {
                // Timed out with nothing queued; loop around to re-check
                // the shutdown flag.
                Err(_) => continue,
                Ok(None) => {
                    debug!("queue channel closed; stopping worker");
                    break;
                }
                Ok(Some(request)) => {
                    self.stats.dec_queued();
                    self.dispatch(request).await;
                }
            }
        }

        self.stats.set_worker_running(false);
        info!("job worker stopped");
    }

    /// Run one dequeued item. Nothing that happens in here may take the
    /// loop down: executor errors and panics are recorded in the counters
    /// and the loop moves on.
    async fn dispatch(&self, request: JobRequest) {
        let JobRequest { job_type, payload } = request;

        let Some(executor) = self.registry.get(&job_type).await else {
            warn!(%job_type, "no executor registered for dequeued job");
            self.stats.record_dispatch_failure(&job_type);
            return;
        };

        let outcome = AssertUnwindSafe(executor.execute(&self.ctx, payload))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => {
                debug!(%job_type, "job executed");
                self.stats.record_processed(&job_type);
            }
            Ok(Err(err)) => {
                warn!(%job_type, error = %err, "job execution failed");
                self.stats.record_failed(err.to_string());
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(%job_type, %message, "job executor panicked");
                self.stats.record_failed(message);
            }
        }
    }
}

/// Handle to a running worker. Dropping it detaches the worker; call
/// [`shutdown`](WorkerHandle::shutdown) for a graceful stop.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl WorkerHandle {
    /// Request a cooperative stop and wait for the loop to finish. The
    /// in-flight job (if any) runs to completion; items still queued are
    /// left for the next process start to reconcile.
    pub async fn shutdown(self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Err(error) = self.handle.await {
            warn!(%error, "job worker task panicked");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use recruitpro_db::{job_records, DbPool};
use recruitpro_job_queue::{
    async_trait, JobContext, JobExecutor, JobNotifier, JobQueue, JobQueueError, JobReceiver,
    JobRequest, JobStatus, Worker, WorkerHandle, WorkerOptions, PAYLOAD_JOB_ID,
};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use tokio::time::sleep;
use uuid::Uuid;

async fn setup() -> (DbPool, JobQueue, JobReceiver, JobContext) {
    // A single connection keeps the in-memory database shared across queries.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory database");
    recruitpro_db::MIGRATOR.run(&pool).await.expect("migrations");

    let notifier = JobNotifier::default();
    let (queue, rx) = JobQueue::channel(notifier.clone());
    let ctx = JobContext::new(pool.clone(), queue.clone(), notifier);
    (pool, queue, rx, ctx)
}

fn spawn_worker(rx: JobReceiver, ctx: JobContext) -> WorkerHandle {
    Worker::spawn(
        rx,
        ctx,
        WorkerOptions {
            poll_interval: Duration::from_millis(25),
        },
    )
}

/// Appends the `seq` payload field to a shared log.
struct RecordingExecutor {
    job_type: &'static str,
    seen: Arc<Mutex<Vec<i64>>>,
}

#[async_trait]
impl JobExecutor for RecordingExecutor {
    fn job_type(&self) -> &str {
        self.job_type
    }

    async fn execute(&self, _ctx: &JobContext, payload: Value) -> Result<(), JobQueueError> {
        let seq = payload.get("seq").and_then(Value::as_i64).unwrap_or(-1);
        self.seen.lock().unwrap().push(seq);
        Ok(())
    }
}

#[tokio::test]
async fn jobs_run_in_enqueue_order() {
    let (_pool, queue, rx, ctx) = setup().await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    queue
        .register(RecordingExecutor {
            job_type: "record",
            seen: seen.clone(),
        })
        .await;
    let worker = spawn_worker(rx, ctx);

    for i in 0..10 {
        queue
            .enqueue(JobRequest::new("record", json!({ "seq": i })))
            .unwrap();
    }

    for _ in 0..200 {
        if seen.lock().unwrap().len() == 10 {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(*seen.lock().unwrap(), (0..10).collect::<Vec<i64>>());

    worker.shutdown().await;
}

#[tokio::test]
async fn only_one_job_executes_at_a_time() {
    struct GuardExecutor {
        in_flight: Arc<AtomicUsize>,
        overlapped: Arc<AtomicBool>,
    }

    #[async_trait]
    impl JobExecutor for GuardExecutor {
        fn job_type(&self) -> &str {
            "guard"
        }

        async fn execute(&self, _ctx: &JobContext, _payload: Value) -> Result<(), JobQueueError> {
            if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    let (_pool, queue, rx, ctx) = setup().await;

    let overlapped = Arc::new(AtomicBool::new(false));
    queue
        .register(GuardExecutor {
            in_flight: Arc::new(AtomicUsize::new(0)),
            overlapped: overlapped.clone(),
        })
        .await;
    let worker = spawn_worker(rx, ctx);

    for _ in 0..20 {
        queue.enqueue(JobRequest::new("guard", json!({}))).unwrap();
    }

    for _ in 0..400 {
        if queue.stats().await.processed == 20 {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(queue.stats().await.processed, 20);
    assert!(!overlapped.load(Ordering::SeqCst));

    worker.shutdown().await;
}

#[tokio::test]
async fn a_failing_job_does_not_poison_the_queue() {
    struct FailingExecutor;

    #[async_trait]
    impl JobExecutor for FailingExecutor {
        fn job_type(&self) -> &str {
            "boom"
        }

        async fn execute(&self, _ctx: &JobContext, _payload: Value) -> Result<(), JobQueueError> {
            Err(JobQueueError::ExecutionFailed("x".to_owned()))
        }
    }

    let (_pool, queue, rx, ctx) = setup().await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    queue.register(FailingExecutor).await;
    queue
        .register(RecordingExecutor {
            job_type: "record",
            seen: seen.clone(),
        })
        .await;
    let worker = spawn_worker(rx, ctx);

    queue.enqueue(JobRequest::new("boom", json!({}))).unwrap();
    queue
        .enqueue(JobRequest::new("record", json!({ "seq": 7 })))
        .unwrap();

    for _ in 0..200 {
        if !seen.lock().unwrap().is_empty() {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(*seen.lock().unwrap(), vec![7]);

    let stats = queue.stats().await;
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.processed, 1);
    assert!(stats.last_error.unwrap().contains("x"));

    worker.shutdown().await;
}

#[tokio::test]
async fn a_panicking_job_does_not_kill_the_worker() {
    struct PanickingExecutor;

    #[async_trait]
    impl JobExecutor for PanickingExecutor {
        fn job_type(&self) -> &str {
            "panic"
        }

        async fn execute(&self, _ctx: &JobContext, _payload: Value) -> Result<(), JobQueueError> {
            panic!("kaboom");
        }
    }

    let (_pool, queue, rx, ctx) = setup().await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    queue.register(PanickingExecutor).await;
    queue
        .register(RecordingExecutor {
            job_type: "record",
            seen: seen.clone(),
        })
        .await;
    let worker = spawn_worker(rx, ctx);

    queue.enqueue(JobRequest::new("panic", json!({}))).unwrap();
    queue
        .enqueue(JobRequest::new("record", json!({ "seq": 1 })))
        .unwrap();

    for _ in 0..200 {
        if !seen.lock().unwrap().is_empty() {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(*seen.lock().unwrap(), vec![1]);

    let stats = queue.stats().await;
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.last_error.as_deref(), Some("kaboom"));

    worker.shutdown().await;
}

#[tokio::test]
async fn second_registration_wins() {
    struct MarkerExecutor {
        ran: Arc<AtomicBool>,
    }

    #[async_trait]
    impl JobExecutor for MarkerExecutor {
        fn job_type(&self) -> &str {
            "marker"
        }

        async fn execute(&self, _ctx: &JobContext, _payload: Value) -> Result<(), JobQueueError> {
            self.ran.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    let (_pool, queue, rx, ctx) = setup().await;

    let first = Arc::new(AtomicBool::new(false));
    let second = Arc::new(AtomicBool::new(false));
    queue.register(MarkerExecutor { ran: first.clone() }).await;
    queue.register(MarkerExecutor { ran: second.clone() }).await;
    let worker = spawn_worker(rx, ctx);

    queue.enqueue(JobRequest::new("marker", json!({}))).unwrap();

    for _ in 0..200 {
        if queue.stats().await.processed == 1 {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert!(!first.load(Ordering::SeqCst));
    assert!(second.load(Ordering::SeqCst));

    worker.shutdown().await;
}

#[tokio::test]
async fn unknown_job_type_is_counted_and_skipped() {
    let (_pool, queue, rx, ctx) = setup().await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    queue
        .register(RecordingExecutor {
            job_type: "record",
            seen: seen.clone(),
        })
        .await;
    let worker = spawn_worker(rx, ctx);

    queue
        .enqueue(JobRequest::new("unregistered", json!({})))
        .unwrap();
    queue
        .enqueue(JobRequest::new("record", json!({ "seq": 3 })))
        .unwrap();

    for _ in 0..200 {
        if !seen.lock().unwrap().is_empty() {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(*seen.lock().unwrap(), vec![3]);

    let stats = queue.stats().await;
    assert_eq!(stats.dispatch_failures, 1);
    assert!(stats.last_error.unwrap().contains("unregistered"));

    worker.shutdown().await;
}

/// Claims its record, enqueues a follow-on `record` job, and completes.
struct ChainingExecutor;

#[async_trait]
impl JobExecutor for ChainingExecutor {
    fn job_type(&self) -> &str {
        "chain"
    }

    async fn execute(&self, ctx: &JobContext, payload: Value) -> Result<(), JobQueueError> {
        let id = payload
            .get(PAYLOAD_JOB_ID)
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| JobQueueError::InvalidPayload("missing job_id".to_owned()))?;

        if !ctx.claim(id).await? {
            return Ok(());
        }
        ctx.queue
            .enqueue(JobRequest::new("record", json!({ "seq": 1 })))?;
        ctx.complete(id, self.job_type(), &json!({ "chained": true }))
            .await?;
        Ok(())
    }
}

#[tokio::test]
async fn rerunning_a_terminal_job_changes_nothing() {
    let (pool, queue, rx, ctx) = setup().await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    queue.register(ChainingExecutor).await;
    queue
        .register(RecordingExecutor {
            job_type: "record",
            seen: seen.clone(),
        })
        .await;
    let worker = spawn_worker(rx, ctx.clone());

    let created = queue.create_job(&pool, "chain", json!({})).await.unwrap();

    for _ in 0..200 {
        if seen.lock().unwrap().len() == 1 {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(seen.lock().unwrap().len(), 1);

    let row = job_records::fetch_by_id(&pool, &created.job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, JobStatus::Completed);
    let result = row.result.clone().unwrap();

    // Re-run the executor against the already-completed record: the claim
    // fails, so neither the record nor the queue may change.
    let payload: Value = serde_json::from_str(&row.payload).unwrap();
    ChainingExecutor.execute(&ctx, payload).await.unwrap();
    sleep(Duration::from_millis(100)).await;

    assert_eq!(seen.lock().unwrap().len(), 1);
    let after = job_records::fetch_by_id(&pool, &created.job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.status, JobStatus::Completed);
    assert_eq!(after.result.unwrap(), result);

    worker.shutdown().await;
}

#[tokio::test]
async fn shutdown_closes_the_queue() {
    let (_pool, queue, rx, ctx) = setup().await;
    let worker = spawn_worker(rx, ctx);

    for _ in 0..200 {
        if queue.stats().await.worker_running {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert!(queue.stats().await.worker_running);

    worker.shutdown().await;
    assert!(!queue.stats().await.worker_running);

    // The receiver is gone with the worker, so producers now get Closed.
    let err = queue
        .enqueue(JobRequest::new("record", json!({})))
        .unwrap_err();
    assert!(matches!(err, JobQueueError::Closed));
}

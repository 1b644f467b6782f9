use recruitpro_db::DbPool;
use recruitpro_job_queue::{JobNotifier, JobQueue};

/// Shared application state passed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub job_queue: JobQueue,
    pub notifier: JobNotifier,
}

impl AppState {
    /// Build a fully initialised state container from its constituent parts.
    pub fn new(db_pool: DbPool, job_queue: JobQueue, notifier: JobNotifier) -> Self {
        Self {
            db_pool,
            job_queue,
            notifier,
        }
    }
}

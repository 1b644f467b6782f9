//! Typed registry mapping job type names to executors.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::executor::JobExecutor;

/// The dispatch table: job type name to executor.
///
/// Registration is last-wins: registering a second executor under the
/// same job type silently replaces the first. That is intentional and
/// supports reloading implementations during development.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    inner: Arc<RwLock<HashMap<String, Arc<dyn JobExecutor>>>>,
}

impl fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("inner", &"<RwLock<HashMap<String, Arc<dyn JobExecutor>>>>")
            .finish()
    }
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executor under its job type, replacing any previous one.
    pub async fn register<E: JobExecutor + 'static>(&self, executor: E) {
        let job_type = executor.job_type().to_owned();
        let mut map = self.inner.write().await;
        if map.insert(job_type.clone(), Arc::new(executor)).is_some() {
            debug!(%job_type, "replacing previously registered executor");
        }
    }

    /// Look up the executor for a job type. Lookups happen at dispatch
    /// time; a miss is a counted dispatch failure, not a panic.
    pub async fn get(&self, job_type: &str) -> Option<Arc<dyn JobExecutor>> {
        let map = self.inner.read().await;
        map.get(job_type).cloned()
    }

    /// Names of all registered job types, sorted for stable output.
    pub async fn job_types(&self) -> Vec<String> {
        let map = self.inner.read().await;
        let mut names: Vec<String> = map.keys().cloned().collect();
        names.sort();
        names
    }
}

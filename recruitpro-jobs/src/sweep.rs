//! Reconciliation sweep for records abandoned in the `running` state.

use std::time::Duration;

use chrono::Utc;
use recruitpro_db::job_records;
use recruitpro_job_queue::{async_trait, JobContext, JobExecutor, JobQueueError};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::job_types;

/// Error message stored on records repaired by the sweep.
pub const STALE_ERROR: &str = "handler crashed without updating status";

/// Executor for housekeeping.sweep_stale jobs.
///
/// A record can only get stuck in `running` when its executor died (or
/// the process did) between claiming and finishing. This sweep fails any
/// `running` record that has not been touched within the configured
/// threshold so pollers never see a silently-stuck job. The sweep itself
/// is enqueued without a record of its own; queue items and records are
/// only linked when a producer wants to track the outcome.
#[derive(Debug)]
pub struct StaleSweepExecutor {
    stale_after: chrono::Duration,
}

impl StaleSweepExecutor {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            stale_after: chrono::Duration::from_std(stale_after)
                .unwrap_or_else(|_| chrono::Duration::seconds(600)),
        }
    }
}

#[async_trait]
impl JobExecutor for StaleSweepExecutor {
    fn job_type(&self) -> &str {
        job_types::SWEEP_STALE
    }

    async fn execute(&self, ctx: &JobContext, _payload: Value) -> Result<(), JobQueueError> {
        let cutoff = Utc::now() - self.stale_after;
        let ids = job_records::stale_running(&ctx.db, cutoff).await?;
        if ids.is_empty() {
            debug!("no stale running records found");
            return Ok(());
        }

        let mut repaired = 0usize;
        for id in ids {
            let Some(row) = job_records::fetch_by_id(&ctx.db, &id).await? else {
                continue;
            };
            // The conditional transition keeps this race-safe: a record
            // that finished between the select and here is left alone.
            if ctx.fail(id, &row.job_type, STALE_ERROR).await? {
                warn!(job_id = %id, job_type = %row.job_type, "failed stale running record");
                repaired += 1;
            }
        }

        info!(repaired, "stale record sweep finished");
        Ok(())
    }
}

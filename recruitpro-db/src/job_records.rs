//! Durable job record store.
//!
//! Every status transition is a conditional UPDATE keyed on the current
//! status, so the `pending -> running -> {completed|failed}` path is the
//! only one the database will accept. Callers learn whether their
//! transition actually happened from the returned flag and must treat a
//! `false` as "someone else already moved this record".

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};
use uuid::Uuid;

use crate::pool::DbPool;

/// Status of a durable job record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Returns true if this status represents a terminal state.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        })
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// One row of the `job_records` table.
///
/// `payload` and `result` hold JSON text; parsing to structured values is
/// left to the layer that needs it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct JobRecordRow {
    pub id: Uuid,
    pub job_type: String,
    pub status: JobStatus,
    pub payload: String,
    pub result: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert a fresh record in the `pending` state.
pub async fn insert_pending<'e, E>(
    executor: E,
    id: &Uuid,
    job_type: &str,
    payload: &str,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO job_records (id, job_type, status, payload, result, error, created_at, updated_at) \
         VALUES (?, ?, 'pending', ?, NULL, NULL, ?, ?)",
    )
    .bind(id)
    .bind(job_type)
    .bind(payload)
    .bind(now)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn fetch_by_id<'e, E>(executor: E, id: &Uuid) -> Result<Option<JobRecordRow>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, JobRecordRow>(
        "SELECT id, job_type, status, payload, result, error, created_at, updated_at \
         FROM job_records WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Move `pending -> running`. Returns false if the record was missing or
/// already claimed; callers use this as the once-only execution gate.
pub async fn claim_pending<'e, E>(executor: E, id: &Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let affected = sqlx::query(
        "UPDATE job_records SET status = 'running', updated_at = ? \
         WHERE id = ? AND status = 'pending'",
    )
    .bind(Utc::now())
    .bind(id)
    .execute(executor)
    .await?
    .rows_affected();
    Ok(affected == 1)
}

/// Move `running -> completed` and store the result JSON.
pub async fn mark_completed<'e, E>(
    executor: E,
    id: &Uuid,
    result: &str,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let affected = sqlx::query(
        "UPDATE job_records SET status = 'completed', result = ?, updated_at = ? \
         WHERE id = ? AND status = 'running'",
    )
    .bind(result)
    .bind(Utc::now())
    .bind(id)
    .execute(executor)
    .await?
    .rows_affected();
    Ok(affected == 1)
}

/// Move `running -> failed` and store the error description.
pub async fn mark_failed<'e, E>(executor: E, id: &Uuid, error: &str) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let affected = sqlx::query(
        "UPDATE job_records SET status = 'failed', error = ?, updated_at = ? \
         WHERE id = ? AND status = 'running'",
    )
    .bind(error)
    .bind(Utc::now())
    .bind(id)
    .execute(executor)
    .await?
    .rows_affected();
    Ok(affected == 1)
}

/// Records stuck in `running` with no update since `cutoff`, oldest first.
pub async fn stale_running<'e, E>(
    executor: E,
    cutoff: DateTime<Utc>,
) -> Result<Vec<Uuid>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM job_records WHERE status = 'running' AND updated_at < ? \
         ORDER BY updated_at ASC",
    )
    .bind(cutoff)
    .fetch_all(executor)
    .await
}

/// All `pending` records, in creation order. Used by the startup
/// reconciliation step to rebuild the in-memory queue.
pub async fn pending_jobs<'e, E>(executor: E) -> Result<Vec<JobRecordRow>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, JobRecordRow>(
        "SELECT id, job_type, status, payload, result, error, created_at, updated_at \
         FROM job_records WHERE status = 'pending' ORDER BY created_at ASC, id ASC",
    )
    .fetch_all(executor)
    .await
}

/// List records most recent first with optional filters and pagination.
pub async fn list(
    pool: &DbPool,
    job_type: Option<&str>,
    status: Option<JobStatus>,
    limit: i64,
    offset: i64,
) -> Result<Vec<JobRecordRow>, sqlx::Error> {
    let mut query = String::from(
        "SELECT id, job_type, status, payload, result, error, created_at, updated_at \
         FROM job_records",
    );
    push_filters(&mut query, job_type.is_some(), status.is_some());
    query.push_str(" ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");

    let mut q = sqlx::query_as::<_, JobRecordRow>(&query);
    if let Some(job_type) = job_type {
        q = q.bind(job_type);
    }
    if let Some(status) = status {
        q = q.bind(status);
    }
    q.bind(limit).bind(offset).fetch_all(pool).await
}

/// Count records matching the same filters as [`list`].
pub async fn count(
    pool: &DbPool,
    job_type: Option<&str>,
    status: Option<JobStatus>,
) -> Result<i64, sqlx::Error> {
    let mut query = String::from("SELECT COUNT(*) FROM job_records");
    push_filters(&mut query, job_type.is_some(), status.is_some());

    let mut q = sqlx::query_scalar::<_, i64>(&query);
    if let Some(job_type) = job_type {
        q = q.bind(job_type);
    }
    if let Some(status) = status {
        q = q.bind(status);
    }
    q.fetch_one(pool).await
}

/// Delete all terminal records, returning how many were removed.
pub async fn delete_terminal<'e, E>(executor: E) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let affected = sqlx::query("DELETE FROM job_records WHERE status IN ('completed', 'failed')")
        .execute(executor)
        .await?
        .rows_affected();
    Ok(affected)
}

fn push_filters(query: &mut String, by_type: bool, by_status: bool) {
    match (by_type, by_status) {
        (true, true) => query.push_str(" WHERE job_type = ? AND status = ?"),
        (true, false) => query.push_str(" WHERE job_type = ?"),
        (false, true) => query.push_str(" WHERE status = ?"),
        (false, false) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> DbPool {
        // A single connection keeps the in-memory database shared across queries.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("open in-memory database");
        crate::MIGRATOR.run(&pool).await.expect("run migrations");
        pool
    }

    #[tokio::test]
    async fn insert_and_fetch_roundtrip() {
        let pool = test_pool().await;
        let id = Uuid::new_v4();
        insert_pending(&pool, &id, "queue.echo", r#"{"value":42}"#)
            .await
            .unwrap();

        let row = fetch_by_id(&pool, &id).await.unwrap().expect("row");
        assert_eq!(row.id, id);
        assert_eq!(row.job_type, "queue.echo");
        assert_eq!(row.status, JobStatus::Pending);
        assert_eq!(row.payload, r#"{"value":42}"#);
        assert!(row.result.is_none());
        assert!(row.error.is_none());
    }

    #[tokio::test]
    async fn transitions_follow_the_only_valid_path() {
        let pool = test_pool().await;
        let id = Uuid::new_v4();
        insert_pending(&pool, &id, "queue.echo", "{}").await.unwrap();

        // completed/failed require a running record
        assert!(!mark_completed(&pool, &id, "{}").await.unwrap());
        assert!(!mark_failed(&pool, &id, "nope").await.unwrap());

        assert!(claim_pending(&pool, &id).await.unwrap());
        // claiming twice does not work
        assert!(!claim_pending(&pool, &id).await.unwrap());

        assert!(mark_completed(&pool, &id, r#"{"ok":true}"#).await.unwrap());
        let row = fetch_by_id(&pool, &id).await.unwrap().unwrap();
        assert_eq!(row.status, JobStatus::Completed);
        assert_eq!(row.result.as_deref(), Some(r#"{"ok":true}"#));
        assert!(row.error.is_none());
    }

    #[tokio::test]
    async fn terminal_records_never_move() {
        let pool = test_pool().await;
        let id = Uuid::new_v4();
        insert_pending(&pool, &id, "queue.echo", "{}").await.unwrap();
        assert!(claim_pending(&pool, &id).await.unwrap());
        assert!(mark_failed(&pool, &id, "boom").await.unwrap());

        assert!(!claim_pending(&pool, &id).await.unwrap());
        assert!(!mark_completed(&pool, &id, "{}").await.unwrap());
        assert!(!mark_failed(&pool, &id, "again").await.unwrap());

        let row = fetch_by_id(&pool, &id).await.unwrap().unwrap();
        assert_eq!(row.status, JobStatus::Failed);
        assert_eq!(row.error.as_deref(), Some("boom"));
        assert!(row.result.is_none());
    }

    #[tokio::test]
    async fn stale_running_finds_only_old_records() {
        let pool = test_pool().await;

        let fresh = Uuid::new_v4();
        insert_pending(&pool, &fresh, "queue.echo", "{}").await.unwrap();
        assert!(claim_pending(&pool, &fresh).await.unwrap());

        let stale = Uuid::new_v4();
        insert_pending(&pool, &stale, "queue.echo", "{}").await.unwrap();
        assert!(claim_pending(&pool, &stale).await.unwrap());
        let long_ago = Utc::now() - chrono::Duration::hours(2);
        sqlx::query("UPDATE job_records SET updated_at = ? WHERE id = ?")
            .bind(long_ago)
            .bind(stale)
            .execute(&pool)
            .await
            .unwrap();

        let cutoff = Utc::now() - chrono::Duration::minutes(10);
        let ids = stale_running(&pool, cutoff).await.unwrap();
        assert_eq!(ids, vec![stale]);
    }

    #[tokio::test]
    async fn list_filters_and_paginates() {
        let pool = test_pool().await;
        for i in 0..5 {
            let id = Uuid::new_v4();
            let job_type = if i % 2 == 0 { "queue.echo" } else { "other" };
            insert_pending(&pool, &id, job_type, "{}").await.unwrap();
        }

        let all = list(&pool, None, None, 10, 0).await.unwrap();
        assert_eq!(all.len(), 5);

        let echoes = list(&pool, Some("queue.echo"), None, 10, 0).await.unwrap();
        assert_eq!(echoes.len(), 3);
        assert!(echoes.iter().all(|r| r.job_type == "queue.echo"));

        let page = list(&pool, None, None, 2, 2).await.unwrap();
        assert_eq!(page.len(), 2);

        assert_eq!(count(&pool, None, None).await.unwrap(), 5);
        assert_eq!(count(&pool, Some("other"), None).await.unwrap(), 2);
        assert_eq!(
            count(&pool, None, Some(JobStatus::Pending)).await.unwrap(),
            5
        );
    }

    #[tokio::test]
    async fn delete_terminal_keeps_active_records() {
        let pool = test_pool().await;

        let done = Uuid::new_v4();
        insert_pending(&pool, &done, "queue.echo", "{}").await.unwrap();
        assert!(claim_pending(&pool, &done).await.unwrap());
        assert!(mark_completed(&pool, &done, "{}").await.unwrap());

        let waiting = Uuid::new_v4();
        insert_pending(&pool, &waiting, "queue.echo", "{}").await.unwrap();

        assert_eq!(delete_terminal(&pool).await.unwrap(), 1);
        assert!(fetch_by_id(&pool, &done).await.unwrap().is_none());
        assert!(fetch_by_id(&pool, &waiting).await.unwrap().is_some());
    }
}

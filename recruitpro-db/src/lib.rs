//! SQLite persistence layer for the RecruitPro backend.
//!
//! Provides the connection pool plus the durable job record store used by
//! the background job subsystem. Status transitions are enforced with
//! conditional updates so a record can never move backwards out of a
//! terminal state regardless of caller behavior.

pub mod config;
pub mod error;
pub mod job_records;
pub mod pool;

pub use config::DbConnectionConfig;
pub use error::DbError;
pub use pool::{create_pool, DbPool};

/// Embedded schema migrations, applied at startup by the server binary.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

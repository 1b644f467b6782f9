//! RecruitPro job server
//!
//! Entry point for the background job subsystem: configuration loading,
//! database migrations, executor registration, startup reconciliation,
//! and the HTTP surface for submitting and observing jobs.

use std::sync::Arc;
use std::time::Duration;

use recruitpro_job_queue::{JobContext, JobNotifier, JobQueue, Worker, WorkerOptions};
use tokio::net::TcpListener;

use recruitpro_server::state::AppState;
use recruitpro_server::{bootstrap, build_router, scheduler};

mod cli;
mod config_helpers;
mod tracing_setup;

use cli::CliArgs;
use config_helpers::{database_config_from_config, parse_bind_address};
use tracing_setup::install_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    if args.help_requested {
        CliArgs::print_help();
        return Ok(());
    }

    // Resolve config path: CLI > environment variable
    let config_path = args
        .config_path
        .or_else(|| std::env::var("RECRUITPRO_CONFIG_PATH").ok());

    let config = load_config(&config_path)?;
    recruitpro_config::validate_config(&config)
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    install_tracing(&config.logging);
    tracing::info!(config_path = ?config_path, "configuration loaded");

    // Create and migrate database
    let db_cfg = database_config_from_config(&config);
    let db_pool = recruitpro_db::create_pool(&db_cfg).await?;
    recruitpro_db::MIGRATOR.run(&db_pool).await?;
    tracing::info!(
        db_url = %db_cfg.url,
        db_max_connections = %db_cfg.max_connections,
        "database ready"
    );

    // Wire up the job subsystem. Ordering matters here: executors are
    // registered and abandoned jobs requeued before the worker starts
    // consuming.
    let notifier = JobNotifier::new(config.queue.event_buffer);
    let (job_queue, receiver) = JobQueue::channel(notifier.clone());

    recruitpro_jobs::register_all_executors(
        &job_queue,
        Duration::from_secs(config.queue.stale_after_secs),
    )
    .await;

    let requeued = bootstrap::requeue_abandoned(&db_pool, &job_queue).await?;
    tracing::info!(requeued, "startup reconciliation finished");

    let ctx = JobContext::new(db_pool.clone(), job_queue.clone(), notifier.clone());
    let worker = Worker::spawn(
        receiver,
        ctx,
        WorkerOptions {
            poll_interval: Duration::from_millis(config.queue.poll_interval_ms),
        },
    );

    if config.queue.sweep_interval_secs > 0 {
        scheduler::spawn_sweep_scheduler(
            job_queue.clone(),
            Duration::from_secs(config.queue.sweep_interval_secs),
        );
    }

    // Build router and start serving
    let state = AppState::new(db_pool, job_queue, notifier);
    let app = build_router(Arc::new(state));

    let addr = parse_bind_address(&config.server.host, config.server.port);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let the in-flight job finish, then stop the worker. Anything still
    // queued is recovered by the next start's reconciliation.
    tracing::info!("http server stopped; shutting down worker");
    worker.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
    }
}

/// Load configuration from file or defaults.
fn load_config(path: &Option<String>) -> anyhow::Result<recruitpro_config::Config> {
    match path.as_deref() {
        Some(p) => recruitpro_config::load_config(Some(p)).map_err(|e| {
            eprintln!("failed to load configuration: {e}");
            anyhow::anyhow!(e.to_string())
        }),
        None => recruitpro_config::load_config::<&std::path::Path>(None).map_err(|e| {
            eprintln!("failed to load configuration: {e}");
            anyhow::anyhow!(e.to_string())
        }),
    }
}

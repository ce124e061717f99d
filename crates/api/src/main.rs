use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use atelier_api::app::{build_router, AppState};
use atelier_api::config::Config;
use atelier_api::jobs::{AuthCleanupJob, JobScheduler, PoolMetricsJob};
use atelier_api::middleware::{init_metrics, logging::init_logging};

const JOB_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;

    init_logging(&config.logging).context("Failed to initialize logging")?;
    init_metrics().context("Failed to install metrics recorder")?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Atelier API");

    let db_config: persistence::db::DatabaseConfig = (&config.database).into();
    let pool = persistence::db::create_pool(&db_config)
        .await
        .context("Failed to connect to database")?;
    persistence::db::ensure_schema(&pool)
        .await
        .context("Failed to create database schema")?;

    let addr = config.socket_addr().context("Invalid server address")?;
    let state = AppState::new(config, pool.clone())?;

    let mut scheduler = JobScheduler::new();
    if state.config.jobs.enabled {
        scheduler.register(AuthCleanupJob::new(
            state.auth.clone(),
            state.config.jobs.auth_cleanup_minutes,
        ));
        scheduler.register(PoolMetricsJob::new(
            pool,
            state.config.jobs.pool_metrics_secs,
        ));
        scheduler.start();
    } else {
        warn!("Background jobs disabled");
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(JOB_SHUTDOWN_TIMEOUT).await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

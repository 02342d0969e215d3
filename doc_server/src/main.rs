//! Document processor API — accepts DOCX/PDF uploads, applies the
//! branded template, and serves the results back.
//!
//! Queued jobs are picked up by a background executor with a bounded
//! worker count; the filesystem holds the documents and an in-memory
//! store holds the bookkeeping.

mod config;
mod dashboard;
mod metrics;
mod models;
mod routes;
mod services;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;

use crate::config::Config;
use crate::store::JobStore;

#[derive(Parser)]
#[command(name = "docproc-api", about = "Document Template Processor API")]
struct Cli {
    /// Server port
    #[arg(short, long, env = "PORT", default_value = "8000")]
    port: u16,

    /// Concurrent processing jobs
    #[arg(short, long, env = "MAX_WORKERS", default_value = "4")]
    workers: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .init();
    }

    let cli = Cli::parse();

    tracing::info!("Starting document processor API...");

    let config = Arc::new(Config::from_env());
    prepare_dirs(&config)?;

    let store = JobStore::new();

    // Initialize metrics
    metrics::init_metrics();

    // Background tasks: job executor and retention sweeper
    tokio::spawn(services::executor::run_executor(
        store.clone(),
        config.clone(),
        cli.workers.max(1),
    ));
    tokio::spawn(services::maintenance::run_sweeper(
        store.clone(),
        config.clone(),
    ));

    let state = routes::ApiState {
        store,
        config: config.clone(),
    };
    let app = routes::router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    tracing::info!("Document processor API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");

    Ok(())
}

/// Create the upload/output roots idempotently with 0755, matching the
/// startup script.
fn prepare_dirs(config: &Config) -> anyhow::Result<()> {
    for dir in [&config.upload_dir, &config.output_dir] {
        std::fs::create_dir_all(dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o755))?;
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}

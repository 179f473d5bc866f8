//! sentinel-ops - Fraud intelligence intake service
//!
//! Ingests contractor submissions into cases, records every lifecycle change in
//! an append-only event log and serves review queues derived from that log.

use anyhow::{Context, Result};
use clap::Parser;
use sentinel_common::config::{prepare_root_folder, resolve_root_folder, SentinelConfig, ROOT_FOLDER_ENV};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sentinel_ops::services::HttpEvidenceFetcher;
use sentinel_ops::AppState;

/// Command-line arguments for sentinel-ops
#[derive(Parser, Debug)]
#[command(name = "sentinel-ops")]
#[command(about = "Event-sourced fraud intelligence intake service")]
#[command(version)]
struct Args {
    /// Root folder holding the database (overrides SENTINEL_ROOT_FOLDER and config)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Address to listen on (overrides config)
    #[arg(short, long, env = "SENTINEL_BIND")]
    bind: Option<String>,

    /// Explicit config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fetch and score source URLs after intake
    #[arg(long)]
    enable_evidence: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentinel_ops=info,sentinel_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting sentinel-ops v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let config = SentinelConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), ROOT_FOLDER_ENV, &config);
    let db_path = prepare_root_folder(&root_folder)
        .with_context(|| format!("Failed to initialize root folder {}", root_folder.display()))?;
    info!("Root folder: {}", root_folder.display());
    info!("Database: {}", db_path.display());

    let db_pool = sentinel_common::db::init_database(&db_path)
        .await
        .context("Failed to open database")?;

    let mut state = AppState::new(db_pool);
    if args.enable_evidence || config.evidence.enabled {
        let fetcher = HttpEvidenceFetcher::new(Duration::from_secs(config.evidence.timeout_secs))
            .context("Failed to build evidence fetcher")?;
        state = state.with_evidence_fetcher(Arc::new(fetcher));
        info!("Evidence analysis enabled (timeout {}s)", config.evidence.timeout_secs);
    }

    let app = sentinel_ops::build_router(state);

    let bind_address = args.bind.unwrap_or(config.bind_address);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_address))?;
    info!("Listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

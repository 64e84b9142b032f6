//! ddt-server - Digital Drift Tracker API
//!
//! Serves the extension and dashboard API and, unless disabled, runs the
//! drift analysis and daily summary loops in the background.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ddt_common::auth::load_token_secret;
use ddt_common::config::{CliOverrides, Config};
use ddt_common::db::init_database;
use ddt_server::jobs::{spawn_scheduler, SchedulerSettings};
use ddt_server::{build_router, init_tracing, AppState};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Command-line arguments for ddt-server
#[derive(Parser, Debug)]
#[command(name = "ddt-server")]
#[command(about = "Digital Drift Tracker API server")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:8000
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::resolve(&CliOverrides {
        config_path: args.config,
        database_path: args.database,
        bind_addr: args.bind,
    })
    .context("Failed to resolve configuration")?;

    init_tracing(&config.log_level);

    info!(
        "Starting Digital Drift Tracker (ddt-server) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Database path: {}", config.database_path.display());

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to open database")?;

    let token_secret = load_token_secret(&pool)
        .await
        .context("Failed to load token secret")?;
    info!("✓ Token signing secret ready");

    let cancel = CancellationToken::new();
    let jobs = if config.scheduler_enabled {
        spawn_scheduler(pool.clone(), SchedulerSettings::from(&config), cancel.clone())
    } else {
        info!("Background scheduler disabled");
        Vec::new()
    };

    let app = build_router(AppState::new(pool.clone(), token_secret, &config));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!("ddt-server listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    cancel.cancel();
    for job in jobs {
        let _ = job.await;
    }
    pool.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}

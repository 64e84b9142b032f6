//! ddt-jobs - run drift analysis, daily summaries or migrations once
//!
//! Meant for cron or manual backfills; the server runs the same jobs on a
//! timer.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use ddt_common::config::{CliOverrides, Config};
use ddt_common::db::{get_schema_version, init_database};
use ddt_server::{analysis, init_tracing, jobs};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ddt-jobs")]
#[command(about = "One-shot Digital Drift Tracker jobs")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect drifts in recent sessions
    Analyze {
        /// Analyse only this session
        #[arg(long, conflicts_with = "user")]
        session: Option<i64>,

        /// Analyse only this user's sessions
        #[arg(long)]
        user: Option<i64>,

        /// Look-back window in hours (defaults to configuration)
        #[arg(long)]
        hours: Option<i64>,
    },

    /// Recompute daily domain summaries
    Summarize {
        /// Day to summarize, YYYY-MM-DD (defaults to today, UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Create or upgrade the database schema
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::resolve(&CliOverrides {
        config_path: args.config,
        database_path: args.database,
        bind_addr: None,
    })
    .context("Failed to resolve configuration")?;

    init_tracing(&config.log_level);

    let pool = init_database(&config.database_path)
        .await
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?;

    match args.command {
        Command::Analyze { session, user, hours } => {
            let hours = hours.unwrap_or(config.analysis_window_hours);
            let reports = match (session, user) {
                (Some(sid), _) => vec![analysis::analyze_session(&pool, sid).await?],
                (None, Some(uid)) => analysis::analyze_recent_sessions(&pool, uid, hours).await?,
                (None, None) => analysis::analyze_all_users(&pool, hours).await?,
            };
            let inserted: usize = reports.iter().map(|r| r.inserted).sum();
            info!(sessions = reports.len(), inserted, "Drift analysis finished");
        }
        Command::Summarize { date } => {
            let date = date.unwrap_or_else(|| ddt_common::time::now().date());
            let rows = jobs::update_daily_summaries(&pool, date).await?;
            info!(%date, rows, "Daily summary finished");
        }
        Command::Migrate => {
            // init_database already applied pending migrations
            let version = get_schema_version(&pool).await?;
            info!(version, "Database schema is current");
        }
    }

    pool.close().await;
    Ok(())
}

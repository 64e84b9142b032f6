//! Periodic drift analysis and daily summary loops

use std::time::Duration;

use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::analysis;
use crate::jobs::daily_summary;

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub drift_interval: Duration,
    pub summary_interval: Duration,
    pub analysis_window_hours: i64,
}

impl From<&ddt_common::config::Config> for SchedulerSettings {
    fn from(config: &ddt_common::config::Config) -> Self {
        Self {
            drift_interval: Duration::from_secs(config.drift_interval_secs),
            summary_interval: Duration::from_secs(config.summary_interval_secs),
            analysis_window_hours: config.analysis_window_hours,
        }
    }
}

/// Spawn both job loops; they exit when `cancel` fires
pub fn spawn_scheduler(
    pool: SqlitePool,
    settings: SchedulerSettings,
    cancel: CancellationToken,
) -> Vec<JoinHandle<()>> {
    info!(
        drift_every_secs = settings.drift_interval.as_secs(),
        summary_every_secs = settings.summary_interval.as_secs(),
        window_hours = settings.analysis_window_hours,
        "Starting job scheduler"
    );

    let drift = {
        let pool = pool.clone();
        let cancel = cancel.clone();
        let hours = settings.analysis_window_hours;
        let every = settings.drift_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        match analysis::analyze_all_users(&pool, hours).await {
                            Ok(reports) => {
                                let inserted: usize = reports.iter().map(|r| r.inserted).sum();
                                info!(sessions = reports.len(), inserted, "Scheduled drift analysis finished");
                            }
                            Err(e) => error!("Scheduled drift analysis failed: {}", e),
                        }
                    }
                }
            }
            info!("Drift analysis loop stopped");
        })
    };

    let every = settings.summary_interval;
    let summary = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let today = ddt_common::time::now().date();
                    if let Err(e) = daily_summary::update_daily_summaries(&pool, today).await {
                        error!("Scheduled daily summary failed: {}", e);
                    }
                }
            }
        }
        info!("Daily summary loop stopped");
    });

    vec![drift, summary]
}

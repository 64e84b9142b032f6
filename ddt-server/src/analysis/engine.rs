//! Runs the drift rules over stored sessions and records the results
//!
//! A session is analysed inside a single transaction: either every new drift
//! of that session is written or none is. Re-running analysis is safe since
//! near-duplicates are skipped when recording.

use chrono::{Duration, NaiveDateTime};
use ddt_common::config::MAX_ANALYSIS_WINDOW_HOURS;
use ddt_common::{time, Error, Result};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use super::rules;
use crate::db::drifts::{self, NewDrift};
use crate::db::{begin_write, events, sessions, users};

/// Outcome of analysing one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub session_id: i64,
    pub events_scanned: usize,
    /// Candidates produced by the rules
    pub detected: usize,
    /// Candidates that were new and got written
    pub inserted: usize,
}

async fn record_all(
    conn: &mut SqliteConnection,
    candidates: Vec<NewDrift>,
    report: &mut AnalysisReport,
) -> Result<()> {
    for drift in candidates {
        report.detected += 1;
        if drifts::record(conn, &drift).await? {
            debug!(
                session_id = drift.session_id,
                drift_type = %drift.drift_type,
                "{}",
                drift.description
            );
            report.inserted += 1;
        }
    }
    Ok(())
}

/// Analyse one session and record any new drifts
pub async fn analyze_session(pool: &SqlitePool, session_id: i64) -> Result<AnalysisReport> {
    let session = sessions::find_session(pool, session_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Session {} not found", session_id)))?;

    let mut report = AnalysisReport {
        session_id,
        ..Default::default()
    };

    let mut tx = begin_write(pool).await?;
    let log = events::load_session_log(&mut *tx, session_id).await?;
    report.events_scanned = log.len();

    if log.is_empty() {
        debug!(session_id, "No events to analyse");
        return Ok(report);
    }

    // Trigger detection reads back HIGH drifts, so focus breaks go first
    record_all(&mut *tx, rules::focus_breaks(session_id, &log), &mut report).await?;

    let triggers = drifts::trigger_domains(&mut *tx, session.user_id).await?;
    record_all(&mut *tx, rules::drift_triggers(session_id, &log, &triggers), &mut report).await?;

    record_all(&mut *tx, rules::search_to_unproductive(session_id, &log), &mut report).await?;
    record_all(&mut *tx, rules::task_abandonment(session_id, &log), &mut report).await?;
    record_all(&mut *tx, rules::sequential(session_id, &log), &mut report).await?;

    tx.commit().await?;

    info!(
        session_id,
        events = report.events_scanned,
        detected = report.detected,
        inserted = report.inserted,
        "Drift analysis complete"
    );
    Ok(report)
}

/// Start of a look-back window of `hours` ending now
///
/// Rejects windows outside `1..=MAX_ANALYSIS_WINDOW_HOURS`.
pub fn window_start(hours: i64) -> Result<NaiveDateTime> {
    if !(1..=MAX_ANALYSIS_WINDOW_HOURS).contains(&hours) {
        return Err(Error::InvalidInput(format!(
            "hours must be between 1 and {}",
            MAX_ANALYSIS_WINDOW_HOURS
        )));
    }
    Duration::try_hours(hours)
        .and_then(|window| time::now().checked_sub_signed(window))
        .ok_or_else(|| Error::InvalidInput(format!("hours {} out of range", hours)))
}

/// Analyse a user's sessions active within the last `hours`, newest first
///
/// A failing session is logged and skipped; the others still run.
pub async fn analyze_recent_sessions(
    pool: &SqlitePool,
    user_id: i64,
    hours: i64,
) -> Result<Vec<AnalysisReport>> {
    let cutoff = window_start(hours)?;
    let ids = sessions::recent_session_ids(pool, user_id, cutoff).await?;
    debug!(user_id, sessions = ids.len(), "Analysing recent sessions");

    let mut reports = Vec::with_capacity(ids.len());
    for sid in ids {
        match analyze_session(pool, sid).await {
            Ok(report) => reports.push(report),
            Err(e) => warn!(user_id, session_id = sid, "Drift analysis failed: {}", e),
        }
    }
    Ok(reports)
}

/// Analyse recent sessions of every user in ascending id order
pub async fn analyze_all_users(pool: &SqlitePool, hours: i64) -> Result<Vec<AnalysisReport>> {
    window_start(hours)?;
    let mut reports = Vec::new();
    for user_id in users::list_user_ids(pool).await? {
        match analyze_recent_sessions(pool, user_id, hours).await {
            Ok(mut r) => reports.append(&mut r),
            Err(e) => warn!(user_id, "Drift analysis failed: {}", e),
        }
    }
    Ok(reports)
}

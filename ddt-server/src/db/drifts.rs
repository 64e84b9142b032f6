//! Drift event persistence

use chrono::NaiveDateTime;
use ddt_common::db::DriftEvent;
use ddt_common::{time, DriftType, Result, Severity};
use sqlx::{SqliteConnection, SqlitePool};

/// Two drifts of the same type in a session closer than this are one drift
pub const DEDUP_WINDOW_SECS: i64 = 10;

/// A drift ready to be recorded
#[derive(Debug, Clone, PartialEq)]
pub struct NewDrift {
    pub session_id: i64,
    pub drift_type: DriftType,
    pub event_start: NaiveDateTime,
    pub event_end: NaiveDateTime,
    pub severity: Severity,
    pub description: String,
    pub tab_id: Option<i64>,
    pub event_meta: Option<serde_json::Value>,
}

/// Whether the gap between two drift starts falls inside the dedup window
///
/// Gaps count in whole seconds, truncated, so a gap of exactly
/// [`DEDUP_WINDOW_SECS`] is two distinct drifts.
pub fn within_dedup_window(a: NaiveDateTime, b: NaiveDateTime) -> bool {
    time::seconds_between(a, b).abs() < DEDUP_WINDOW_SECS
}

/// Whether a drift of this type already starts within the dedup window
pub async fn exists_near(
    conn: &mut SqliteConnection,
    session_id: i64,
    drift_type: DriftType,
    start: NaiveDateTime,
) -> Result<bool> {
    // Widened by a second so float rounding never hides a candidate;
    // the window itself is decided below
    let nearby: Vec<NaiveDateTime> = sqlx::query_scalar(
        r#"
        SELECT event_start FROM drift_event
        WHERE session_id = ?
          AND drift_type = ?
          AND ABS(julianday(event_start) - julianday(?)) * 86400.0 < ?
        "#,
    )
    .bind(session_id)
    .bind(drift_type.as_str())
    .bind(start)
    .bind((DEDUP_WINDOW_SECS + 1) as f64)
    .fetch_all(&mut *conn)
    .await?;

    Ok(nearby.into_iter().any(|existing| within_dedup_window(existing, start)))
}

pub async fn insert(conn: &mut SqliteConnection, drift: &NewDrift) -> Result<i64> {
    let duration = time::seconds_between(drift.event_start, drift.event_end);
    let meta = drift
        .event_meta
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    let result = sqlx::query(
        r#"
        INSERT INTO drift_event
            (session_id, event_start, event_end, duration_seconds, drift_type,
             description, severity, tab_id, event_meta)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(drift.session_id)
    .bind(drift.event_start)
    .bind(drift.event_end)
    .bind(duration)
    .bind(drift.drift_type.as_str())
    .bind(&drift.description)
    .bind(drift.severity.as_str())
    .bind(drift.tab_id)
    .bind(meta)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Insert unless a near-duplicate exists; returns whether a row was written
pub async fn record(conn: &mut SqliteConnection, drift: &NewDrift) -> Result<bool> {
    if exists_near(conn, drift.session_id, drift.drift_type, drift.event_start).await? {
        return Ok(false);
    }
    insert(conn, drift).await?;
    Ok(true)
}

/// Productive domain that was the last thing visited before high-severity drifts
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TriggerDomain {
    pub domain_name: String,
    pub trigger_count: i64,
    pub last_tab_id: i64,
}

/// Productive domains preceding the user's HIGH drifts, most frequent first
pub async fn trigger_domains(conn: &mut SqliteConnection, user_id: i64) -> Result<Vec<TriggerDomain>> {
    let rows = sqlx::query_as::<_, TriggerDomain>(
        r#"
        WITH LastActivityBeforeDrift AS (
            SELECT
                de.drift_id,
                (SELECT ae.tab_id
                 FROM activity_event ae
                 WHERE ae.session_id = de.session_id AND ae.timestamp < de.event_start
                 ORDER BY ae.timestamp DESC, ae.event_id DESC
                 LIMIT 1) AS last_tab_id
            FROM drift_event de
            JOIN sessions s ON de.session_id = s.sid
            WHERE de.severity = 'HIGH' AND s.user_id = ?
        )
        SELECT d.domain_name,
               COUNT(*) AS trigger_count,
               MAX(labd.last_tab_id) AS last_tab_id
        FROM LastActivityBeforeDrift labd
        JOIN tab t ON labd.last_tab_id = t.tid
        JOIN domains d ON t.domain_id = d.id
        WHERE d.category = 'Productive'
        GROUP BY d.domain_name
        ORDER BY trigger_count DESC, d.domain_name ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// Drift events of a user, optionally limited to one session, newest first
pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: i64,
    session_id: Option<i64>,
) -> Result<Vec<DriftEvent>> {
    let drifts = sqlx::query_as::<_, DriftEvent>(
        r#"
        SELECT de.drift_id, de.session_id, de.drift_type, de.description,
               de.event_start, de.event_end, de.duration_seconds, de.severity,
               de.tab_id, de.event_meta
        FROM drift_event de
        JOIN sessions s ON de.session_id = s.sid
        WHERE s.user_id = ?
          AND (? IS NULL OR de.session_id = ?)
        ORDER BY de.event_start DESC, de.drift_id DESC
        "#,
    )
    .bind(user_id)
    .bind(session_id)
    .bind(session_id)
    .fetch_all(pool)
    .await?;
    Ok(drifts)
}

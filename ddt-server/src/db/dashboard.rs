//! Read-only analytic queries behind the dashboard endpoints
//!
//! Date windows are passed in by the caller (`since`, `today`) so results
//! do not depend on the database clock.

use chrono::{NaiveDate, NaiveDateTime};
use ddt_common::db::DriftEvent;
use ddt_common::Result;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

/// Dwell times at or above this are treated as the user having walked away
pub const MAX_DWELL_SECS: i64 = 1800;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DomainSummaryRow {
    pub domain_name: String,
    pub category: String,
    pub summary_date: NaiveDate,
    pub total_seconds_focused: i64,
    pub total_events: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CategoryTotal {
    pub category: String,
    pub total_seconds: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UnclassifiedDomain {
    pub domain_name: String,
    pub domain_id: i64,
    pub total_time_seconds: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SessionProductivity {
    pub sid: i64,
    pub start_time: NaiveDateTime,
    pub total_minutes: i64,
    pub tab_switches: i64,
    pub productive_seconds: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DriftHour {
    pub drift_hour: i64,
    pub total_drifts: i64,
    pub most_common_drift_type: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StickyDistraction {
    pub domain_name: String,
    pub avg_duration_seconds: f64,
}

/// Drifts starting after `since` (midnight), newest first
pub async fn drifts_since(pool: &SqlitePool, user_id: i64, since: NaiveDate) -> Result<Vec<DriftEvent>> {
    let rows = sqlx::query_as::<_, DriftEvent>(
        r#"
        SELECT de.drift_id, de.session_id, de.drift_type, de.description,
               de.event_start, de.event_end, de.duration_seconds, de.severity,
               de.tab_id, de.event_meta
        FROM drift_event de
        WHERE de.session_id IN (SELECT sid FROM sessions WHERE user_id = ?)
          AND de.event_start > ?
        ORDER BY de.event_start DESC, de.drift_id DESC
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn domain_summaries_since(
    pool: &SqlitePool,
    user_id: i64,
    since: NaiveDate,
) -> Result<Vec<DomainSummaryRow>> {
    let rows = sqlx::query_as::<_, DomainSummaryRow>(
        r#"
        SELECT d.domain_name, d.category, dds.summary_date,
               dds.total_seconds_focused, dds.total_events
        FROM daily_domain_summary dds
        JOIN domains d ON dds.domain_id = d.id
        WHERE dds.user_id = ?
          AND dds.summary_date > ?
        ORDER BY dds.summary_date DESC, dds.total_seconds_focused DESC
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn category_totals_since(
    pool: &SqlitePool,
    user_id: i64,
    since: NaiveDate,
) -> Result<Vec<CategoryTotal>> {
    let rows = sqlx::query_as::<_, CategoryTotal>(
        r#"
        SELECT d.category, SUM(dds.total_seconds_focused) AS total_seconds
        FROM daily_domain_summary dds
        JOIN domains d ON dds.domain_id = d.id
        WHERE dds.user_id = ?
          AND dds.summary_date > ?
        GROUP BY d.category
        ORDER BY total_seconds DESC
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Neutral, non-whitelisted domains with the most focus in the last 30 days
pub async fn unclassified_domains(
    pool: &SqlitePool,
    user_id: i64,
    today: NaiveDate,
) -> Result<Vec<UnclassifiedDomain>> {
    let since = today - chrono::Duration::days(30);
    let rows = sqlx::query_as::<_, UnclassifiedDomain>(
        r#"
        SELECT d.domain_name, d.id AS domain_id,
               SUM(dds.total_seconds_focused) AS total_time_seconds
        FROM daily_domain_summary dds
        JOIN domains d ON dds.domain_id = d.id
        WHERE dds.user_id = ?
          AND d.category = 'Neutral'
          AND dds.summary_date > ?
          AND NOT EXISTS (
              SELECT 1 FROM whitelists w WHERE w.domain_id = d.id AND w.user_id = d.user_id
          )
        GROUP BY d.domain_name, d.id
        ORDER BY total_time_seconds DESC
        LIMIT 5
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Closed sessions with tab switch counts and same-day productive time
pub async fn session_productivity(pool: &SqlitePool, user_id: i64) -> Result<Vec<SessionProductivity>> {
    let rows = sqlx::query_as::<_, SessionProductivity>(
        r#"
        SELECT
            s.sid,
            s.start_time,
            CAST((julianday(s.end_time) - julianday(s.start_time)) * 1440 AS INTEGER) AS total_minutes,
            (SELECT COUNT(*)
             FROM activity_event ae
             WHERE ae.session_id = s.sid AND ae.event_type = 'TAB_FOCUS'
            ) AS tab_switches,
            (SELECT COALESCE(SUM(dds.total_seconds_focused), 0)
             FROM daily_domain_summary dds
             JOIN domains d ON dds.domain_id = d.id
             WHERE dds.user_id = s.user_id
               AND d.category = 'Productive'
               AND dds.summary_date = date(s.start_time)
            ) AS productive_seconds
        FROM sessions s
        WHERE s.user_id = ? AND s.end_time IS NOT NULL
        ORDER BY s.start_time DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Drift counts per hour of day with the dominant drift type of that hour
pub async fn driftiest_hours(pool: &SqlitePool, user_id: i64) -> Result<Vec<DriftHour>> {
    let rows = sqlx::query_as::<_, DriftHour>(
        r#"
        WITH UserDrifts AS (
            SELECT CAST(strftime('%H', de.event_start) AS INTEGER) AS drift_hour,
                   de.drift_type
            FROM drift_event de
            JOIN sessions s ON de.session_id = s.sid
            WHERE s.user_id = ?
        )
        SELECT
            ud.drift_hour,
            COUNT(*) AS total_drifts,
            (SELECT u2.drift_type
             FROM UserDrifts u2
             WHERE u2.drift_hour = ud.drift_hour
             GROUP BY u2.drift_type
             ORDER BY COUNT(*) DESC, u2.drift_type ASC
             LIMIT 1
            ) AS most_common_drift_type
        FROM UserDrifts ud
        GROUP BY ud.drift_hour
        ORDER BY total_drifts DESC, ud.drift_hour ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Unproductive domains holding attention longest per focus
pub async fn stickiest_distractions(pool: &SqlitePool, user_id: i64) -> Result<Vec<StickyDistraction>> {
    let rows = sqlx::query_as::<_, StickyDistraction>(
        r#"
        WITH TabFocusDurations AS (
            SELECT t.domain_id,
                   -- whole seconds, truncated; rounding to ms first absorbs julianday error
                   CAST(ROUND((julianday(LEAD(ae.timestamp, 1) OVER (
                                  PARTITION BY ae.session_id ORDER BY ae.timestamp, ae.event_id))
                               - julianday(ae.timestamp)) * 86400000.0) AS INTEGER) / 1000
                       AS focus_duration_seconds
            FROM activity_event ae
            JOIN tab t ON ae.tab_id = t.tid
            WHERE ae.event_type = 'TAB_FOCUS' AND ae.user_id = ?
        )
        SELECT d.domain_name,
               AVG(tfd.focus_duration_seconds) AS avg_duration_seconds
        FROM TabFocusDurations tfd
        JOIN domains d ON tfd.domain_id = d.id
        WHERE d.user_id = ?
          AND d.category = 'Unproductive'
          AND tfd.focus_duration_seconds IS NOT NULL
          AND tfd.focus_duration_seconds < ?
        GROUP BY d.domain_name
        ORDER BY avg_duration_seconds DESC
        LIMIT 5
        "#,
    )
    .bind(user_id)
    .bind(user_id)
    .bind(MAX_DWELL_SECS)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

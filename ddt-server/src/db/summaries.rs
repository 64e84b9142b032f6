//! Daily per-domain aggregate rows

use chrono::{NaiveDate, NaiveDateTime};
use ddt_common::{EventType, Result};
use sqlx::{Row, SqlitePool};

use super::begin_write;

/// An event of the summarized day, reduced to what aggregation needs
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryEvent {
    pub user_id: i64,
    pub session_id: i64,
    pub domain_id: i64,
    pub is_focus: bool,
    pub timestamp: NaiveDateTime,
}

/// Events in `[start, end)`, ordered by session then time
pub async fn load_day_events(
    pool: &SqlitePool,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<SummaryEvent>> {
    let rows = sqlx::query(
        r#"
        SELECT ae.user_id, ae.session_id, t.domain_id, ae.event_type, ae.timestamp
        FROM activity_event ae
        JOIN tab t ON ae.tab_id = t.tid
        WHERE ae.timestamp >= ? AND ae.timestamp < ?
        ORDER BY ae.session_id ASC, ae.timestamp ASC, ae.event_id ASC
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| -> Result<SummaryEvent> {
            let event_type: String = row.try_get("event_type")?;
            Ok(SummaryEvent {
                user_id: row.try_get("user_id")?,
                session_id: row.try_get("session_id")?,
                domain_id: row.try_get("domain_id")?,
                is_focus: event_type == EventType::TabFocus.as_str(),
                timestamp: row.try_get("timestamp")?,
            })
        })
        .collect()
}

/// One aggregate row to upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryRow {
    pub user_id: i64,
    pub domain_id: i64,
    pub total_seconds_focused: i64,
    pub total_events: i64,
}

/// Upsert the day's rows in one transaction
pub async fn upsert_rows(pool: &SqlitePool, date: NaiveDate, rows: &[SummaryRow]) -> Result<u64> {
    let mut tx = begin_write(pool).await?;
    let mut written = 0;

    for row in rows {
        let result = sqlx::query(
            r#"
            INSERT INTO daily_domain_summary
                (user_id, domain_id, summary_date, total_seconds_focused, total_events)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id, domain_id, summary_date) DO UPDATE SET
                total_seconds_focused = excluded.total_seconds_focused,
                total_events = excluded.total_events
            "#,
        )
        .bind(row.user_id)
        .bind(row.domain_id)
        .bind(date)
        .bind(row.total_seconds_focused)
        .bind(row.total_events)
        .execute(&mut *tx)
        .await?;
        written += result.rows_affected();
    }

    tx.commit().await?;
    Ok(written)
}

//! Daily per-domain focus aggregation
//!
//! Dwell time of a TAB_FOCUS runs until the next TAB_FOCUS of the same
//! session. The final focus of a session runs until the session's last event
//! of the day. Each dwell is capped so a forgotten tab does not count as
//! hours of attention.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveTime};
use ddt_common::Result;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::dashboard::MAX_DWELL_SECS;
use crate::db::summaries::{self, SummaryEvent, SummaryRow};

/// Aggregate one day's events into per user/domain rows
///
/// `events` must be ordered by session then timestamp. Rows come back
/// ordered by user then domain.
pub fn aggregate_day(events: &[SummaryEvent]) -> Vec<SummaryRow> {
    let mut totals: BTreeMap<(i64, i64), (i64, i64)> = BTreeMap::new();

    let mut start = 0;
    while start < events.len() {
        let session_id = events[start].session_id;
        let end = events[start..]
            .iter()
            .position(|e| e.session_id != session_id)
            .map(|n| start + n)
            .unwrap_or(events.len());
        let session = &events[start..end];
        let session_end = session[session.len() - 1].timestamp;

        for (i, event) in session.iter().enumerate() {
            let entry = totals.entry((event.user_id, event.domain_id)).or_default();
            entry.1 += 1;

            if !event.is_focus {
                continue;
            }
            let until = session[i + 1..]
                .iter()
                .find(|e| e.is_focus)
                .map(|e| e.timestamp)
                .unwrap_or(session_end);
            let dwell = (until - event.timestamp).num_seconds().clamp(0, MAX_DWELL_SECS);
            entry.0 += dwell;
        }

        start = end;
    }

    totals
        .into_iter()
        .map(|((user_id, domain_id), (focused, count))| SummaryRow {
            user_id,
            domain_id,
            total_seconds_focused: focused,
            total_events: count,
        })
        .collect()
}

/// Recompute `daily_domain_summary` for one UTC date; returns rows written
pub async fn update_daily_summaries(pool: &SqlitePool, date: NaiveDate) -> Result<u64> {
    let day_start = date.and_time(NaiveTime::MIN);
    let day_end = day_start + Duration::days(1);

    let events = summaries::load_day_events(pool, day_start, day_end).await?;
    let rows = aggregate_day(&events);
    let written = summaries::upsert_rows(pool, date, &rows).await?;

    info!(%date, events = events.len(), rows = rows.len(), "Daily summary updated");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(secs: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 2)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
            + Duration::seconds(secs)
    }

    fn ev(session_id: i64, domain_id: i64, is_focus: bool, secs: i64) -> SummaryEvent {
        SummaryEvent {
            user_id: 1,
            session_id,
            domain_id,
            is_focus,
            timestamp: at(secs),
        }
    }

    fn row(rows: &[SummaryRow], domain_id: i64) -> SummaryRow {
        *rows.iter().find(|r| r.domain_id == domain_id).unwrap()
    }

    #[test]
    fn test_dwell_runs_to_next_focus() {
        let events = vec![
            ev(1, 10, true, 0),
            ev(1, 10, false, 30),
            ev(1, 20, true, 100),
            ev(1, 20, false, 160),
        ];
        let rows = aggregate_day(&events);
        assert_eq!(rows.len(), 2);
        assert_eq!(row(&rows, 10).total_seconds_focused, 100);
        assert_eq!(row(&rows, 10).total_events, 2);
        // Last focus runs until the session's final event
        assert_eq!(row(&rows, 20).total_seconds_focused, 60);
    }

    #[test]
    fn test_dwell_is_capped() {
        let events = vec![ev(1, 10, true, 0), ev(1, 20, true, 7200)];
        let rows = aggregate_day(&events);
        assert_eq!(row(&rows, 10).total_seconds_focused, MAX_DWELL_SECS);
        assert_eq!(row(&rows, 20).total_seconds_focused, 0);
    }

    #[test]
    fn test_sessions_do_not_bleed_into_each_other() {
        let events = vec![
            ev(1, 10, true, 0),
            ev(1, 10, false, 50),
            ev(2, 10, true, 60),
            ev(2, 30, false, 90),
        ];
        let rows = aggregate_day(&events);
        assert_eq!(row(&rows, 10).total_seconds_focused, 50 + 30);
        assert_eq!(row(&rows, 10).total_events, 3);
        assert_eq!(row(&rows, 30).total_seconds_focused, 0);
        assert_eq!(row(&rows, 30).total_events, 1);
    }

    #[test]
    fn test_events_without_focus_still_counted() {
        let events = vec![ev(1, 10, false, 0), ev(1, 10, false, 5)];
        let rows = aggregate_day(&events);
        assert_eq!(rows, vec![SummaryRow {
            user_id: 1,
            domain_id: 10,
            total_seconds_focused: 0,
            total_events: 2,
        }]);
    }

    #[test]
    fn test_empty_day() {
        assert!(aggregate_day(&[]).is_empty());
    }
}

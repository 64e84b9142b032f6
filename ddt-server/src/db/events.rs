//! Activity event storage and the ordered event log used by analysis

use chrono::NaiveDateTime;
use ddt_common::{Category, EventType, Result};
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::warn;

use super::begin_write;

/// One activity event as submitted by the extension
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub tab_id: i64,
    pub event_type: EventType,
    pub timestamp: NaiveDateTime,
    pub url: Option<String>,
    pub mouse_x: Option<i64>,
    pub mouse_y: Option<i64>,
    pub scroll_y_pixels: Option<i64>,
    pub scroll_y_percent: Option<f64>,
    pub target_element_id: Option<String>,
}

/// Insert a batch atomically; returns the number of rows written
pub async fn insert_batch(
    pool: &SqlitePool,
    session_id: i64,
    user_id: i64,
    events: &[NewEvent],
) -> Result<u64> {
    if events.is_empty() {
        return Ok(0);
    }

    let mut tx = begin_write(pool).await?;
    let mut inserted = 0;

    for event in events {
        let result = sqlx::query(
            r#"
            INSERT INTO activity_event (
                session_id, user_id, tab_id, event_type, timestamp, url,
                mouse_x, mouse_y, scroll_y_pixels, scroll_y_percent, target_element_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(event.tab_id)
        .bind(event.event_type.as_str())
        .bind(event.timestamp)
        .bind(&event.url)
        .bind(event.mouse_x)
        .bind(event.mouse_y)
        .bind(event.scroll_y_pixels)
        .bind(event.scroll_y_percent)
        .bind(&event.target_element_id)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// An event joined to its tab's domain, as seen by the drift rules
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub event_id: i64,
    pub tab_id: i64,
    pub event_type: EventType,
    pub timestamp: NaiveDateTime,
    pub url: Option<String>,
    pub domain_name: String,
    pub category: Category,
}

/// Time-ordered event log of a session (ties broken by insertion order)
pub async fn load_session_log(conn: &mut SqliteConnection, session_id: i64) -> Result<Vec<EventRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT ae.event_id, ae.tab_id, ae.event_type, ae.timestamp, ae.url,
               d.domain_name, d.category
        FROM activity_event ae
        JOIN tab t ON ae.tab_id = t.tid
        JOIN domains d ON t.domain_id = d.id
        WHERE ae.session_id = ?
        ORDER BY ae.timestamp ASC, ae.event_id ASC
        "#,
    )
    .bind(session_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut log = Vec::with_capacity(rows.len());
    for row in rows {
        let raw_type: String = row.try_get("event_type")?;
        let event_type = match raw_type.parse::<EventType>() {
            Ok(t) => t,
            Err(_) => {
                warn!(session_id, event_type = %raw_type, "Skipping event of unknown type");
                continue;
            }
        };
        let category: Option<String> = row.try_get("category")?;

        log.push(EventRecord {
            event_id: row.try_get("event_id")?,
            tab_id: row.try_get("tab_id")?,
            event_type,
            timestamp: row.try_get("timestamp")?,
            url: row.try_get("url")?,
            domain_name: row.try_get("domain_name")?,
            category: Category::from_db(category.as_deref()),
        });
    }

    Ok(log)
}

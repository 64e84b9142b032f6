//! Browser session queries

use chrono::NaiveDateTime;
use ddt_common::db::Session;
use ddt_common::{Error, Result};
use sqlx::SqlitePool;

use super::begin_write;

const SESSION_COLUMNS: &str =
    "sid, user_id, browser_name, browser_version, platform, timezone, start_time, end_time";

/// Fields recorded when the extension opens a session
#[derive(Debug, Clone)]
pub struct NewSession<'a> {
    pub user_id: i64,
    pub browser_name: &'a str,
    pub browser_version: &'a str,
    pub platform: &'a str,
    pub timezone: Option<&'a str>,
    pub start_time: NaiveDateTime,
}

pub async fn insert_session(pool: &SqlitePool, new: &NewSession<'_>) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO sessions (user_id, browser_name, browser_version, platform, timezone, start_time)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new.user_id)
    .bind(new.browser_name)
    .bind(new.browser_version)
    .bind(new.platform)
    .bind(new.timezone)
    .bind(new.start_time)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn find_session(pool: &SqlitePool, sid: i64) -> Result<Option<Session>> {
    let session = sqlx::query_as::<_, Session>(&format!(
        "SELECT {} FROM sessions WHERE sid = ?",
        SESSION_COLUMNS
    ))
    .bind(sid)
    .fetch_optional(pool)
    .await?;
    Ok(session)
}

/// Load a session only if it belongs to `user_id`
///
/// Foreign sessions read as missing so ids of other users are not revealed.
pub async fn find_owned(pool: &SqlitePool, sid: i64, user_id: i64) -> Result<Session> {
    match find_session(pool, sid).await? {
        Some(session) if session.user_id == user_id => Ok(session),
        _ => Err(Error::NotFound(format!("Session {} not found", sid))),
    }
}

/// Tear down a session: stamp end_time and close every active tab
///
/// Idempotent; an already closed session keeps its original end time.
pub async fn close_session(pool: &SqlitePool, sid: i64, now: NaiveDateTime) -> Result<u64> {
    let mut tx = begin_write(pool).await?;

    sqlx::query("UPDATE sessions SET end_time = ? WHERE sid = ? AND end_time IS NULL")
        .bind(now)
        .bind(sid)
        .execute(&mut *tx)
        .await?;

    let tabs = sqlx::query(
        "UPDATE tab SET closed_at = ?, is_active = 0 WHERE session_id = ? AND is_active = 1",
    )
    .bind(now)
    .bind(sid)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(tabs.rows_affected())
}

/// Sessions of a user still relevant for analysis since `cutoff`, newest first
pub async fn recent_session_ids(
    pool: &SqlitePool,
    user_id: i64,
    cutoff: NaiveDateTime,
) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar(
        r#"
        SELECT sid FROM sessions
        WHERE user_id = ?
          AND start_time >= ?
          AND (end_time IS NULL OR end_time >= ?)
        ORDER BY start_time DESC
        "#,
    )
    .bind(user_id)
    .bind(cutoff)
    .bind(cutoff)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

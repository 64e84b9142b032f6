//! Whitelist membership queries

use chrono::NaiveDateTime;
use ddt_common::db::WhitelistEntry;
use ddt_common::{Category, Result};
use sqlx::SqlitePool;

use super::{begin_write, domains};

/// Whitelisted domains of a user, newest first
pub async fn list(pool: &SqlitePool, user_id: i64) -> Result<Vec<WhitelistEntry>> {
    let entries = sqlx::query_as::<_, WhitelistEntry>(
        r#"
        SELECT w.wid, w.user_id, w.domain_id, w.user_reason, w.created_at,
               d.domain_name, d.category
        FROM whitelists w
        JOIN domains d ON w.domain_id = d.id
        WHERE w.user_id = ?
        ORDER BY w.created_at DESC, w.wid DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(entries)
}

/// Whitelist a domain by name and force it Productive
///
/// Re-adding an existing entry replaces its reason. Returns the domain id.
pub async fn add(
    pool: &SqlitePool,
    user_id: i64,
    domain_name: &str,
    user_reason: &str,
    now: NaiveDateTime,
) -> Result<i64> {
    let mut tx = begin_write(pool).await?;

    let (domain_id, _) =
        domains::get_or_create(&mut *tx, user_id, domain_name, Category::Productive).await?;

    sqlx::query(
        r#"
        INSERT INTO whitelists (user_id, domain_id, user_reason, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(user_id, domain_id) DO UPDATE SET user_reason = excluded.user_reason
        "#,
    )
    .bind(user_id)
    .bind(domain_id)
    .bind(user_reason)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    domains::set_category(&mut *tx, user_id, domain_id, Category::Productive).await?;

    tx.commit().await?;
    Ok(domain_id)
}

/// Drop a domain from the whitelist; it reverts to Unproductive
///
/// Returns whether a whitelist row was deleted.
pub async fn remove(pool: &SqlitePool, user_id: i64, domain_id: i64) -> Result<bool> {
    let mut tx = begin_write(pool).await?;

    let deleted = sqlx::query("DELETE FROM whitelists WHERE user_id = ? AND domain_id = ?")
        .bind(user_id)
        .bind(domain_id)
        .execute(&mut *tx)
        .await?;

    // The domain was visited before being whitelisted
    domains::set_category(&mut *tx, user_id, domain_id, Category::Unproductive).await?;

    tx.commit().await?;
    Ok(deleted.rows_affected() > 0)
}

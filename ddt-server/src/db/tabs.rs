//! Tab lifecycle queries

use chrono::NaiveDateTime;
use ddt_common::domain::extract_domain;
use ddt_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::debug;

use super::{begin_write, domains};
use ddt_common::Category;

/// Result of opening a tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenedTab {
    pub tid: i64,
    pub domain_id: i64,
    pub category: Category,
}

/// Record a newly opened tab and re-categorize its domain
///
/// Runs as one transaction: domain lookup/creation, whitelist check,
/// category update and tab insert.
pub async fn open_tab(
    pool: &SqlitePool,
    user_id: i64,
    session_id: i64,
    url: &str,
    title: Option<&str>,
    now: NaiveDateTime,
) -> Result<OpenedTab> {
    let domain_name =
        extract_domain(url).ok_or_else(|| Error::InvalidInput("Invalid URL".to_string()))?;

    let mut tx = begin_write(pool).await?;

    let (domain_id, current) =
        domains::get_or_create(&mut *tx, user_id, &domain_name, Category::Neutral).await?;

    let whitelisted = domains::is_whitelisted(&mut *tx, user_id, domain_id).await?;
    let category = domains::category_on_visit(whitelisted);
    if current != category {
        domains::set_category(&mut *tx, user_id, domain_id, category).await?;
        debug!(domain = %domain_name, from = %current, to = %category, "Domain re-categorized");
    }

    let result = sqlx::query(
        "INSERT INTO tab (session_id, domain_id, url, title, opened_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(session_id)
    .bind(domain_id)
    .bind(url)
    .bind(title)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(OpenedTab {
        tid: result.last_insert_rowid(),
        domain_id,
        category,
    })
}

/// Close a tab that belongs to one of the user's sessions
///
/// Returns false when no such tab exists for the user.
pub async fn close_tab(
    pool: &SqlitePool,
    user_id: i64,
    tid: i64,
    now: NaiveDateTime,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE tab SET closed_at = ?, is_active = 0
        WHERE tid = ?
          AND session_id IN (SELECT sid FROM sessions WHERE user_id = ?)
        "#,
    )
    .bind(now)
    .bind(tid)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Tab ids among `tids` that do not belong to `session_id`
pub async fn foreign_tabs(pool: &SqlitePool, session_id: i64, tids: &[i64]) -> Result<Vec<i64>> {
    let mut foreign = Vec::new();
    for &tid in tids {
        let owner: Option<i64> = sqlx::query_scalar("SELECT session_id FROM tab WHERE tid = ?")
            .bind(tid)
            .fetch_optional(pool)
            .await?;
        if owner != Some(session_id) {
            foreign.push(tid);
        }
    }
    Ok(foreign)
}

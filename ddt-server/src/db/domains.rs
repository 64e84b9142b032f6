//! Per-user domain rows and their category

use ddt_common::Category;
use ddt_common::Result;
use sqlx::SqliteConnection;

/// Fetch the domain row for `(user_id, domain_name)`, creating it if absent
///
/// Returns the id and the current category.
pub async fn get_or_create(
    conn: &mut SqliteConnection,
    user_id: i64,
    domain_name: &str,
    initial: Category,
) -> Result<(i64, Category)> {
    let existing: Option<(i64, Option<String>)> =
        sqlx::query_as("SELECT id, category FROM domains WHERE user_id = ? AND domain_name = ?")
            .bind(user_id)
            .bind(domain_name)
            .fetch_optional(&mut *conn)
            .await?;

    if let Some((id, category)) = existing {
        return Ok((id, Category::from_db(category.as_deref())));
    }

    let result = sqlx::query("INSERT INTO domains (user_id, domain_name, category) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(domain_name)
        .bind(initial.as_str())
        .execute(&mut *conn)
        .await?;

    Ok((result.last_insert_rowid(), initial))
}

pub async fn set_category(
    conn: &mut SqliteConnection,
    user_id: i64,
    domain_id: i64,
    category: Category,
) -> Result<bool> {
    let result = sqlx::query("UPDATE domains SET category = ? WHERE id = ? AND user_id = ?")
        .bind(category.as_str())
        .bind(domain_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn is_whitelisted(
    conn: &mut SqliteConnection,
    user_id: i64,
    domain_id: i64,
) -> Result<bool> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT wid FROM whitelists WHERE user_id = ? AND domain_id = ?")
            .bind(user_id)
            .bind(domain_id)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(found.is_some())
}

/// Category a domain takes when it is visited
///
/// Whitelisted domains are Productive; any other visited domain is
/// Unproductive. Neutral is reserved for domains never visited.
pub fn category_on_visit(whitelisted: bool) -> Category {
    if whitelisted {
        Category::Productive
    } else {
        Category::Unproductive
    }
}

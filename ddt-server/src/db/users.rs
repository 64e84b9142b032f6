//! User account queries

use chrono::NaiveDateTime;
use ddt_common::auth::PasswordDigest;
use ddt_common::db::User;
use ddt_common::Result;
use sqlx::SqlitePool;

const USER_COLUMNS: &str =
    "uid, email, password_hash, password_salt, timezone, created_at";

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE email = ?",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_by_id(pool: &SqlitePool, uid: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE uid = ?",
        USER_COLUMNS
    ))
    .bind(uid)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Insert a user; a duplicate email surfaces as a unique violation
pub async fn insert_user(
    pool: &SqlitePool,
    email: &str,
    digest: &PasswordDigest,
    created_at: NaiveDateTime,
) -> std::result::Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO users (email, password_hash, password_salt, created_at, timezone) VALUES (?, ?, ?, ?, 'UTC')",
    )
    .bind(email)
    .bind(&digest.hash)
    .bind(&digest.salt)
    .bind(created_at)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// All user ids, ascending
pub async fn list_user_ids(pool: &SqlitePool) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar("SELECT uid FROM users ORDER BY uid")
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

//! Database access layer for ddt-server
//!
//! Write paths that touch several tables take a `&mut SqliteConnection` so
//! callers can run them inside one transaction; plain reads take the pool.

pub mod dashboard;
pub mod domains;
pub mod drifts;
pub mod events;
pub mod sessions;
pub mod summaries;
pub mod tabs;
pub mod users;
pub mod whitelist;

use sqlx::{Sqlite, SqlitePool, Transaction};

/// Start a transaction that takes the write lock up front
///
/// A deferred transaction that reads before writing fails with
/// SQLITE_BUSY_SNAPSHOT when another connection commits in between; taking
/// the lock at BEGIN makes it wait on `busy_timeout` instead.
pub async fn begin_write(pool: &SqlitePool) -> sqlx::Result<Transaction<'static, Sqlite>> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

/// True when the error is a UNIQUE constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}

//! Database schema migrations
//!
//! Versioned, idempotent upgrades tracked in `schema_version`. Table creation
//! in `init` always produces the latest shape; migrations only bring older
//! files forward.
//!
//! Never modify an existing migration; add a new one and bump
//! `CURRENT_SCHEMA_VERSION`.

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Get current schema version from database
///
/// Returns 0 if the table has no rows
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("Migration v2 completed");
    }

    Ok(())
}

async fn has_column(pool: &SqlitePool, table: &str, column: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
            .bind(table)
            .bind(column)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

/// Migration v1: drift_event gains tab_id and event_meta
///
/// Early databases recorded drifts without the triggering tab or the JSON
/// details produced by the window rules.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    for (column, ddl) in [
        ("tab_id", "ALTER TABLE drift_event ADD COLUMN tab_id INTEGER"),
        ("event_meta", "ALTER TABLE drift_event ADD COLUMN event_meta TEXT"),
    ] {
        if has_column(pool, "drift_event", column).await? {
            continue;
        }
        sqlx::query(ddl).execute(pool).await?;
        info!("  Added {} column to drift_event", column);
    }
    Ok(())
}

/// Migration v2: users gain password_salt
///
/// Accounts created before salted hashing get an empty salt and must reset
/// their password.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    if has_column(pool, "users", "password_salt").await? {
        return Ok(());
    }

    sqlx::query("ALTER TABLE users ADD COLUMN password_salt TEXT NOT NULL DEFAULT ''")
        .execute(pool)
        .await?;

    let legacy: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if legacy > 0 {
        warn!("{} legacy accounts have no password salt and cannot log in", legacy);
    }

    info!("  Added password_salt column to users");
    Ok(())
}

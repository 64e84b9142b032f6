//! Database initialization
//!
//! Opens (or creates) the SQLite file, applies connection pragmas and
//! creates every table idempotently before running versioned migrations.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Pragmas go on the connect options so every pooled connection gets them
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    crate::db::migrations::run_migrations(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_settings_table(pool).await?;
    create_users_table(pool).await?;
    create_sessions_table(pool).await?;
    create_domains_table(pool).await?;
    create_tab_table(pool).await?;
    create_activity_event_table(pool).await?;
    create_whitelists_table(pool).await?;
    create_drift_event_table(pool).await?;
    create_daily_domain_summary_table(pool).await?;
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Key-value store; holds the token signing secret
async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            uid INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            password_salt TEXT NOT NULL,
            timezone TEXT NOT NULL DEFAULT 'UTC',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            sid INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(uid) ON DELETE CASCADE,
            browser_name TEXT NOT NULL,
            browser_version TEXT NOT NULL,
            platform TEXT NOT NULL,
            timezone TEXT,
            start_time TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            end_time TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_user_start ON sessions(user_id, start_time)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_domains_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS domains (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(uid) ON DELETE CASCADE,
            domain_name TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT 'Neutral'
                CHECK (category IN ('Productive', 'Unproductive', 'Neutral', 'Social Media', 'Entertainment')),
            UNIQUE (user_id, domain_name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_tab_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tab (
            tid INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id INTEGER NOT NULL REFERENCES sessions(sid) ON DELETE CASCADE,
            domain_id INTEGER NOT NULL REFERENCES domains(id),
            url TEXT NOT NULL,
            title TEXT,
            opened_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            closed_at TIMESTAMP,
            is_active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tab_session ON tab(session_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_activity_event_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS activity_event (
            event_id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id INTEGER NOT NULL REFERENCES sessions(sid) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES users(uid) ON DELETE CASCADE,
            tab_id INTEGER NOT NULL REFERENCES tab(tid),
            event_type TEXT NOT NULL,
            timestamp TIMESTAMP NOT NULL,
            url TEXT,
            mouse_x INTEGER,
            mouse_y INTEGER,
            scroll_y_pixels INTEGER,
            scroll_y_percent REAL,
            target_element_id TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_activity_session_time ON activity_event(session_id, timestamp)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_activity_user_time ON activity_event(user_id, timestamp)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_whitelists_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS whitelists (
            wid INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(uid) ON DELETE CASCADE,
            domain_id INTEGER NOT NULL REFERENCES domains(id) ON DELETE CASCADE,
            user_reason TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (user_id, domain_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_drift_event_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS drift_event (
            drift_id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id INTEGER NOT NULL REFERENCES sessions(sid) ON DELETE CASCADE,
            event_start TIMESTAMP NOT NULL,
            event_end TIMESTAMP NOT NULL,
            duration_seconds INTEGER NOT NULL,
            drift_type TEXT NOT NULL,
            description TEXT NOT NULL,
            severity TEXT NOT NULL,
            tab_id INTEGER,
            event_meta TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_drift_session_type ON drift_event(session_id, drift_type, event_start)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_daily_domain_summary_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS daily_domain_summary (
            user_id INTEGER NOT NULL REFERENCES users(uid) ON DELETE CASCADE,
            domain_id INTEGER NOT NULL REFERENCES domains(id) ON DELETE CASCADE,
            summary_date DATE NOT NULL,
            total_seconds_focused INTEGER NOT NULL DEFAULT 0,
            total_events INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (user_id, domain_id, summary_date)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

//! Database models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub uid: i64,
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
    pub timezone: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub sid: i64,
    pub user_id: i64,
    pub browser_name: String,
    pub browser_version: String,
    pub platform: String,
    pub timezone: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
}

/// A recorded drift as returned to the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DriftEvent {
    pub drift_id: i64,
    pub session_id: i64,
    pub drift_type: String,
    pub description: String,
    pub event_start: NaiveDateTime,
    pub event_end: NaiveDateTime,
    pub duration_seconds: i64,
    pub severity: String,
    pub tab_id: Option<i64>,
    pub event_meta: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WhitelistEntry {
    pub wid: i64,
    pub user_id: i64,
    pub domain_id: i64,
    pub user_reason: String,
    pub created_at: NaiveDateTime,
    pub domain_name: String,
    pub category: String,
}

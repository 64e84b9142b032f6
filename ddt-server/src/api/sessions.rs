//! Browser session endpoints

use axum::{extract::State, Extension, Json};
use ddt_common::time;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::auth::AuthUser;
use crate::db::sessions::{self, NewSession};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub browser_name: String,
    pub browser_version: String,
    pub platform: String,
    pub timezone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub sid: i64,
}

#[derive(Debug, Deserialize)]
pub struct CloseSessionRequest {
    pub sid: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CloseSessionResponse {
    pub status: &'static str,
    pub sid_closed: i64,
}

/// POST /api/session/start
pub async fn start_session(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(req): Json<StartSessionRequest>,
) -> ApiResult<Json<StartSessionResponse>> {
    let sid = sessions::insert_session(
        &state.db,
        &NewSession {
            user_id: caller.user_id,
            browser_name: &req.browser_name,
            browser_version: &req.browser_version,
            platform: &req.platform,
            timezone: req.timezone.as_deref(),
            start_time: time::now(),
        },
    )
    .await?;

    info!(user_id = caller.user_id, sid, browser = %req.browser_name, "Session started");
    Ok(Json(StartSessionResponse { sid }))
}

/// POST /api/session/close
///
/// Idempotent: closing twice keeps the first end time.
pub async fn close_session(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(req): Json<CloseSessionRequest>,
) -> ApiResult<Json<CloseSessionResponse>> {
    let sid = req
        .sid
        .ok_or_else(|| ApiError::BadRequest("Missing session ID".to_string()))?;

    sessions::find_owned(&state.db, sid, caller.user_id).await?;
    let tabs_closed = sessions::close_session(&state.db, sid, time::now()).await?;

    info!(user_id = caller.user_id, sid, tabs_closed, "Session closed");
    Ok(Json(CloseSessionResponse {
        status: "ok",
        sid_closed: sid,
    }))
}

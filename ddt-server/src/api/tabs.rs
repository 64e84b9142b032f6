//! Tab endpoints; opening a tab also classifies its domain

use axum::{extract::State, Extension, Json};
use ddt_common::domain::extract_domain;
use ddt_common::time;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::auth::AuthUser;
use crate::db::{sessions, tabs};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct OpenTabRequest {
    pub session_id: i64,
    pub url: String,
    pub title: Option<String>,
    /// Accepted from older extensions and ignored
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct OpenTabResponse {
    pub tid: i64,
    pub domain_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CloseTabRequest {
    pub tid: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CloseTabResponse {
    pub status: &'static str,
    pub tid_closed: i64,
}

/// POST /api/tab/open
pub async fn open_tab(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(req): Json<OpenTabRequest>,
) -> ApiResult<Json<OpenTabResponse>> {
    if extract_domain(&req.url).is_none() {
        return Err(ApiError::BadRequest("Invalid URL".to_string()));
    }
    if req.user_id.is_some_and(|id| id != caller.user_id) {
        debug!(caller = caller.user_id, "Ignoring client-supplied user_id");
    }

    sessions::find_owned(&state.db, req.session_id, caller.user_id).await?;

    let opened = tabs::open_tab(
        &state.db,
        caller.user_id,
        req.session_id,
        &req.url,
        req.title.as_deref(),
        time::now(),
    )
    .await?;

    debug!(
        session_id = req.session_id,
        tid = opened.tid,
        category = %opened.category,
        "Tab opened"
    );
    Ok(Json(OpenTabResponse {
        tid: opened.tid,
        domain_id: opened.domain_id,
    }))
}

/// POST /api/tab/close
pub async fn close_tab(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(req): Json<CloseTabRequest>,
) -> ApiResult<Json<CloseTabResponse>> {
    let tid = req
        .tid
        .ok_or_else(|| ApiError::BadRequest("Missing tab ID".to_string()))?;

    if !tabs::close_tab(&state.db, caller.user_id, tid, time::now()).await? {
        return Err(ApiError::NotFound(format!("Tab {} not found", tid)));
    }

    Ok(Json(CloseTabResponse {
        status: "ok",
        tid_closed: tid,
    }))
}

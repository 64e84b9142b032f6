//! On-demand drift analysis and drift listing

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use ddt_common::config::MAX_ANALYSIS_WINDOW_HOURS;
use ddt_common::db::DriftEvent;
use serde::{Deserialize, Serialize};

use super::auth::AuthUser;
use crate::analysis::{self, AnalysisReport};
use crate::db::{drifts, sessions};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    pub session_id: Option<i64>,
    pub hours: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub reports: Vec<AnalysisReport>,
}

#[derive(Debug, Deserialize)]
pub struct DriftListQuery {
    pub session_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct DriftListResponse {
    pub drift_events: Vec<DriftEvent>,
}

/// POST /api/drift/analyze
///
/// One owned session when `session_id` is given, otherwise the caller's
/// sessions active within `hours` (default from configuration).
pub async fn analyze(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(req): Json<AnalyzeRequest>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let reports = match req.session_id {
        Some(sid) => {
            sessions::find_owned(&state.db, sid, caller.user_id).await?;
            vec![analysis::analyze_session(&state.db, sid).await?]
        }
        None => {
            let hours = req.hours.unwrap_or(state.analysis_window_hours);
            if !(1..=MAX_ANALYSIS_WINDOW_HOURS).contains(&hours) {
                return Err(ApiError::BadRequest(format!(
                    "hours must be between 1 and {}",
                    MAX_ANALYSIS_WINDOW_HOURS
                )));
            }
            analysis::analyze_recent_sessions(&state.db, caller.user_id, hours).await?
        }
    };

    Ok(Json(AnalyzeResponse { reports }))
}

/// GET /api/drift/events?session_id=N
pub async fn list_drifts(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Query(query): Query<DriftListQuery>,
) -> ApiResult<Json<DriftListResponse>> {
    let drift_events = drifts::list_for_user(&state.db, caller.user_id, query.session_id).await?;
    Ok(Json(DriftListResponse { drift_events }))
}

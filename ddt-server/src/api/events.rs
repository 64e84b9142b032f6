//! Activity event ingestion

use axum::{extract::State, Extension, Json};
use ddt_common::{time, EventType};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::auth::AuthUser;
use crate::db::events::{self, NewEvent};
use crate::db::{sessions, tabs};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct EventIn {
    pub tab_id: i64,
    pub event_type: String,
    pub timestamp: String,
    pub url: Option<String>,
    pub mouse_x: Option<i64>,
    pub mouse_y: Option<i64>,
    pub scroll_y_pixels: Option<i64>,
    pub scroll_y_percent: Option<f64>,
    pub target_element_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EventBatchRequest {
    pub session_id: i64,
    /// Accepted from older extensions and ignored
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub events: Vec<EventIn>,
}

#[derive(Debug, Serialize)]
pub struct EventBatchResponse {
    pub inserted_count: u64,
}

impl TryFrom<EventIn> for NewEvent {
    type Error = ApiError;

    fn try_from(raw: EventIn) -> Result<Self, Self::Error> {
        let event_type = raw
            .event_type
            .parse::<EventType>()
            .map_err(|_| ApiError::BadRequest(format!("Unknown event type: {}", raw.event_type)))?;
        let timestamp = time::parse_client_timestamp(&raw.timestamp)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid timestamp: {}", raw.timestamp)))?;

        Ok(NewEvent {
            tab_id: raw.tab_id,
            event_type,
            timestamp,
            url: raw.url,
            mouse_x: raw.mouse_x,
            mouse_y: raw.mouse_y,
            scroll_y_pixels: raw.scroll_y_pixels,
            scroll_y_percent: raw.scroll_y_percent,
            target_element_id: raw.target_element_id,
        })
    }
}

/// POST /api/events/batch
///
/// The whole batch is validated first, then written in one transaction.
pub async fn ingest_batch(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(req): Json<EventBatchRequest>,
) -> ApiResult<Json<EventBatchResponse>> {
    sessions::find_owned(&state.db, req.session_id, caller.user_id).await?;

    let batch = req
        .events
        .into_iter()
        .map(NewEvent::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let mut tids: Vec<i64> = batch.iter().map(|e| e.tab_id).collect();
    tids.sort_unstable();
    tids.dedup();
    let foreign = tabs::foreign_tabs(&state.db, req.session_id, &tids).await?;
    if !foreign.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Tabs {:?} do not belong to session {}",
            foreign, req.session_id
        )));
    }

    let inserted_count = events::insert_batch(&state.db, req.session_id, caller.user_id, &batch).await?;
    debug!(session_id = req.session_id, inserted_count, "Event batch stored");

    Ok(Json(EventBatchResponse { inserted_count }))
}

//! Whitelist management

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use ddt_common::db::WhitelistEntry;
use ddt_common::domain::normalize_domain_input;
use ddt_common::time;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::auth::AuthUser;
use crate::db::whitelist;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct WhitelistResponse {
    pub whitelist: Vec<WhitelistEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AddWhitelistRequest {
    pub domain_name: Option<String>,
    #[serde(default)]
    pub user_reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddWhitelistResponse {
    pub status: &'static str,
    pub whitelisted: bool,
    pub domain_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct RemoveWhitelistQuery {
    pub domain_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RemoveWhitelistResponse {
    pub status: &'static str,
    pub removed: bool,
}

/// GET /api/whitelist
pub async fn list_whitelist(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<WhitelistResponse>> {
    let whitelist = whitelist::list(&state.db, caller.user_id).await?;
    Ok(Json(WhitelistResponse { whitelist }))
}

/// POST /api/whitelist
pub async fn add_whitelist(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(req): Json<AddWhitelistRequest>,
) -> ApiResult<Json<AddWhitelistResponse>> {
    let raw = req
        .domain_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing domain name".to_string()))?;
    let domain = normalize_domain_input(raw)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid domain: {}", raw)))?;

    let reason = req.user_reason.unwrap_or_default();
    let domain_id = whitelist::add(&state.db, caller.user_id, &domain, &reason, time::now()).await?;

    info!(user_id = caller.user_id, domain = %domain, domain_id, "Domain whitelisted");
    Ok(Json(AddWhitelistResponse {
        status: "ok",
        whitelisted: true,
        domain_id,
    }))
}

/// DELETE /api/whitelist?domain_id=N
pub async fn remove_whitelist(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Query(query): Query<RemoveWhitelistQuery>,
) -> ApiResult<Json<RemoveWhitelistResponse>> {
    let domain_id = query
        .domain_id
        .ok_or_else(|| ApiError::BadRequest("Missing domain ID".to_string()))?;

    let removed = whitelist::remove(&state.db, caller.user_id, domain_id).await?;
    info!(user_id = caller.user_id, domain_id, removed, "Whitelist entry removed");

    Ok(Json(RemoveWhitelistResponse {
        status: "ok",
        removed,
    }))
}

//! Dashboard analytics and insights

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Duration;
use ddt_common::db::DriftEvent;
use ddt_common::time;
use serde::{Deserialize, Serialize};

use super::auth::AuthUser;
use crate::db::dashboard::{
    self, CategoryTotal, DomainSummaryRow, DriftHour, SessionProductivity, StickyDistraction,
    UnclassifiedDomain,
};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub const DEFAULT_PERIOD_DAYS: i64 = 7;
pub const MAX_PERIOD_DAYS: i64 = 365;

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub period_days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub drift_events: Vec<DriftEvent>,
    pub domain_summaries: Vec<DomainSummaryRow>,
    pub category_totals: Vec<CategoryTotal>,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub unclassified_domains: Vec<UnclassifiedDomain>,
    pub session_productivity: Vec<SessionProductivity>,
    pub driftiest_hours: Vec<DriftHour>,
    pub stickiest_distractions: Vec<StickyDistraction>,
}

/// GET /api/dashboard/analytics?period_days=7
pub async fn analytics(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<Json<AnalyticsResponse>> {
    let period_days = query.period_days.unwrap_or(DEFAULT_PERIOD_DAYS);
    if !(1..=MAX_PERIOD_DAYS).contains(&period_days) {
        return Err(ApiError::BadRequest(format!(
            "period_days must be between 1 and {}",
            MAX_PERIOD_DAYS
        )));
    }

    let since = time::now().date() - Duration::days(period_days);
    let db = &state.db;

    Ok(Json(AnalyticsResponse {
        drift_events: dashboard::drifts_since(db, caller.user_id, since).await?,
        domain_summaries: dashboard::domain_summaries_since(db, caller.user_id, since).await?,
        category_totals: dashboard::category_totals_since(db, caller.user_id, since).await?,
    }))
}

/// GET /api/dashboard/insights
pub async fn insights(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<InsightsResponse>> {
    let db = &state.db;
    let uid = caller.user_id;
    let today = time::now().date();

    Ok(Json(InsightsResponse {
        unclassified_domains: dashboard::unclassified_domains(db, uid, today).await?,
        session_productivity: dashboard::session_productivity(db, uid).await?,
        driftiest_hours: dashboard::driftiest_hours(db, uid).await?,
        stickiest_distractions: dashboard::stickiest_distractions(db, uid).await?,
    }))
}

//! ddt-server library - Digital Drift Tracker backend
//!
//! HTTP API for the browser extension and dashboard, plus the drift
//! analysis engine and background jobs that run beside it.

use axum::{extract::DefaultBodyLimit, Router};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod analysis;
pub mod api;
pub mod db;
pub mod error;
pub mod jobs;

pub use error::{ApiError, ApiResult};

/// Request bodies above this are rejected with 413; event batches from a
/// long offline stretch can be large
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Bearer token signing secret, loaded from `settings`
    pub token_secret: i64,
    pub token_ttl_minutes: i64,
    /// Default look-back for on-demand analysis
    pub analysis_window_hours: i64,
}

impl AppState {
    pub fn new(db: SqlitePool, token_secret: i64, config: &ddt_common::config::Config) -> Self {
        Self {
            db,
            token_secret,
            token_ttl_minutes: config.token_ttl_minutes,
            analysis_window_hours: config.analysis_window_hours,
        }
    }
}

/// Build application router
///
/// Everything under `/api` except signup and login goes through the bearer
/// token middleware.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    let protected = Router::new()
        .route("/api/auth/me", get(api::auth::me))
        .route("/api/session/start", post(api::sessions::start_session))
        .route("/api/session/close", post(api::sessions::close_session))
        .route("/api/tab/open", post(api::tabs::open_tab))
        .route("/api/tab/close", post(api::tabs::close_tab))
        .route("/api/events/batch", post(api::events::ingest_batch))
        .route(
            "/api/whitelist",
            get(api::whitelist::list_whitelist)
                .post(api::whitelist::add_whitelist)
                .delete(api::whitelist::remove_whitelist),
        )
        .route("/api/dashboard/analytics", get(api::dashboard::analytics))
        .route("/api/dashboard/insights", get(api::dashboard::insights))
        .route("/api/drift/analyze", post(api::drift::analyze))
        .route("/api/drift/events", get(api::drift::list_drifts))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    let public = Router::new()
        .route("/api/auth/signup", post(api::auth::signup))
        .route("/api/auth/login", post(api::auth::login))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins; otherwise `level` applies to this workspace's crates and
/// the HTTP trace layer.
pub fn init_tracing(level: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fallback = format!(
        "ddt_server={level},ddt_jobs={level},ddt_common={level},tower_http={level}",
        level = level
    );
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

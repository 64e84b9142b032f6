//! Integration tests for ddt-server API endpoints
//!
//! Each test runs against a fresh SQLite file in a temp directory, driving
//! the router with `oneshot` and real bearer tokens.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDateTime, Utc};
use ddt_common::auth::load_token_secret;
use ddt_common::config::Config;
use ddt_common::db::init_database;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method
use ddt_server::{build_router, jobs, AppState};

struct TestApp {
    _dir: TempDir,
    pool: SqlitePool,
    router: Router,
}

async fn setup_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("ddt.db")).await.unwrap();
    let secret = load_token_secret(&pool).await.unwrap();
    let state = AppState::new(pool.clone(), secret, &Config::default());
    TestApp {
        _dir: dir,
        pool,
        router: build_router(state),
    }
}

impl TestApp {
    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn signup(&self, email: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/auth/signup",
                None,
                Some(json!({
                    "email": email,
                    "password": "hunter22",
                    "confirm_password": "hunter22",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "signup failed: {}", body);
        body["access_token"].as_str().unwrap().to_string()
    }

    async fn start_session(&self, token: &str) -> i64 {
        let (status, body) = self
            .send(
                "POST",
                "/api/session/start",
                Some(token),
                Some(json!({
                    "browser_name": "Firefox",
                    "browser_version": "128.0",
                    "platform": "Linux",
                    "timezone": "Europe/Berlin",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["sid"].as_i64().unwrap()
    }

    async fn open_tab(&self, token: &str, sid: i64, url: &str) -> (i64, i64) {
        let (status, body) = self
            .send(
                "POST",
                "/api/tab/open",
                Some(token),
                Some(json!({ "session_id": sid, "url": url, "title": "page" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "tab open failed: {}", body);
        (body["tid"].as_i64().unwrap(), body["domain_id"].as_i64().unwrap())
    }

    async fn category_of(&self, domain_id: i64) -> String {
        sqlx::query_scalar("SELECT category FROM domains WHERE id = ?")
            .bind(domain_id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

fn iso(ts: NaiveDateTime) -> String {
    format!("{}Z", ts.format("%Y-%m-%dT%H:%M:%S"))
}

// =============================================================================
// Service surface
// =============================================================================

#[tokio::test]
async fn test_root_and_health_need_no_auth() {
    let app = setup_app().await;

    let (status, body) = app.send("GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Digital Drift Tracker API is running");

    let (status, body) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "ddt-server");
    assert!(body["version"].is_string());

    let (status, body) = app.send("GET", "/api/buildinfo", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["git_hash"].is_string());
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_signup_then_me() {
    let app = setup_app().await;
    let token = app.signup("Ada@Example.com").await;

    let (status, body) = app.send("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ada@example.com");
    assert!(body["id"].as_i64().unwrap() > 0);
    assert!(body["created_at"].is_string());
}

#[tokio::test]
async fn test_signup_rejections() {
    let app = setup_app().await;
    app.signup("ada@example.com").await;

    let cases = [
        (json!({"email": "ada@example.com", "password": "a", "confirm_password": "a"}),
         "Email already registered"),
        (json!({"email": "bob@example.com", "password": "a", "confirm_password": "b"}),
         "Passwords do not match"),
        (json!({"email": "not-an-email", "password": "a", "confirm_password": "a"}),
         "Invalid email address"),
        (json!({"email": "bob@example.com", "password": "", "confirm_password": ""}),
         "Password must not be empty"),
    ];

    for (payload, message) in cases {
        let (status, body) = app.send("POST", "/api/auth/signup", None, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], message);
    }
}

#[tokio::test]
async fn test_login() {
    let app = setup_app().await;
    app.signup("ada@example.com").await;

    let (status, body) = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": " ADA@example.com", "password": "hunter22"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["email"], "ada@example.com");

    let token = body["access_token"].as_str().unwrap();
    let (status, _) = app.send("GET", "/api/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_failure_is_401_with_challenge() {
    let app = setup_app().await;
    app.signup("ada@example.com").await;

    for payload in [
        json!({"email": "ada@example.com", "password": "wrong"}),
        json!({"email": "nobody@example.com", "password": "hunter22"}),
    ] {
        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }
}

#[tokio::test]
async fn test_protected_routes_require_valid_token() {
    let app = setup_app().await;
    let token = app.signup("ada@example.com").await;

    let (status, body) = app.send("GET", "/api/whitelist", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Could not validate credentials");

    let (status, _) = app.send("GET", "/api/whitelist", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Flip one character of the signature
    let mut tampered = token.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == '0' { '1' } else { '0' });
    let (status, _) = app.send("GET", "/api/whitelist", Some(&tampered), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Sessions and tabs
// =============================================================================

#[tokio::test]
async fn test_session_lifecycle() {
    let app = setup_app().await;
    let token = app.signup("ada@example.com").await;
    let sid = app.start_session(&token).await;
    let (tid, _) = app.open_tab(&token, sid, "https://github.com/rust-lang").await;

    let (status, body) = app
        .send("POST", "/api/session/close", Some(&token), Some(json!({ "sid": sid })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sid_closed"], sid);

    let (active, closed_at): (bool, Option<NaiveDateTime>) =
        sqlx::query_as("SELECT is_active, closed_at FROM tab WHERE tid = ?")
            .bind(tid)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert!(!active);
    assert!(closed_at.is_some());

    let first_end: Option<NaiveDateTime> =
        sqlx::query_scalar("SELECT end_time FROM sessions WHERE sid = ?")
            .bind(sid)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert!(first_end.is_some());

    // Closing again keeps the original end time
    let (status, _) = app
        .send("POST", "/api/session/close", Some(&token), Some(json!({ "sid": sid })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let second_end: Option<NaiveDateTime> =
        sqlx::query_scalar("SELECT end_time FROM sessions WHERE sid = ?")
            .bind(sid)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(first_end, second_end);
}

#[tokio::test]
async fn test_session_close_errors() {
    let app = setup_app().await;
    let ada = app.signup("ada@example.com").await;
    let bob = app.signup("bob@example.com").await;
    let sid = app.start_session(&ada).await;

    let (status, body) = app
        .send("POST", "/api/session/close", Some(&ada), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Missing session ID");

    let (status, _) = app
        .send("POST", "/api/session/close", Some(&bob), Some(json!({ "sid": sid })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tab_open_categorizes_domain() {
    let app = setup_app().await;
    let token = app.signup("ada@example.com").await;
    let sid = app.start_session(&token).await;

    let (_, yt) = app.open_tab(&token, sid, "https://www.youtube.com/watch?v=1").await;
    assert_eq!(app.category_of(yt).await, "Unproductive");

    let (status, _) = app
        .send(
            "POST",
            "/api/whitelist",
            Some(&token),
            Some(json!({ "domain_name": "docs.rs", "user_reason": "work" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, docs) = app.open_tab(&token, sid, "https://docs.rs/tokio/latest").await;
    assert_eq!(app.category_of(docs).await, "Productive");

    // Same domain reuses the row
    let (_, again) = app.open_tab(&token, sid, "https://youtube.com/feed").await;
    assert_eq!(again, yt);
}

#[tokio::test]
async fn test_tab_open_errors() {
    let app = setup_app().await;
    let ada = app.signup("ada@example.com").await;
    let bob = app.signup("bob@example.com").await;
    let sid = app.start_session(&ada).await;

    let (status, body) = app
        .send(
            "POST",
            "/api/tab/open",
            Some(&ada),
            Some(json!({ "session_id": sid, "url": "not a url" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Invalid URL");

    let (status, _) = app
        .send(
            "POST",
            "/api/tab/open",
            Some(&bob),
            Some(json!({ "session_id": sid, "url": "https://example.com", "user_id": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tab_close() {
    let app = setup_app().await;
    let ada = app.signup("ada@example.com").await;
    let bob = app.signup("bob@example.com").await;
    let sid = app.start_session(&ada).await;
    let (tid, _) = app.open_tab(&ada, sid, "https://example.com").await;

    let (status, body) = app
        .send("POST", "/api/tab/close", Some(&ada), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Missing tab ID");

    let (status, _) = app
        .send("POST", "/api/tab/close", Some(&bob), Some(json!({ "tid": tid })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send("POST", "/api/tab/close", Some(&ada), Some(json!({ "tid": tid })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tid_closed"], tid);
}

// =============================================================================
// Events
// =============================================================================

#[tokio::test]
async fn test_event_batch_insert() {
    let app = setup_app().await;
    let token = app.signup("ada@example.com").await;
    let sid = app.start_session(&token).await;
    let (tid, _) = app.open_tab(&token, sid, "https://example.com").await;

    let (status, body) = app
        .send(
            "POST",
            "/api/events/batch",
            Some(&token),
            Some(json!({
                "session_id": sid,
                "user_id": 999,
                "events": [
                    {"tab_id": tid, "event_type": "TAB_FOCUS", "timestamp": "2025-03-10T09:00:00Z"},
                    {"tab_id": tid, "event_type": "CLICK", "timestamp": "2025-03-10T09:00:05Z",
                     "mouse_x": 10, "mouse_y": 20, "target_element_id": "btn"},
                    {"tab_id": tid, "event_type": "SCROLL", "timestamp": "2025-03-10T09:00:07.500Z",
                     "scroll_y_pixels": 400, "scroll_y_percent": 33.3},
                ],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["inserted_count"], 3);

    // Stored against the authenticated user, not the client's user_id
    let owners: Vec<i64> = sqlx::query_scalar("SELECT DISTINCT user_id FROM activity_event")
        .fetch_all(&app.pool)
        .await
        .unwrap();
    assert_eq!(owners.len(), 1);
    assert_ne!(owners[0], 999);

    let (status, body) = app
        .send(
            "POST",
            "/api/events/batch",
            Some(&token),
            Some(json!({ "session_id": sid, "events": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inserted_count"], 0);
}

#[tokio::test]
async fn test_event_batch_is_all_or_nothing() {
    let app = setup_app().await;
    let token = app.signup("ada@example.com").await;
    let sid = app.start_session(&token).await;
    let other_sid = app.start_session(&token).await;
    let (tid, _) = app.open_tab(&token, sid, "https://example.com").await;
    let (other_tid, _) = app.open_tab(&token, other_sid, "https://example.org").await;

    let (status, body) = app
        .send(
            "POST",
            "/api/events/batch",
            Some(&token),
            Some(json!({
                "session_id": sid,
                "events": [
                    {"tab_id": tid, "event_type": "TAB_FOCUS", "timestamp": "2025-03-10T09:00:00Z"},
                    {"tab_id": tid, "event_type": "TELEPORT", "timestamp": "2025-03-10T09:00:01Z"},
                ],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Unknown event type: TELEPORT");

    let (status, _) = app
        .send(
            "POST",
            "/api/events/batch",
            Some(&token),
            Some(json!({
                "session_id": sid,
                "events": [
                    {"tab_id": tid, "event_type": "TAB_FOCUS", "timestamp": "2025-03-10T09:00:00Z"},
                    {"tab_id": other_tid, "event_type": "CLICK", "timestamp": "2025-03-10T09:00:01Z"},
                ],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activity_event")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

// =============================================================================
// Whitelist
// =============================================================================

#[tokio::test]
async fn test_whitelist_add_list_remove() {
    let app = setup_app().await;
    let token = app.signup("ada@example.com").await;

    let (status, body) = app
        .send(
            "POST",
            "/api/whitelist",
            Some(&token),
            Some(json!({ "domain_name": "https://www.GitHub.com/rust-lang" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["whitelisted"], true);
    let domain_id = body["domain_id"].as_i64().unwrap();

    // Re-adding replaces the reason rather than duplicating
    let (status, body) = app
        .send(
            "POST",
            "/api/whitelist",
            Some(&token),
            Some(json!({ "domain_name": "github.com", "user_reason": "code review" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["domain_id"], domain_id);

    let (status, body) = app.send("GET", "/api/whitelist", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body["whitelist"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["domain_name"], "github.com");
    assert_eq!(list[0]["category"], "Productive");
    assert_eq!(list[0]["user_reason"], "code review");

    let uri = format!("/api/whitelist?domain_id={}", domain_id);
    let (status, body) = app.send("DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], true);
    assert_eq!(app.category_of(domain_id).await, "Unproductive");

    let (_, body) = app.send("DELETE", &uri, Some(&token), None).await;
    assert_eq!(body["removed"], false);
}

#[tokio::test]
async fn test_whitelist_validation() {
    let app = setup_app().await;
    let token = app.signup("ada@example.com").await;

    let (status, body) = app
        .send("POST", "/api/whitelist", Some(&token), Some(json!({ "domain_name": "  " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Missing domain name");

    let (status, _) = app.send("DELETE", "/api/whitelist", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_whitelist_is_per_user() {
    let app = setup_app().await;
    let ada = app.signup("ada@example.com").await;
    let bob = app.signup("bob@example.com").await;

    app.send("POST", "/api/whitelist", Some(&ada), Some(json!({ "domain_name": "docs.rs" })))
        .await;

    let (_, body) = app.send("GET", "/api/whitelist", Some(&bob), None).await;
    assert!(body["whitelist"].as_array().unwrap().is_empty());
}

// =============================================================================
// Drift analysis and dashboard
// =============================================================================

/// Whitelisted docs.rs, then a short YouTube detour
async fn seed_focus_break(app: &TestApp, token: &str) -> (i64, NaiveDateTime) {
    app.send("POST", "/api/whitelist", Some(token), Some(json!({ "domain_name": "docs.rs" })))
        .await;
    let sid = app.start_session(token).await;
    let (docs, _) = app.open_tab(token, sid, "https://docs.rs/serde").await;
    let (yt, _) = app.open_tab(token, sid, "https://www.youtube.com/watch?v=2").await;

    let base = Utc::now().date_naive().and_hms_opt(0, 1, 0).unwrap();
    let at = |s: i64| iso(base + Duration::seconds(s));

    let (status, _) = app
        .send(
            "POST",
            "/api/events/batch",
            Some(token),
            Some(json!({
                "session_id": sid,
                "events": [
                    {"tab_id": docs, "event_type": "TAB_FOCUS", "timestamp": at(0)},
                    {"tab_id": yt, "event_type": "TAB_FOCUS", "timestamp": at(40)},
                    {"tab_id": docs, "event_type": "TAB_FOCUS", "timestamp": at(130)},
                    {"tab_id": docs, "event_type": "SCROLL", "timestamp": at(160)},
                ],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    (sid, base)
}

#[tokio::test]
async fn test_drift_analysis_end_to_end() {
    let app = setup_app().await;
    let token = app.signup("ada@example.com").await;
    let (sid, _) = seed_focus_break(&app, &token).await;

    let (status, body) = app
        .send("POST", "/api/drift/analyze", Some(&token), Some(json!({ "session_id": sid })))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let report = &body["reports"][0];
    assert_eq!(report["session_id"], sid);
    assert_eq!(report["events_scanned"], 4);
    assert!(report["inserted"].as_u64().unwrap() >= 3);

    let uri = format!("/api/drift/events?session_id={}", sid);
    let (status, body) = app.send("GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let types: Vec<&str> = body["drift_events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["drift_type"].as_str().unwrap())
        .collect();
    assert!(types.contains(&"FOCUS_BREAK"));
    assert!(types.contains(&"TASK_ABANDONMENT"));
    assert!(types.contains(&"Unproductive Shift"));

    let focus_break = body["drift_events"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["drift_type"] == "FOCUS_BREAK")
        .unwrap();
    assert_eq!(focus_break["description"], "Focus break for 90s");
    assert_eq!(focus_break["severity"], "MEDIUM");
    assert_eq!(focus_break["duration_seconds"], 90);

    // A second run finds the same drifts and writes nothing new
    let (_, body) = app
        .send("POST", "/api/drift/analyze", Some(&token), Some(json!({ "session_id": sid })))
        .await;
    assert_eq!(body["reports"][0]["inserted"], 0);
}

#[tokio::test]
async fn test_drift_analysis_recent_and_ownership() {
    let app = setup_app().await;
    let ada = app.signup("ada@example.com").await;
    let bob = app.signup("bob@example.com").await;
    let (sid, _) = seed_focus_break(&app, &ada).await;

    let (status, _) = app
        .send("POST", "/api/drift/analyze", Some(&bob), Some(json!({ "session_id": sid })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send("POST", "/api/drift/analyze", Some(&ada), Some(json!({ "hours": 2 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reports"].as_array().unwrap().len(), 1);

    // Bob sees none of Ada's drifts
    let (_, body) = app.send("GET", "/api/drift/events", Some(&bob), None).await;
    assert!(body["drift_events"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_drift_analysis_window_bounds() {
    let app = setup_app().await;
    let token = app.signup("ada@example.com").await;

    for hours in [0_i64, -3, 24 * 365 + 1, 10_000_000_000] {
        let (status, body) = app
            .send("POST", "/api/drift/analyze", Some(&token), Some(json!({ "hours": hours })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "hours = {}", hours);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    let (status, _) = app
        .send("POST", "/api/drift/analyze", Some(&token), Some(json!({ "hours": 24 * 365 })))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_dashboard_analytics() {
    let app = setup_app().await;
    let token = app.signup("ada@example.com").await;
    let (sid, base) = seed_focus_break(&app, &token).await;

    app.send("POST", "/api/drift/analyze", Some(&token), Some(json!({ "session_id": sid })))
        .await;
    jobs::update_daily_summaries(&app.pool, base.date()).await.unwrap();

    let (status, body) = app
        .send("GET", "/api/dashboard/analytics", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["drift_events"].as_array().unwrap().is_empty());

    let summaries = body["domain_summaries"].as_array().unwrap();
    let docs = summaries.iter().find(|s| s["domain_name"] == "docs.rs").unwrap();
    // 40s before the detour plus 30s after it
    assert_eq!(docs["total_seconds_focused"], 70);
    assert_eq!(docs["total_events"], 3);

    let totals = body["category_totals"].as_array().unwrap();
    let productive = totals.iter().find(|t| t["category"] == "Productive").unwrap();
    assert_eq!(productive["total_seconds"], 70);

    for bad in ["0", "366", "-3"] {
        let uri = format!("/api/dashboard/analytics?period_days={}", bad);
        let (status, _) = app.send("GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "period_days={}", bad);
    }
}

#[tokio::test]
async fn test_dashboard_insights() {
    let app = setup_app().await;
    let token = app.signup("ada@example.com").await;
    let (sid, base) = seed_focus_break(&app, &token).await;

    app.send("POST", "/api/drift/analyze", Some(&token), Some(json!({ "session_id": sid })))
        .await;
    app.send("POST", "/api/session/close", Some(&token), Some(json!({ "sid": sid })))
        .await;
    jobs::update_daily_summaries(&app.pool, base.date()).await.unwrap();

    let (status, body) = app
        .send("GET", "/api/dashboard/insights", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let sessions = body["session_productivity"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["sid"], sid);
    assert_eq!(sessions[0]["tab_switches"], 3);

    let sticky = body["stickiest_distractions"].as_array().unwrap();
    assert_eq!(sticky[0]["domain_name"], "youtube.com");
    assert_eq!(sticky[0]["avg_duration_seconds"], 90.0);

    let hours = body["driftiest_hours"].as_array().unwrap();
    assert_eq!(hours[0]["drift_hour"], 0);
    assert!(hours[0]["most_common_drift_type"].is_string());

    // Every visited domain is classified, so nothing is pending review
    assert!(body["unclassified_domains"].as_array().unwrap().is_empty());
}

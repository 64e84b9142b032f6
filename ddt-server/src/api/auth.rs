//! Account endpoints and bearer-token middleware
//!
//! Tokens are signed with the per-database secret held in [`AppState`].
//! The middleware resolves the caller once and hands handlers an
//! [`AuthUser`] through request extensions, so no handler trusts a
//! client-supplied user id.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
    Extension, Json,
};
use chrono::{Duration, NaiveDateTime};
use ddt_common::auth::{hash_password, issue_token, verify_password, verify_token, Claims};
use ddt_common::time;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::{self, users};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const INVALID_CREDENTIALS: &str = "Could not validate credentials";

/// The authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
}

/// Reject requests without a valid bearer token
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    let claims = verify_token(token, state.token_secret, time::unix_now()).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        ApiError::Unauthorized(INVALID_CREDENTIALS.to_string())
    })?;

    request.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
        email: claims.email,
    });

    Ok(next.run(request).await)
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Loose structural check; deliverability is not our concern
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user_id: i64,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub email: String,
    pub created_at: NaiveDateTime,
}

fn token_for(state: &AppState, user_id: i64, email: &str) -> ApiResult<TokenResponse> {
    let exp = (time::now() + Duration::minutes(state.token_ttl_minutes))
        .and_utc()
        .timestamp();
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp,
    };
    Ok(TokenResponse {
        access_token: issue_token(&claims, state.token_secret)?,
        token_type: "bearer".to_string(),
        user_id,
        email: email.to_string(),
    })
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<Json<TokenResponse>> {
    if req.password != req.confirm_password {
        return Err(ApiError::BadRequest("Passwords do not match".to_string()));
    }
    let email = req.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    if req.password.is_empty() {
        return Err(ApiError::BadRequest("Password must not be empty".to_string()));
    }

    if users::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::BadRequest("Email already registered".to_string()));
    }

    let digest = hash_password(&req.password);
    let user_id = match users::insert_user(&state.db, &email, &digest, time::now()).await {
        Ok(id) => id,
        // Lost a race with a concurrent signup
        Err(e) if db::is_unique_violation(&e) => {
            return Err(ApiError::BadRequest("Email already registered".to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id, "User registered");
    Ok(Json(token_for(&state, user_id, &email)?))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let email = req.email.trim().to_lowercase();
    let rejected = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = users::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(rejected)?;

    if !verify_password(&req.password, &user.password_hash, &user.password_salt) {
        debug!(user_id = user.uid, "Password mismatch");
        return Err(rejected());
    }

    Ok(Json(token_for(&state, user.uid, &user.email)?))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<MeResponse>> {
    let user = users::find_by_id(&state.db, caller.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse {
        id: user.uid,
        email: user.email,
        created_at: user.created_at,
    }))
}

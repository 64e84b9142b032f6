//! Password hashing and bearer token signing
//!
//! # Passwords
//!
//! Each user gets a 16-byte random salt. The stored hash is SHA-256 applied
//! `PASSWORD_ROUNDS` times over `salt || password`, hex encoded. The salt is
//! stored next to it in `users.password_salt`.
//!
//! # Tokens
//!
//! `base64url(claims_json) + "." + hex(sha256(payload + "." + secret))`.
//! The secret is a non-zero random i64 persisted in `settings.token_secret`
//! on first start. Claims carry the user id (`sub`), email and a Unix
//! expiry (`exp`).

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::{Error, Result};

/// Stretching rounds for password digests
pub const PASSWORD_ROUNDS: u32 = 10_000;

/// Settings key holding the token signing secret
pub const TOKEN_SECRET_KEY: &str = "token_secret";

// ========================================
// Passwords
// ========================================

/// Salted password digest ready to store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordDigest {
    pub hash: String,
    pub salt: String,
}

/// Hash a new password with a fresh random salt
pub fn hash_password(password: &str) -> PasswordDigest {
    let salt_bytes: [u8; 16] = rand::thread_rng().gen();
    let salt = to_hex(&salt_bytes);
    let hash = digest_password(password, &salt);
    PasswordDigest { hash, salt }
}

/// Check a password attempt against a stored digest
pub fn verify_password(password: &str, stored_hash: &str, stored_salt: &str) -> bool {
    let calculated = digest_password(password, stored_salt);
    constant_time_eq(calculated.as_bytes(), stored_hash.as_bytes())
}

fn digest_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let mut digest = hasher.finalize();

    for _ in 1..PASSWORD_ROUNDS {
        let mut hasher = Sha256::new();
        hasher.update(digest);
        hasher.update(salt.as_bytes());
        digest = hasher.finalize();
    }

    format!("{:x}", digest)
}

// ========================================
// Tokens
// ========================================

/// Claims embedded in a bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,
    pub email: String,
    /// Expiry, Unix seconds
    pub exp: i64,
}

/// Reasons a bearer token is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("signature mismatch")]
    BadSignature,

    #[error("token expired at {0}")]
    Expired(i64),
}

/// Sign claims into a bearer token
pub fn issue_token(claims: &Claims, secret: i64) -> Result<String> {
    let json = serde_json::to_vec(claims)?;
    let payload = URL_SAFE_NO_PAD.encode(json);
    let signature = sign(&payload, secret);
    Ok(format!("{}.{}", payload, signature))
}

/// Verify signature and expiry; `now` is Unix seconds
pub fn verify_token(
    token: &str,
    secret: i64,
    now: i64,
) -> std::result::Result<Claims, TokenError> {
    let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;

    let calculated = sign(payload, secret);
    if !constant_time_eq(calculated.as_bytes(), signature.as_bytes()) {
        return Err(TokenError::BadSignature);
    }

    let json = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Malformed)?;
    let claims: Claims = serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

    if claims.exp <= now {
        return Err(TokenError::Expired(claims.exp));
    }
    Ok(claims)
}

fn sign(payload: &str, secret: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hasher.update(b".");
    hasher.update(secret.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

// ========================================
// Secret management
// ========================================

/// Load the token signing secret, generating it on first use
pub async fn load_token_secret(db: &SqlitePool) -> Result<i64> {
    let stored: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(TOKEN_SECRET_KEY)
            .fetch_optional(db)
            .await?;

    match stored {
        Some(value) => value
            .parse::<i64>()
            .map_err(|e| Error::Config(format!("Invalid {}: {}", TOKEN_SECRET_KEY, e))),
        None => initialize_token_secret(db).await,
    }
}

/// Generate and persist a non-zero random secret
///
/// `INSERT OR IGNORE` followed by a re-read keeps two racing processes on the
/// same value.
pub async fn initialize_token_secret(db: &SqlitePool) -> Result<i64> {
    let secret: i64 = {
        let mut rng = rand::thread_rng();
        loop {
            let val = rng.gen::<i64>();
            if val != 0 {
                break val;
            }
        }
    };

    sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
        .bind(TOKEN_SECRET_KEY)
        .bind(secret.to_string())
        .execute(db)
        .await?;

    let value: String = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(TOKEN_SECRET_KEY)
        .fetch_one(db)
        .await?;

    value
        .parse::<i64>()
        .map_err(|e| Error::Config(format!("Invalid {}: {}", TOKEN_SECRET_KEY, e)))
}

// ========================================
// Helpers
// ========================================

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

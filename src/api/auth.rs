//! Session cookies and the authenticated-user extractor.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::{HeaderMap, HeaderValue, COOKIE};
use axum::http::request::Parts;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};

use crate::api::response::ApiError;
use crate::config::AuthConfig;
use crate::storage::models::{SessionRecord, UserRecord};
use crate::AppState;

pub const SESSION_COOKIE: &str = "fileos_session";

const SESSION_ID_BYTES: usize = 32;
const SHARE_TOKEN_BYTES: usize = 16;

/// The user behind a valid session cookie.
pub struct CurrentUser(pub UserRecord);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, ApiError> {
        let session_id = cookie_value(&parts.headers, SESSION_COOKIE)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        let session = state
            .db
            .get_session(&session_id)?
            .ok_or_else(|| ApiError::unauthorized("Session not found"))?;

        if session.is_expired(Utc::now()) {
            state.db.delete_session(&session.id)?;
            return Err(ApiError::unauthorized("Session expired"));
        }

        let user = state
            .db
            .get_user(&session.user_id)?
            .ok_or_else(|| ApiError::unauthorized("Session user no longer exists"))?;

        Ok(CurrentUser(user))
    }
}

/// Create a session record for a user with a fresh random id.
pub fn new_session(user_id: &str, ttl_secs: i64) -> Result<SessionRecord, ApiError> {
    let now = Utc::now();
    Ok(SessionRecord {
        id: random_token(SESSION_ID_BYTES)?,
        user_id: user_id.to_string(),
        created_at: now,
        expires_at: now + Duration::seconds(ttl_secs),
    })
}

/// Unguessable token for share links.
pub fn new_share_token() -> Result<String, ApiError> {
    random_token(SHARE_TOKEN_BYTES)
}

fn random_token(len: usize) -> Result<String, ApiError> {
    let mut bytes = vec![0u8; len];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| ApiError::internal("Failed to generate random token"))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Compare a presented secret against the configured one without an early exit.
pub fn secret_matches(presented: &str, expected: &str) -> bool {
    let a = ring::digest::digest(&ring::digest::SHA256, presented.as_bytes());
    let b = ring::digest::digest(&ring::digest::SHA256, expected.as_bytes());
    a.as_ref()
        .iter()
        .zip(b.as_ref())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// `Set-Cookie` value that installs the session.
pub fn session_cookie(session: &SessionRecord, auth: &AuthConfig) -> Result<HeaderValue, ApiError> {
    let mut cookie = format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session.id, auth.session_ttl_secs
    );
    if auth.cookie_secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(|e| ApiError::internal(e.to_string()))
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("fileos_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Find a cookie by name across all `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

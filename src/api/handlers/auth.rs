use axum::extract::State;
use axum::http::header::{HeaderMap, SET_COOKIE};
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use chrono::Utc;
use std::sync::Arc;

use crate::api::auth::{self, CurrentUser, SESSION_COOKIE};
use crate::api::dto::{LoginRequest, UserResponse};
use crate::api::response::{ApiError, AppJson, JSend};
use crate::storage::models::UserRecord;
use crate::AppState;

const AUTH_SECRET_HEADER: &str = "x-auth-secret";

/// Identity-provider callback: upsert the user and open a session.
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    match state.config.auth.shared_secret {
        Some(ref expected) => {
            let presented = headers
                .get(AUTH_SECRET_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            if !auth::secret_matches(presented, expected) {
                return Err(ApiError::unauthorized("Invalid identity provider secret"));
            }
        }
        // Unauthenticated claims are only trusted in test mode
        None if state.config.test_mode => {}
        None => {
            return Err(ApiError::unauthorized(
                "Login is disabled: no identity provider secret configured",
            ));
        }
    }

    let id = req.id.trim();
    if id.is_empty() {
        return Err(ApiError::bad_request("id must not be empty"));
    }

    let now = Utc::now();
    let user = state.db.upsert_user(&UserRecord {
        id: id.to_string(),
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
        profile_image_url: req.profile_image_url,
        created_at: now,
        updated_at: now,
    })?;

    let expired = state.db.purge_expired_sessions(now)?;
    if expired > 0 {
        tracing::debug!(count = expired, "Removed expired sessions");
    }

    let session = auth::new_session(&user.id, state.config.auth.session_ttl_secs)?;
    state.db.put_session(&session)?;
    let cookie = auth::session_cookie(&session, &state.config.auth)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        JSend::success(UserResponse::from(&user)),
    ))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(session_id) = auth::cookie_value(&headers, SESSION_COOKIE) {
        state.db.delete_session(&session_id)?;
    }

    Ok((
        AppendHeaders([(SET_COOKIE, auth::clear_session_cookie())]),
        JSend::success(()),
    ))
}

pub async fn current_user(CurrentUser(user): CurrentUser) -> Json<JSend<UserResponse>> {
    JSend::success(UserResponse::from(&user))
}

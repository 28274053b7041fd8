use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use crate::api::auth::CurrentUser;
use crate::api::dto::{SettingsResponse, UpdateSettingsRequest};
use crate::api::response::{ApiError, AppJson, JSend};
use crate::AppState;

/// Users without a stored record get the defaults; nothing is written.
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<JSend<SettingsResponse>>, ApiError> {
    let settings = state
        .db
        .get_settings(&user.id)?
        .map(|record| SettingsResponse::from(&record))
        .unwrap_or_default();

    Ok(JSend::success(settings))
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    AppJson(req): AppJson<UpdateSettingsRequest>,
) -> Result<Json<JSend<SettingsResponse>>, ApiError> {
    if req.theme.is_none() && req.desktop_background.is_none() && req.custom_colors.is_none() {
        return Err(ApiError::bad_request(
            "at least one field (theme, desktop_background, custom_colors) must be provided",
        ));
    }
    if let Some(ref theme) = req.theme {
        if theme.trim().is_empty() {
            return Err(ApiError::bad_request("theme must not be empty"));
        }
    }

    let record = state.db.upsert_settings(&user.id, &req.to_update())?;

    tracing::debug!(user_id = %user.id, theme = %record.theme, "Updated settings");
    Ok(JSend::success(SettingsResponse::from(&record)))
}

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use std::sync::Arc;

use super::files::random_position;
use crate::api::auth::CurrentUser;
use crate::api::dto::{FileResponse, SharedFileResponse};
use crate::api::response::{ApiError, JSend};
use crate::object_store::ObjectStoreError;
use crate::storage::models::FileRecord;
use crate::AppState;

/// Public metadata behind a share link.
pub async fn get_shared_file(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<JSend<SharedFileResponse>>, ApiError> {
    let file = shared_file(&state, &token)?;
    Ok(JSend::success(SharedFileResponse::from(&file)))
}

/// Clone a shared file onto the caller's desktop.
pub async fn add_shared_file(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(token): Path<String>,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    let source = shared_file(&state, &token)?;

    let id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now();
    let (position_x, position_y) = random_position();

    // The clone owns a separate copy of the stored bytes
    let storage_key = match source.storage_key {
        Some(ref key) => match state.object_store.copy(key, &id).await {
            Ok(()) => Some(id.clone()),
            Err(ObjectStoreError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        },
        None => None,
    };

    let file = FileRecord {
        id: id.clone(),
        owner_id: user.id.clone(),
        name: source.name,
        extension: source.extension,
        mime_type: source.mime_type,
        size: source.size,
        content: source.content,
        storage_key,
        position_x: Some(position_x),
        position_y: Some(position_y),
        is_deleted: false,
        deleted_at: None,
        share_token: None,
        created_at: now,
        updated_at: now,
    };

    if let Err(e) = state.db.put_file(&file) {
        if file.storage_key.is_some() {
            if let Err(cleanup) = state.object_store.delete(&id).await {
                tracing::warn!(file_id = %id, error = %cleanup, "Failed to remove copied bytes");
            }
        }
        return Err(e.into());
    }

    tracing::debug!(file_id = %id, source_id = %source.id, user_id = %user.id, "Added shared file");
    Ok(JSend::success(FileResponse::from(&file)))
}

/// Resolve a share token. Files sitting in the owner's recycle bin are not served.
fn shared_file(state: &AppState, token: &str) -> Result<FileRecord, ApiError> {
    state
        .db
        .get_file_by_share_token(token)?
        .filter(|file| !file.is_deleted)
        .ok_or_else(|| ApiError::not_found("Shared file not found"))
}

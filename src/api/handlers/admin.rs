use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, JSend};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PurgeResponse {
    pub files_deleted: u64,
    pub users_deleted: u64,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health() -> Json<JSend<HealthResponse>> {
    JSend::success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Wipe every table and the upload directory. Only routed in test mode.
pub async fn admin_purge(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<PurgeResponse>>, ApiError> {
    let stats = state.db.purge_all()?;

    let upload_dir = &state.config.storage.upload_dir;
    let mut entries = tokio::fs::read_dir(upload_dir)
        .await
        .map_err(crate::object_store::ObjectStoreError::from)?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(crate::object_store::ObjectStoreError::from)?
    {
        if let Err(e) = tokio::fs::remove_file(entry.path()).await {
            tracing::warn!(path = %entry.path().display(), error = %e, "Failed to remove upload");
        }
    }

    tracing::warn!(files = stats.files, users = stats.users, "Purged all data");

    Ok(JSend::success(PurgeResponse {
        files_deleted: stats.files,
        users_deleted: stats.users,
    }))
}

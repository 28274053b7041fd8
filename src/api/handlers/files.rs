use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, Path, State};
use axum::Json;
use bytes::{Bytes, BytesMut};
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;

use crate::api::auth::{self, CurrentUser};
use crate::api::dto::{EmptyTrashResponse, FileResponse, UpdateFileRequest};
use crate::api::response::{ApiError, AppJson, JSend};
use crate::storage::models::{FileKind, FileRecord, Patch};
use crate::AppState;

const UPLOAD_FIELD: &str = "files";
const FALLBACK_EXTENSION: &str = "bin";
const FALLBACK_MIME: &str = "application/octet-stream";

// ============================================================================
// Listing
// ============================================================================

pub async fn list_files(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<JSend<Vec<FileResponse>>>, ApiError> {
    let files = state.db.list_files(&user.id, false)?;
    Ok(JSend::success(files.iter().map(FileResponse::from).collect()))
}

pub async fn list_deleted_files(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<JSend<Vec<FileResponse>>>, ApiError> {
    let files = state.db.list_files(&user.id, true)?;
    Ok(JSend::success(files.iter().map(FileResponse::from).collect()))
}

pub async fn get_file(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    let file = owned_file(&state, &user.id, &id)?;
    Ok(JSend::success(FileResponse::from(&file)))
}

// ============================================================================
// Upload
// ============================================================================

/// A multipart part read fully into memory, not yet stored.
struct PendingUpload {
    file_name: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<JSend<Vec<FileResponse>>>, ApiError> {
    let limits = &state.config.storage;
    let mut pending = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if pending.len() >= limits.max_upload_files {
            return Err(ApiError::bad_request(format!(
                "At most {} files may be uploaded at once",
                limits.max_upload_files
            )));
        }

        let file_name = field.file_name().map(|s| s.to_string());
        let content_type = field.content_type().map(|s| s.to_string());
        let data = read_field(field, limits.max_upload_size).await?;

        pending.push(PendingUpload {
            file_name,
            content_type,
            data,
        });
    }

    if pending.is_empty() {
        return Err(ApiError::bad_request("No files uploaded"));
    }

    let now = Utc::now();
    let mut records = Vec::with_capacity(pending.len());

    // Phase 1: store bytes, removing whatever was already written if any part fails
    for upload in pending {
        let record = new_file_record(&user.id, &upload, now);
        if let Err(e) = state.object_store.put(&record.id, upload.data).await {
            discard_blobs(&state, &records).await;
            return Err(e.into());
        }
        records.push(record);
    }

    // Phase 2: write all metadata in one transaction
    if let Err(e) = state.db.put_files(&records) {
        discard_blobs(&state, &records).await;
        return Err(e.into());
    }

    tracing::debug!(user_id = %user.id, count = records.len(), "Uploaded files");

    Ok(JSend::success(
        records.iter().map(FileResponse::from).collect(),
    ))
}

async fn read_field(mut field: Field<'_>, max_size: u64) -> Result<Bytes, ApiError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if (buf.len() + chunk.len()) as u64 > max_size {
            return Err(ApiError::payload_too_large(format!(
                "File exceeds maximum upload size of {max_size} bytes"
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

fn multipart_error(e: MultipartError) -> ApiError {
    ApiError::Fail(e.status(), format!("Invalid multipart data: {}", e.body_text()))
}

fn new_file_record(
    owner_id: &str,
    upload: &PendingUpload,
    now: chrono::DateTime<Utc>,
) -> FileRecord {
    let id = uuid::Uuid::new_v4().to_string();
    let (name, extension) = split_file_name(upload.file_name.as_deref().unwrap_or_default());

    // Prefer the part's declared type; fall back to a guess from the extension
    let mime_type = upload
        .content_type
        .clone()
        .filter(|ct| !ct.is_empty() && ct != FALLBACK_MIME)
        .or_else(|| {
            mime_guess::from_ext(&extension)
                .first()
                .map(|m| m.to_string())
        })
        .unwrap_or_else(|| FALLBACK_MIME.to_string());

    let content = FileKind::from_extension(&extension)
        .is_text()
        .then(|| String::from_utf8_lossy(&upload.data).into_owned());

    let (position_x, position_y) = random_position();

    FileRecord {
        storage_key: Some(id.clone()),
        id,
        owner_id: owner_id.to_string(),
        name,
        extension,
        mime_type,
        size: upload.data.len() as u64,
        content,
        position_x: Some(position_x),
        position_y: Some(position_y),
        is_deleted: false,
        deleted_at: None,
        share_token: None,
        created_at: now,
        updated_at: now,
    }
}

/// Split an uploaded filename into display name and lowercase extension.
/// Anything without a usable extension is stored as `bin`.
pub(crate) fn split_file_name(original: &str) -> (String, String) {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let base = if base.is_empty() { "untitled" } else { base };

    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            (stem.to_string(), ext.to_ascii_lowercase())
        }
        _ => (base.to_string(), FALLBACK_EXTENSION.to_string()),
    }
}

/// Initial desktop position for a freshly created file.
pub(crate) fn random_position() -> (i32, i32) {
    let mut rng = rand::thread_rng();
    (rng.gen_range(16..416), rng.gen_range(16..316))
}

async fn discard_blobs(state: &AppState, records: &[FileRecord]) {
    for record in records {
        let Some(ref key) = record.storage_key else {
            continue;
        };
        if let Err(e) = state.object_store.delete(key).await {
            tracing::warn!(file_id = %record.id, error = %e, "Failed to remove stored bytes");
        }
    }
}

// ============================================================================
// Mutations
// ============================================================================

pub async fn update_file(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateFileRequest>,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    let mut update = req.to_update();
    if update.is_empty() {
        return Err(ApiError::bad_request(
            "at least one field (name, content, position_x, position_y) must be provided",
        ));
    }
    if let Some(ref name) = update.name {
        if name.trim().is_empty() {
            return Err(ApiError::bad_request("name must not be empty"));
        }
    }

    let existing = owned_file(&state, &user.id, &id)?;

    // Stored bytes of text files follow the edited content; media bytes never change
    if let (true, Some(ref key)) = (existing.kind().is_text(), &existing.storage_key) {
        let text = match update.content {
            Patch::Absent => None,
            Patch::Null => Some(String::new()),
            Patch::Value(ref text) => Some(text.clone()),
        };
        if let Some(text) = text {
            update.size = Some(text.len() as u64);
            state
                .object_store
                .put(key, Bytes::from(text.into_bytes()))
                .await?;
        }
    }

    let file = state
        .db
        .update_file(&id, &update)?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    tracing::debug!(file_id = %id, "Updated file");
    Ok(JSend::success(FileResponse::from(&file)))
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    owned_file(&state, &user.id, &id)?;

    let file = state
        .db
        .soft_delete_file(&id)?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    tracing::debug!(file_id = %id, "Moved file to recycle bin");
    Ok(JSend::success(FileResponse::from(&file)))
}

pub async fn restore_file(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    owned_file(&state, &user.id, &id)?;

    let file = state
        .db
        .restore_file(&id)?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    tracing::debug!(file_id = %id, "Restored file");
    Ok(JSend::success(FileResponse::from(&file)))
}

pub async fn permanent_delete_file(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    owned_file(&state, &user.id, &id)?;

    // Phase 1: remove metadata
    let removed = state
        .db
        .delete_file(&id)?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    // Phase 2: remove bytes (best-effort)
    discard_blobs(&state, std::slice::from_ref(&removed)).await;

    tracing::debug!(file_id = %id, "Permanently deleted file");
    Ok(JSend::success(()))
}

pub async fn empty_trash(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<JSend<EmptyTrashResponse>>, ApiError> {
    let removed = state.db.empty_trash(&user.id)?;
    discard_blobs(&state, &removed).await;

    tracing::debug!(user_id = %user.id, count = removed.len(), "Emptied recycle bin");
    Ok(JSend::success(EmptyTrashResponse {
        files_deleted: removed.len() as u64,
    }))
}

pub async fn share_file(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    let existing = owned_file(&state, &user.id, &id)?;
    if existing.share_token.is_some() {
        return Ok(JSend::success(FileResponse::from(&existing)));
    }

    let candidate = auth::new_share_token()?;
    let file = state
        .db
        .issue_share_token(&id, &candidate)?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    tracing::debug!(file_id = %id, "Shared file");
    Ok(JSend::success(FileResponse::from(&file)))
}

// ============================================================================
// Helpers
// ============================================================================

/// Load a file the caller owns: 404 when missing, 403 when someone else's.
pub(crate) fn owned_file(
    state: &AppState,
    user_id: &str,
    id: &str,
) -> Result<FileRecord, ApiError> {
    let file = state
        .db
        .get_file(id)?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    if file.owner_id != user_id {
        return Err(ApiError::forbidden("You do not have access to this file"));
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_name_and_extension() {
        assert_eq!(
            split_file_name("notes.txt"),
            ("notes".to_string(), "txt".to_string())
        );
        assert_eq!(
            split_file_name("archive.tar.GZ"),
            ("archive.tar".to_string(), "gz".to_string())
        );
    }

    #[test]
    fn missing_extension_falls_back_to_bin() {
        assert_eq!(
            split_file_name("Makefile"),
            ("Makefile".to_string(), "bin".to_string())
        );
        assert_eq!(
            split_file_name(".bashrc"),
            (".bashrc".to_string(), "bin".to_string())
        );
        assert_eq!(
            split_file_name("trailing."),
            ("trailing.".to_string(), "bin".to_string())
        );
        assert_eq!(
            split_file_name(""),
            ("untitled".to_string(), "bin".to_string())
        );
    }

    #[test]
    fn strips_client_directories() {
        assert_eq!(
            split_file_name("C:\\Users\\me\\photo.png"),
            ("photo".to_string(), "png".to_string())
        );
        assert_eq!(
            split_file_name("../../etc/passwd"),
            ("passwd".to_string(), "bin".to_string())
        );
    }

    #[test]
    fn random_positions_stay_in_range() {
        for _ in 0..100 {
            let (x, y) = random_position();
            assert!((16..416).contains(&x));
            assert!((16..316).contains(&y));
        }
    }
}

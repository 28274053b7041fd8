use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use super::files::owned_file;
use crate::api::auth::CurrentUser;
use crate::api::dto::ContentParams;
use crate::api::response::{ApiError, AppQuery};
use crate::object_store::ObjectStoreError;
use crate::storage::models::FileRecord;
use crate::AppState;

/// Serve a file's bytes.
/// Route: GET /api/files/:id/content
///
/// Streams from the upload directory when the stored key is present there and
/// falls back to the inline text content otherwise.
pub async fn serve_content(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    AppQuery(params): AppQuery<ContentParams>,
) -> Result<Response, ApiError> {
    let file = owned_file(&state, &user.id, &id)?;

    if let Some(ref key) = file.storage_key {
        match state.object_store.open(key).await {
            Ok(reader) => {
                let body = Body::from_stream(ReaderStream::new(reader));
                let mut response = (StatusCode::OK, body).into_response();
                set_content_headers(&mut response, &file, params.download);
                return Ok(response);
            }
            Err(ObjectStoreError::NotFound(_)) => {
                tracing::debug!(file_id = %file.id, "Stored bytes missing, using inline content");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let content = file
        .content
        .clone()
        .ok_or_else(|| ApiError::not_found("File content not found"))?;

    let mut response = (StatusCode::OK, content).into_response();
    set_content_headers(&mut response, &file, params.download);
    Ok(response)
}

fn set_content_headers(response: &mut Response, file: &FileRecord, download: bool) {
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        file.mime_type
            .parse()
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );

    let disposition = if download { "attachment" } else { "inline" };
    let filename = file.file_name().replace(['"', '\\', '\r', '\n'], "_");
    if let Ok(value) = format!("{disposition}; filename=\"{filename}\"").parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    // Content changes under the same URL when text is edited
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("private, no-cache"));
}

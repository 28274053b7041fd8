//! Typed HTTP client for the fileos REST API.

use bytes::Bytes;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::api::auth::SESSION_COOKIE;
use crate::api::dto::{
    EmptyTrashResponse, FileResponse, LoginRequest, SettingsResponse, SharedFileResponse,
    UpdateFileRequest, UpdateSettingsRequest, UserResponse,
};
use crate::api::response::JSend;
use crate::desktop::cache::{Mutation, MutationOutcome};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },
    #[error("Login response did not set a session cookie")]
    MissingSession,
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }
}

/// One file part of a multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            data: data.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Present identity claims and keep the session cookie from the response.
    pub async fn login(
        &mut self,
        claims: &LoginRequest,
        shared_secret: Option<&str>,
    ) -> Result<UserResponse, ClientError> {
        let mut request = self.request(Method::POST, "/api/login").json(claims);
        if let Some(secret) = shared_secret {
            request = request.header("X-Auth-Secret", secret);
        }

        let response = request.send().await?;
        let session = session_from(&response);
        let user: UserResponse = decode(response).await?;

        self.session = Some(session.ok_or(ClientError::MissingSession)?);
        Ok(user)
    }

    pub async fn logout(&mut self) -> Result<(), ClientError> {
        let response = self.request(Method::POST, "/api/logout").send().await?;
        self.session = None;
        decode::<()>(response).await
    }

    pub async fn current_user(&self) -> Result<UserResponse, ClientError> {
        self.get_json("/api/auth/user").await
    }

    // ========================================================================
    // Files
    // ========================================================================

    pub async fn list_files(&self) -> Result<Vec<FileResponse>, ClientError> {
        self.get_json("/api/files").await
    }

    pub async fn list_deleted_files(&self) -> Result<Vec<FileResponse>, ClientError> {
        self.get_json("/api/files/deleted").await
    }

    pub async fn get_file(&self, id: &str) -> Result<FileResponse, ClientError> {
        self.get_json(&format!("/api/files/{id}")).await
    }

    /// Raw bytes of a file.
    pub async fn file_content(&self, id: &str) -> Result<Bytes, ClientError> {
        let response = self
            .request(Method::GET, &format!("/api/files/{id}/content"))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.bytes().await?);
        }
        let body = response.bytes().await?;
        Err(api_error(status, &body))
    }

    pub async fn upload(&self, files: &[UploadFile]) -> Result<Vec<FileResponse>, ClientError> {
        let mut form = Form::new();
        for file in files {
            let mut part = Part::bytes(file.data.to_vec()).file_name(file.file_name.clone());
            if let Some(ref content_type) = file.content_type {
                part = part.mime_str(content_type)?;
            }
            form = form.part("files", part);
        }

        let response = self
            .request(Method::POST, "/api/files/upload")
            .multipart(form)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn update_file(
        &self,
        id: &str,
        update: &UpdateFileRequest,
    ) -> Result<FileResponse, ClientError> {
        self.send_json(Method::PATCH, &format!("/api/files/{id}"), update)
            .await
    }

    pub async fn delete_file(&self, id: &str) -> Result<FileResponse, ClientError> {
        self.send(Method::DELETE, &format!("/api/files/{id}")).await
    }

    pub async fn restore_file(&self, id: &str) -> Result<FileResponse, ClientError> {
        self.send(Method::POST, &format!("/api/files/{id}/restore"))
            .await
    }

    pub async fn permanent_delete_file(&self, id: &str) -> Result<(), ClientError> {
        self.send(Method::DELETE, &format!("/api/files/{id}/permanent"))
            .await
    }

    pub async fn empty_trash(&self) -> Result<EmptyTrashResponse, ClientError> {
        self.send(Method::DELETE, "/api/files/trash/empty").await
    }

    pub async fn share_file(&self, id: &str) -> Result<FileResponse, ClientError> {
        self.send(Method::POST, &format!("/api/files/{id}/share"))
            .await
    }

    // ========================================================================
    // Sharing
    // ========================================================================

    pub async fn shared_file(&self, token: &str) -> Result<SharedFileResponse, ClientError> {
        self.get_json(&format!("/api/share/{token}")).await
    }

    pub async fn add_shared_file(&self, token: &str) -> Result<FileResponse, ClientError> {
        self.send(Method::POST, &format!("/api/share/{token}/add"))
            .await
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub async fn get_settings(&self) -> Result<SettingsResponse, ClientError> {
        self.get_json("/api/settings").await
    }

    pub async fn update_settings(
        &self,
        update: &UpdateSettingsRequest,
    ) -> Result<SettingsResponse, ClientError> {
        self.send_json(Method::PATCH, "/api/settings", update).await
    }

    /// Run a desktop mutation against the matching endpoint.
    pub async fn execute(&self, mutation: &Mutation) -> Result<MutationOutcome, ClientError> {
        let outcome = match mutation {
            Mutation::Upload(files) => MutationOutcome::Files(self.upload(files).await?),
            Mutation::Rename { file_id, name } => MutationOutcome::File(
                self.update_file(file_id, &UpdateFileRequest::rename(name.clone()))
                    .await?,
            ),
            Mutation::UpdateContent { file_id, content } => MutationOutcome::File(
                self.update_file(file_id, &UpdateFileRequest::content(content.clone()))
                    .await?,
            ),
            Mutation::UpdatePosition { file_id, x, y } => MutationOutcome::File(
                self.update_file(file_id, &UpdateFileRequest::position(*x, *y))
                    .await?,
            ),
            Mutation::Delete { file_id } => MutationOutcome::File(self.delete_file(file_id).await?),
            Mutation::Restore { file_id } => {
                MutationOutcome::File(self.restore_file(file_id).await?)
            }
            Mutation::PermanentDelete { file_id } => {
                self.permanent_delete_file(file_id).await?;
                MutationOutcome::Done
            }
            Mutation::EmptyTrash => MutationOutcome::Removed(self.empty_trash().await?.files_deleted),
            Mutation::Share { file_id } => MutationOutcome::File(self.share_file(file_id).await?),
            Mutation::UpdateSettings(update) => {
                MutationOutcome::Settings(self.update_settings(update).await?)
            }
            Mutation::AddShared { token } => {
                MutationOutcome::File(self.add_shared_file(token).await?)
            }
        };
        Ok(outcome)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http.request(method, format!("{}{}", self.base_url, path));
        match self.session {
            Some(ref session) => request.header(COOKIE, format!("{SESSION_COOKIE}={session}")),
            None => request,
        }
    }

    async fn get_json<T>(&self, path: &str) -> Result<T, ClientError>
    where
        T: DeserializeOwned + Serialize,
    {
        self.send(Method::GET, path).await
    }

    async fn send<T>(&self, method: Method, path: &str) -> Result<T, ClientError>
    where
        T: DeserializeOwned + Serialize,
    {
        let response = self.request(method, path).send().await?;
        decode(response).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Serialize,
    {
        let response = self.request(method, path).json(body).send().await?;
        decode(response).await
    }
}

/// Unwrap a JSend success envelope, or turn a fail/error envelope into [`ClientError::Api`].
async fn decode<T>(response: Response) -> Result<T, ClientError>
where
    T: DeserializeOwned + Serialize,
{
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(api_error(status, &body));
    }

    let envelope: JSend<T> = serde_json::from_slice(&body)?;
    Ok(envelope.data)
}

fn api_error(status: StatusCode, body: &[u8]) -> ClientError {
    let message = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/data/message")
                .or_else(|| value.get("message"))
                .and_then(|m| m.as_str())
                .map(|m| m.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });

    ClientError::Api { status, message }
}

fn session_from(response: &Response) -> Option<String> {
    let prefix = format!("{SESSION_COOKIE}=");
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.strip_prefix(prefix.as_str()))
        .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
        .find(|session| !session.is_empty())
}

//! Request and response bodies shared by the HTTP handlers and [`crate::client`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::storage::models::{
    FileKind, FileRecord, FileUpdate, Patch, SettingsRecord, SettingsUpdate, UserRecord,
    DEFAULT_THEME,
};

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResponse {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub extension: String,
    pub kind: FileKind,
    pub mime_type: String,
    pub size: u64,
    pub content: Option<String>,
    pub position_x: Option<i32>,
    pub position_y: Option<i32>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub share_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileResponse {
    /// Display name including the extension, e.g. `notes.txt`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.extension)
    }
}

impl From<&FileRecord> for FileResponse {
    fn from(file: &FileRecord) -> Self {
        FileResponse {
            id: file.id.clone(),
            owner_id: file.owner_id.clone(),
            name: file.name.clone(),
            extension: file.extension.clone(),
            kind: file.kind(),
            mime_type: file.mime_type.clone(),
            size: file.size,
            content: file.content.clone(),
            position_x: file.position_x,
            position_y: file.position_y,
            is_deleted: file.is_deleted,
            deleted_at: file.deleted_at,
            share_token: file.share_token.clone(),
            created_at: file.created_at,
            updated_at: file.updated_at,
        }
    }
}

/// Public view of a shared file, visible without a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedFileResponse {
    pub name: String,
    pub extension: String,
    pub kind: FileKind,
    pub mime_type: String,
    pub size: u64,
}

impl From<&FileRecord> for SharedFileResponse {
    fn from(file: &FileRecord) -> Self {
        SharedFileResponse {
            name: file.name.clone(),
            extension: file.extension.clone(),
            kind: file.kind(),
            mime_type: file.mime_type.clone(),
            size: file.size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub display_name: String,
}

impl From<&UserRecord> for UserResponse {
    fn from(user: &UserRecord) -> Self {
        UserResponse {
            id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            profile_image_url: user.profile_image_url.clone(),
            display_name: user.display_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub theme: String,
    pub desktop_background: Option<String>,
    pub custom_colors: Option<HashMap<String, String>>,
}

impl Default for SettingsResponse {
    fn default() -> Self {
        SettingsResponse {
            theme: DEFAULT_THEME.to_string(),
            desktop_background: None,
            custom_colors: None,
        }
    }
}

impl From<&SettingsRecord> for SettingsResponse {
    fn from(settings: &SettingsRecord) -> Self {
        SettingsResponse {
            theme: settings.theme.clone(),
            desktop_background: settings.desktop_background.clone(),
            custom_colors: settings.custom_colors.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmptyTrashResponse {
    pub files_deleted: u64,
}

// ============================================================================
// Requests
// ============================================================================

/// Identity claims forwarded by the identity provider.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoginRequest {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UpdateFileRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub position_x: Option<Option<i32>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub position_y: Option<Option<i32>>,
}

impl UpdateFileRequest {
    pub fn rename(name: impl Into<String>) -> Self {
        UpdateFileRequest {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        UpdateFileRequest {
            content: Some(Some(content.into())),
            ..Default::default()
        }
    }

    pub fn position(x: i32, y: i32) -> Self {
        UpdateFileRequest {
            position_x: Some(Some(x)),
            position_y: Some(Some(y)),
            ..Default::default()
        }
    }

    pub fn to_update(&self) -> FileUpdate {
        FileUpdate {
            name: self.name.clone(),
            content: Patch::from(self.content.clone()),
            position_x: Patch::from(self.position_x),
            position_y: Patch::from(self.position_y),
            size: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UpdateSettingsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub desktop_background: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_colors: Option<Option<HashMap<String, String>>>,
}

impl UpdateSettingsRequest {
    pub fn to_update(&self) -> SettingsUpdate {
        SettingsUpdate {
            theme: self.theme.clone(),
            desktop_background: Patch::from(self.desktop_background.clone()),
            custom_colors: Patch::from(self.custom_colors.clone()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ContentParams {
    #[serde(default)]
    pub download: bool,
}

/// Distinguishes between a missing field (`None`) and an explicit `null` (`Some(None)`).
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: DeserializeOwned,
    D: Deserializer<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

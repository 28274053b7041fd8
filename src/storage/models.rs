use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Three-state patch value for partial updates that survives serialization round-trips.
/// Unlike `Option<Option<T>>`, each variant has a distinct wire representation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Patch<T> {
    /// Field was not included in the request (no change).
    #[default]
    Absent,
    /// Field was explicitly set to null (clear it).
    Null,
    /// Field was set to a new value.
    Value(T),
}

impl<T> From<Option<Option<T>>> for Patch<T> {
    fn from(v: Option<Option<T>>) -> Self {
        match v {
            None => Patch::Absent,
            Some(None) => Patch::Null,
            Some(Some(v)) => Patch::Value(v),
        }
    }
}

impl<T: Clone> Patch<T> {
    /// Apply the patch to a nullable field in place.
    pub fn apply_to(&self, field: &mut Option<T>) {
        match self {
            Patch::Absent => {}
            Patch::Null => *field = None,
            Patch::Value(v) => *field = Some(v.clone()),
        }
    }
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }
}

/// Classification of a file derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Audio,
    Image,
    Other,
    Text,
    Video,
}

/// Extension table shared by upload handling and viewer dispatch.
const KIND_TABLE: &[(FileKind, &[&str])] = &[
    (FileKind::Text, &["txt", "md", "json", "js", "ts", "html", "css"]),
    (
        FileKind::Image,
        &["jpg", "jpeg", "png", "gif", "webp", "svg", "bmp"],
    ),
    (FileKind::Video, &["mp4", "webm", "mov", "avi", "mkv"]),
    (FileKind::Audio, &["mp3", "wav", "ogg", "flac", "m4a"]),
];

impl FileKind {
    /// Look up the kind for an extension (case-insensitive, no leading dot).
    pub fn from_extension(extension: &str) -> Self {
        let ext = extension.to_ascii_lowercase();
        KIND_TABLE
            .iter()
            .find(|(_, exts)| exts.contains(&ext.as_str()))
            .map(|(kind, _)| *kind)
            .unwrap_or(FileKind::Other)
    }

    /// Text-like files keep their content inline in the record.
    pub fn is_text(self) -> bool {
        matches!(self, FileKind::Text)
    }
}

/// A file record stored in redb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub extension: String,
    pub mime_type: String,
    pub size: u64,
    #[serde(default)]
    pub content: Option<String>,
    /// Key of the stored bytes in the upload directory.
    #[serde(default)]
    pub storage_key: Option<String>,
    #[serde(default)]
    pub position_x: Option<i32>,
    #[serde(default)]
    pub position_y: Option<i32>,
    pub is_deleted: bool,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub share_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn kind(&self) -> FileKind {
        FileKind::from_extension(&self.extension)
    }

    /// Display name including the extension, e.g. `notes.txt`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.extension)
    }
}

/// Partial update of a file's user-editable fields.
#[derive(Debug, Clone, Default)]
pub struct FileUpdate {
    pub name: Option<String>,
    pub content: Patch<String>,
    pub position_x: Patch<i32>,
    pub position_y: Patch<i32>,
    /// New byte size when the stored bytes were rewritten alongside `content`.
    pub size: Option<u64>,
}

impl FileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.content.is_absent()
            && self.position_x.is_absent()
            && self.position_y.is_absent()
    }
}

/// A user as last reported by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Short label for the desktop user icon.
    pub fn display_name(&self) -> String {
        self.first_name
            .clone()
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|e| e.split('@').next())
                    .map(|s| s.to_string())
            })
            .unwrap_or_else(|| "User".to_string())
    }
}

/// A login session keyed by its opaque cookie value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

pub const DEFAULT_THEME: &str = "classic";

/// Per-user desktop appearance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsRecord {
    pub user_id: String,
    pub theme: String,
    #[serde(default)]
    pub desktop_background: Option<String>,
    #[serde(default)]
    pub custom_colors: Option<HashMap<String, String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of a settings record; absent fields keep their value.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub theme: Option<String>,
    pub desktop_background: Patch<String>,
    pub custom_colors: Patch<HashMap<String, String>>,
}

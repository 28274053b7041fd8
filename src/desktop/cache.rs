//! Cached server reads and the mutations that invalidate them.

use crate::api::dto::{FileResponse, SettingsResponse, UpdateSettingsRequest, UserResponse};
use crate::client::UploadFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Files,
    DeletedFiles,
    Settings,
    User,
}

/// A state-changing request against the file or settings store.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Upload(Vec<UploadFile>),
    Rename { file_id: String, name: String },
    UpdateContent { file_id: String, content: String },
    UpdatePosition { file_id: String, x: i32, y: i32 },
    Delete { file_id: String },
    Restore { file_id: String },
    PermanentDelete { file_id: String },
    EmptyTrash,
    Share { file_id: String },
    UpdateSettings(UpdateSettingsRequest),
    AddShared { token: String },
}

impl Mutation {
    /// Cached reads that go stale once this mutation succeeds.
    pub fn invalidates(&self) -> &'static [QueryKey] {
        match self {
            Mutation::Upload(_)
            | Mutation::Rename { .. }
            | Mutation::UpdateContent { .. }
            | Mutation::UpdatePosition { .. }
            | Mutation::Share { .. }
            | Mutation::AddShared { .. } => &[QueryKey::Files],
            Mutation::Delete { .. } | Mutation::Restore { .. } => {
                &[QueryKey::Files, QueryKey::DeletedFiles]
            }
            Mutation::PermanentDelete { .. } | Mutation::EmptyTrash => &[QueryKey::DeletedFiles],
            Mutation::UpdateSettings(_) => &[QueryKey::Settings],
        }
    }
}

/// What the server returned for a successful mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    Files(Vec<FileResponse>),
    File(FileResponse),
    Removed(u64),
    Settings(SettingsResponse),
    Done,
}

/// Last fetched value for one key. Stale values are still readable.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    value: Option<T>,
    stale: bool,
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Self {
            value: None,
            stale: false,
        }
    }
}

impl<T> Cached<T> {
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn set(&mut self, value: T) {
        self.value = Some(value);
        self.stale = false;
    }

    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn needs_fetch(&self) -> bool {
        self.value.is_none() || self.stale
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryCache {
    pub files: Cached<Vec<FileResponse>>,
    pub deleted_files: Cached<Vec<FileResponse>>,
    pub settings: Cached<SettingsResponse>,
    pub user: Cached<UserResponse>,
}

impl QueryCache {
    pub fn invalidate(&mut self, key: QueryKey) {
        match key {
            QueryKey::Files => self.files.invalidate(),
            QueryKey::DeletedFiles => self.deleted_files.invalidate(),
            QueryKey::Settings => self.settings.invalidate(),
            QueryKey::User => self.user.invalidate(),
        }
    }

    pub fn needs_fetch(&self, key: QueryKey) -> bool {
        match key {
            QueryKey::Files => self.files.needs_fetch(),
            QueryKey::DeletedFiles => self.deleted_files.needs_fetch(),
            QueryKey::Settings => self.settings.needs_fetch(),
            QueryKey::User => self.user.needs_fetch(),
        }
    }

    /// Keys that must be refetched before the next read.
    pub fn pending(&self) -> Vec<QueryKey> {
        [
            QueryKey::User,
            QueryKey::Files,
            QueryKey::DeletedFiles,
            QueryKey::Settings,
        ]
        .into_iter()
        .filter(|key| self.needs_fetch(*key))
        .collect()
    }

    /// Look a file up in either listing.
    pub fn find_file(&self, file_id: &str) -> Option<&FileResponse> {
        self.files
            .get()
            .into_iter()
            .chain(self.deleted_files.get())
            .flatten()
            .find(|f| f.id == file_id)
    }

    /// True when the recycle bin is known to be empty.
    pub fn trash_empty(&self) -> bool {
        self.deleted_files.get().map_or(true, |files| files.is_empty())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

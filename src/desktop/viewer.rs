//! Viewer selection by extension and text viewer state.

use serde::{Deserialize, Serialize};

use super::cache::Mutation;
use crate::api::dto::FileResponse;
use crate::storage::models::FileKind;

pub const UNSUPPORTED_MESSAGE: &str = "Cannot preview this file type";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewerKind {
    Text,
    Image,
    Video,
    Audio,
    Unsupported,
}

impl From<FileKind> for ViewerKind {
    fn from(kind: FileKind) -> Self {
        match kind {
            FileKind::Text => ViewerKind::Text,
            FileKind::Image => ViewerKind::Image,
            FileKind::Video => ViewerKind::Video,
            FileKind::Audio => ViewerKind::Audio,
            FileKind::Other => ViewerKind::Unsupported,
        }
    }
}

impl ViewerKind {
    pub fn for_extension(extension: &str) -> Self {
        FileKind::from_extension(extension).into()
    }
}

/// Path media viewers stream from.
pub fn content_url(file_id: &str) -> String {
    format!("/api/files/{file_id}/content")
}

/// The resolved viewer for an open file window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viewer {
    Text(TextViewer),
    Media { kind: ViewerKind, src: String },
    Unsupported { message: &'static str },
}

impl Viewer {
    pub fn resolve(file: &FileResponse) -> Self {
        match ViewerKind::for_extension(&file.extension) {
            ViewerKind::Text => Viewer::Text(TextViewer::new(
                &file.id,
                file.content.clone().unwrap_or_default(),
            )),
            ViewerKind::Unsupported => Viewer::Unsupported {
                message: UNSUPPORTED_MESSAGE,
            },
            kind => Viewer::Media {
                kind,
                src: content_url(&file.id),
            },
        }
    }

    pub fn kind(&self) -> ViewerKind {
        match self {
            Viewer::Text(_) => ViewerKind::Text,
            Viewer::Media { kind, .. } => *kind,
            Viewer::Unsupported { .. } => ViewerKind::Unsupported,
        }
    }

    pub fn as_text(&self) -> Option<&TextViewer> {
        match self {
            Viewer::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextViewer> {
        match self {
            Viewer::Text(text) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    Read,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextViewer {
    file_id: String,
    saved: String,
    draft: String,
    mode: TextMode,
}

impl TextViewer {
    pub fn new(file_id: &str, content: String) -> Self {
        Self {
            file_id: file_id.to_string(),
            draft: content.clone(),
            saved: content,
            mode: TextMode::Read,
        }
    }

    pub fn mode(&self) -> TextMode {
        self.mode
    }

    /// Text on screen in either mode. Leaving edit mode without saving keeps the draft.
    pub fn text(&self) -> &str {
        &self.draft
    }

    /// Content as last saved.
    pub fn saved(&self) -> &str {
        &self.saved
    }

    pub fn is_dirty(&self) -> bool {
        self.draft != self.saved
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            TextMode::Read => TextMode::Edit,
            TextMode::Edit => TextMode::Read,
        };
    }

    /// Back to read mode with the draft as the saved text. Returns the mutation to persist it.
    pub fn save(&mut self) -> Mutation {
        self.saved = self.draft.clone();
        self.mode = TextMode::Read;
        Mutation::UpdateContent {
            file_id: self.file_id.clone(),
            content: self.draft.clone(),
        }
    }
}

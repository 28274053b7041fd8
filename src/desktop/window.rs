//! Open windows, their visual state and focus order.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::geometry::{Point, Viewport, WindowRect, TASKBAR_HEIGHT};
use crate::api::dto::FileResponse;

/// Rect given to a newly opened, non-maximized window.
pub const DEFAULT_WINDOW_RECT: WindowRect = WindowRect::new(100, 100, 600, 400);
/// Minimum managed window width.
pub const MIN_WINDOW_WIDTH: i32 = 320;
/// Minimum managed window height.
pub const MIN_WINDOW_HEIGHT: i32 = 240;
/// z-index below the first window; every open or focus takes the next value.
pub const BASE_Z_INDEX: u32 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("window not found: {0}")]
    NotFound(WindowId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowKind {
    File,
    RecycleBin,
    Settings,
    User,
    Upload,
    Share,
    Rename,
}

/// Window identifier derived from its kind and target, so one target maps to one window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(String);

impl WindowId {
    pub fn file(file_id: &str) -> Self {
        Self(format!("file-{file_id}"))
    }

    pub fn share(file_id: &str) -> Self {
        Self(format!("share-{file_id}"))
    }

    pub fn rename(file_id: &str) -> Self {
        Self(format!("rename-{file_id}"))
    }

    pub fn recycle_bin() -> Self {
        Self("recycle-bin".to_string())
    }

    pub fn settings() -> Self {
        Self("settings".to_string())
    }

    pub fn user() -> Self {
        Self("user".to_string())
    }

    pub fn upload() -> Self {
        Self("upload".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What to open. Built from a target with the constructors below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowDescriptor {
    pub id: WindowId,
    pub kind: WindowKind,
    pub title: String,
    pub file_id: Option<String>,
    pub maximized: bool,
}

impl WindowDescriptor {
    /// File windows open maximized.
    pub fn file(file: &FileResponse) -> Self {
        Self {
            id: WindowId::file(&file.id),
            kind: WindowKind::File,
            title: file.file_name(),
            file_id: Some(file.id.clone()),
            maximized: true,
        }
    }

    pub fn share(file: &FileResponse) -> Self {
        Self {
            id: WindowId::share(&file.id),
            kind: WindowKind::Share,
            title: format!("Share {}", file.file_name()),
            file_id: Some(file.id.clone()),
            maximized: false,
        }
    }

    pub fn rename(file: &FileResponse) -> Self {
        Self {
            id: WindowId::rename(&file.id),
            kind: WindowKind::Rename,
            title: format!("Rename {}", file.file_name()),
            file_id: Some(file.id.clone()),
            maximized: false,
        }
    }

    pub fn recycle_bin() -> Self {
        Self::fixed(WindowId::recycle_bin(), WindowKind::RecycleBin, "Recycle Bin")
    }

    pub fn settings() -> Self {
        Self::fixed(WindowId::settings(), WindowKind::Settings, "Settings")
    }

    pub fn user() -> Self {
        Self::fixed(WindowId::user(), WindowKind::User, "User Profile")
    }

    pub fn upload() -> Self {
        Self::fixed(WindowId::upload(), WindowKind::Upload, "Upload Files")
    }

    fn fixed(id: WindowId, kind: WindowKind, title: &str) -> Self {
        Self {
            id,
            kind,
            title: title.to_string(),
            file_id: None,
            maximized: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRecord {
    pub id: WindowId,
    pub kind: WindowKind,
    pub title: String,
    pub file_id: Option<String>,
    pub minimized: bool,
    pub maximized: bool,
    pub rect: WindowRect,
    /// Last manually-set rect, restored when leaving maximized state.
    pub restore_rect: WindowRect,
    pub z_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub window_id: WindowId,
    pub pointer_start: Point,
    pub rect_start: WindowRect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeSession {
    pub window_id: WindowId,
    pub pointer_start: Point,
    pub rect_start: WindowRect,
}

/// Ordered set of open windows plus a monotonically increasing z counter.
#[derive(Debug, Clone)]
pub struct WindowManager {
    windows: Vec<WindowRecord>,
    active: Option<WindowId>,
    top_z: u32,
    viewport: Viewport,
    dragging: Option<DragSession>,
    resizing: Option<ResizeSession>,
}

impl Default for WindowManager {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl WindowManager {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            windows: Vec::new(),
            active: None,
            top_z: BASE_Z_INDEX,
            viewport,
            dragging: None,
            resizing: None,
        }
    }

    /// Windows in open order, which is also taskbar order.
    pub fn windows(&self) -> &[WindowRecord] {
        &self.windows
    }

    pub fn get(&self, id: &WindowId) -> Option<&WindowRecord> {
        self.windows.iter().find(|w| &w.id == id)
    }

    pub fn is_open(&self, id: &WindowId) -> bool {
        self.get(id).is_some()
    }

    pub fn active(&self) -> Option<&WindowId> {
        self.active.as_ref()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn dragging(&self) -> Option<&DragSession> {
        self.dragging.as_ref()
    }

    pub fn resizing(&self) -> Option<&ResizeSession> {
        self.resizing.as_ref()
    }

    /// Open a window, or bring back the one already open under the same id.
    pub fn open(&mut self, descriptor: WindowDescriptor) -> &WindowRecord {
        let index = match self.position(&descriptor.id) {
            Some(index) => {
                self.windows[index].minimized = false;
                index
            }
            None => {
                let rect = if descriptor.maximized {
                    self.viewport.workspace()
                } else {
                    DEFAULT_WINDOW_RECT
                };
                self.windows.push(WindowRecord {
                    id: descriptor.id,
                    kind: descriptor.kind,
                    title: descriptor.title,
                    file_id: descriptor.file_id,
                    minimized: false,
                    maximized: descriptor.maximized,
                    rect,
                    restore_rect: DEFAULT_WINDOW_RECT,
                    z_index: 0,
                });
                self.windows.len() - 1
            }
        };

        self.raise(index);
        &self.windows[index]
    }

    /// Remove a window. Closing the active window leaves no window active.
    pub fn close(&mut self, id: &WindowId) -> Result<WindowRecord, WindowError> {
        let index = self.require(id)?;
        let removed = self.windows.remove(index);

        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
        if self.dragging.as_ref().is_some_and(|s| &s.window_id == id) {
            self.dragging = None;
        }
        if self.resizing.as_ref().is_some_and(|s| &s.window_id == id) {
            self.resizing = None;
        }
        Ok(removed)
    }

    /// Close every window attached to a file. Returns the ids that were closed.
    pub fn close_for_file(&mut self, file_id: &str) -> Vec<WindowId> {
        let ids: Vec<WindowId> = self
            .windows
            .iter()
            .filter(|w| w.file_id.as_deref() == Some(file_id))
            .map(|w| w.id.clone())
            .collect();

        for id in &ids {
            let _ = self.close(id);
        }
        ids
    }

    pub fn minimize(&mut self, id: &WindowId) -> Result<(), WindowError> {
        let index = self.require(id)?;
        self.windows[index].minimized = true;
        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
        Ok(())
    }

    /// Toggle maximized. Maximizing fills the workspace below the taskbar;
    /// un-maximizing returns to the last manually-set rect.
    pub fn maximize(&mut self, id: &WindowId) -> Result<(), WindowError> {
        let index = self.require(id)?;
        let workspace = self.viewport.workspace();
        let window = &mut self.windows[index];

        if window.maximized {
            window.rect = window.restore_rect;
            window.maximized = false;
        } else {
            window.restore_rect = window.rect;
            window.rect = workspace;
            window.maximized = true;
        }
        Ok(())
    }

    pub fn focus(&mut self, id: &WindowId) -> Result<(), WindowError> {
        let index = self.require(id)?;
        self.raise(index);
        Ok(())
    }

    /// Three-way taskbar toggle: restore a minimized window, minimize the active
    /// one, focus anything else.
    pub fn taskbar_click(&mut self, id: &WindowId) -> Result<(), WindowError> {
        let index = self.require(id)?;

        if self.windows[index].minimized {
            self.windows[index].minimized = false;
            self.raise(index);
            Ok(())
        } else if self.active.as_ref() == Some(id) {
            self.minimize(id)
        } else {
            self.raise(index);
            Ok(())
        }
    }

    /// Home button: minimizes the active window, if any.
    pub fn home(&mut self) {
        if let Some(id) = self.active.clone() {
            let _ = self.minimize(&id);
        }
    }

    /// Title-bar press. Focuses the window; maximized windows do not start a drag.
    /// Returns whether a drag session began.
    pub fn begin_drag(&mut self, id: &WindowId, pointer: Point) -> Result<bool, WindowError> {
        let index = self.require(id)?;
        self.raise(index);

        let window = &self.windows[index];
        if window.maximized {
            return Ok(false);
        }

        self.dragging = Some(DragSession {
            window_id: window.id.clone(),
            pointer_start: pointer,
            rect_start: window.rect,
        });
        Ok(true)
    }

    /// Track the pointer during a drag. Returns the window's new rect.
    pub fn update_drag(&mut self, pointer: Point) -> Option<WindowRect> {
        let session = self.dragging.as_ref()?;
        let delta = pointer.delta(session.pointer_start);

        let mut rect = session.rect_start.offset(delta.x, delta.y);
        rect.y = rect.y.max(TASKBAR_HEIGHT);

        let index = self.position(&session.window_id)?;
        let window = &mut self.windows[index];
        window.rect = rect;
        window.restore_rect = rect;
        Some(rect)
    }

    /// Release the title bar, committing the current position.
    pub fn end_drag(&mut self) -> Option<(WindowId, WindowRect)> {
        let session = self.dragging.take()?;
        self.get(&session.window_id)
            .map(|w| (w.id.clone(), w.rect))
    }

    /// Corner-handle press. Not available while maximized.
    pub fn begin_resize(&mut self, id: &WindowId, pointer: Point) -> Result<bool, WindowError> {
        let index = self.require(id)?;
        self.raise(index);

        let window = &self.windows[index];
        if window.maximized {
            return Ok(false);
        }

        self.resizing = Some(ResizeSession {
            window_id: window.id.clone(),
            pointer_start: pointer,
            rect_start: window.rect,
        });
        Ok(true)
    }

    pub fn update_resize(&mut self, pointer: Point) -> Option<WindowRect> {
        let session = self.resizing.as_ref()?;
        let delta = pointer.delta(session.pointer_start);

        let rect = WindowRect {
            w: session.rect_start.w + delta.x,
            h: session.rect_start.h + delta.y,
            ..session.rect_start
        }
        .clamped_min(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT);

        let index = self.position(&session.window_id)?;
        let window = &mut self.windows[index];
        window.rect = rect;
        window.restore_rect = rect;
        Some(rect)
    }

    pub fn end_resize(&mut self) -> Option<(WindowId, WindowRect)> {
        let session = self.resizing.take()?;
        self.get(&session.window_id)
            .map(|w| (w.id.clone(), w.rect))
    }

    pub fn set_title(&mut self, id: &WindowId, title: String) -> Result<(), WindowError> {
        let index = self.require(id)?;
        self.windows[index].title = title;
        Ok(())
    }

    /// Track a host resize; maximized windows follow the new workspace.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let workspace = viewport.workspace();
        for window in self.windows.iter_mut().filter(|w| w.maximized) {
            window.rect = workspace;
        }
    }

    fn raise(&mut self, index: usize) {
        self.top_z += 1;
        let window = &mut self.windows[index];
        window.z_index = self.top_z;
        self.active = Some(window.id.clone());
    }

    fn position(&self, id: &WindowId) -> Option<usize> {
        self.windows.iter().position(|w| &w.id == id)
    }

    fn require(&self, id: &WindowId) -> Result<usize, WindowError> {
        self.position(id)
            .ok_or_else(|| WindowError::NotFound(id.clone()))
    }
}

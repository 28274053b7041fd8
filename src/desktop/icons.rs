//! Desktop icon placement and grid-snapped icon dragging.

use super::geometry::{Point, Viewport, TASKBAR_HEIGHT};
use crate::api::dto::FileResponse;
use crate::storage::models::FileKind;

/// Icons per row before the fallback grid wraps.
pub const FALLBACK_COLUMNS: usize = 8;
pub const FALLBACK_CELL_WIDTH: i32 = 80;
pub const FALLBACK_CELL_HEIGHT: i32 = 90;
pub const ICON_MARGIN: i32 = 16;
/// Cell size dropped icons snap to.
pub const SNAP_GRID: i32 = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopIcon {
    pub file_id: String,
    pub label: String,
    pub kind: FileKind,
    pub position: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedIcon {
    RecycleBin,
    User,
}

/// Grid position for the `index`-th icon when the file has none stored.
pub fn fallback_position(index: usize) -> Point {
    let col = (index % FALLBACK_COLUMNS) as i32;
    let row = (index / FALLBACK_COLUMNS) as i32;
    Point::new(
        col * FALLBACK_CELL_WIDTH + ICON_MARGIN,
        row * FALLBACK_CELL_HEIGHT + ICON_MARGIN,
    )
}

/// One icon per file not in the recycle bin, in listing order. A missing
/// coordinate takes the fallback grid value for that file's index.
pub fn layout_icons(files: &[FileResponse]) -> Vec<DesktopIcon> {
    files
        .iter()
        .filter(|f| !f.is_deleted)
        .enumerate()
        .map(|(index, file)| {
            let fallback = fallback_position(index);
            DesktopIcon {
                file_id: file.id.clone(),
                label: file.file_name(),
                kind: file.kind,
                position: Point::new(
                    file.position_x.unwrap_or(fallback.x),
                    file.position_y.unwrap_or(fallback.y),
                ),
            }
        })
        .collect()
}

/// Recycle bin and user icons sit at the bottom-left of the viewport.
pub fn fixed_icons(viewport: Viewport) -> [(FixedIcon, Point); 2] {
    let y = viewport.height - 180;
    [
        (FixedIcon::RecycleBin, Point::new(16, y)),
        (FixedIcon::User, Point::new(96, y)),
    ]
}

/// Where an icon at `position` is drawn on screen. Icon positions are measured
/// from below the taskbar; pointers are screen coordinates.
pub fn on_screen(position: Point) -> Point {
    Point::new(position.x, position.y + TASKBAR_HEIGHT)
}

/// Snap a screen-space pointer to the icon grid. `offset` is where inside the
/// on-screen icon the pointer grabbed it.
pub fn snap_to_grid(pointer: Point, offset: Point) -> Point {
    let x = round_to_grid(pointer.x - offset.x);
    let y = round_to_grid(pointer.y - offset.y - TASKBAR_HEIGHT);
    Point::new(x.max(0), y.max(0))
}

/// Nearest multiple of the grid, halves rounding up.
fn round_to_grid(value: i32) -> i32 {
    (value + SNAP_GRID / 2).div_euclid(SNAP_GRID) * SNAP_GRID
}

/// An icon being dragged. The press offset lives in the session so every
/// move computes from the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconDrag {
    file_id: String,
    offset: Point,
    origin: Point,
    current: Point,
}

impl IconDrag {
    pub fn begin(file_id: impl Into<String>, pointer: Point, icon_position: Point) -> Self {
        Self {
            file_id: file_id.into(),
            offset: pointer.delta(on_screen(icon_position)),
            origin: icon_position,
            current: icon_position,
        }
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    /// Where the icon is drawn right now.
    pub fn current(&self) -> Point {
        self.current
    }

    pub fn update(&mut self, pointer: Point) -> Point {
        self.current = snap_to_grid(pointer, self.offset);
        self.current
    }

    /// Release. Yields the position to persist, or `None` if the icon never left its cell.
    pub fn end(self) -> Option<(String, Point)> {
        (self.current != self.origin).then_some((self.file_id, self.current))
    }
}

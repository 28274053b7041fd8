//! Right-click menus: which entries each target gets and where the menu lands.

use super::geometry::{Point, Viewport};

/// Width reserved for a menu when clamping to the viewport.
pub const MENU_WIDTH: i32 = 160;
/// Height of one menu entry.
pub const MENU_ITEM_HEIGHT: i32 = 28;
const MENU_PADDING: i32 = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuTarget {
    File(String),
    Desktop,
    RecycleBin,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    OpenFile(String),
    RenameFile(String),
    ShareFile(String),
    DeleteFile(String),
    Upload,
    OpenSettings,
    OpenRecycleBin,
    EmptyTrash,
    OpenProfile,
    LogOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub command: Option<Command>,
    pub divider: bool,
    pub disabled: bool,
}

impl MenuItem {
    fn action(label: &'static str, command: Command) -> Self {
        Self {
            label,
            command: Some(command),
            divider: false,
            disabled: false,
        }
    }

    fn divider() -> Self {
        Self {
            label: "",
            command: None,
            divider: true,
            disabled: false,
        }
    }

    fn disabled_if(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// Ordered entries for a target. `trash_empty` only affects the recycle bin.
pub fn menu_items(target: &MenuTarget, trash_empty: bool) -> Vec<MenuItem> {
    match target {
        MenuTarget::File(id) => vec![
            MenuItem::action("Open", Command::OpenFile(id.clone())),
            MenuItem::divider(),
            MenuItem::action("Rename", Command::RenameFile(id.clone())),
            MenuItem::action("Share", Command::ShareFile(id.clone())),
            MenuItem::divider(),
            MenuItem::action("Delete", Command::DeleteFile(id.clone())),
        ],
        MenuTarget::Desktop => vec![
            MenuItem::action("Upload File", Command::Upload),
            MenuItem::divider(),
            MenuItem::action("Settings", Command::OpenSettings),
        ],
        MenuTarget::RecycleBin => vec![
            MenuItem::action("Open", Command::OpenRecycleBin),
            MenuItem::divider(),
            MenuItem::action("Empty Recycle Bin", Command::EmptyTrash).disabled_if(trash_empty),
        ],
        MenuTarget::User => vec![
            MenuItem::action("Open Profile", Command::OpenProfile),
            MenuItem::action("Settings", Command::OpenSettings),
            MenuItem::divider(),
            MenuItem::action("Log Out", Command::LogOut),
        ],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMenu {
    pub target: MenuTarget,
    pub position: Point,
    pub items: Vec<MenuItem>,
}

impl ContextMenu {
    pub fn open(target: MenuTarget, pointer: Point, viewport: Viewport, trash_empty: bool) -> Self {
        let items = menu_items(&target, trash_empty);
        let position = place(pointer, items.len(), viewport);
        Self {
            target,
            position,
            items,
        }
    }

    /// The command behind an entry, or `None` for dividers, disabled entries
    /// and out-of-range indexes (the menu stays open for those).
    pub fn activate(&self, index: usize) -> Option<Command> {
        let item = self.items.get(index)?;
        if item.divider || item.disabled {
            return None;
        }
        item.command.clone()
    }
}

/// Keep the menu inside the viewport.
pub fn place(pointer: Point, item_count: usize, viewport: Viewport) -> Point {
    let max_x = viewport.width - MENU_WIDTH;
    let max_y = viewport.height - item_count as i32 * MENU_ITEM_HEIGHT - MENU_PADDING;
    Point::new(pointer.x.min(max_x).max(0), pointer.y.min(max_y).max(0))
}

//! UI-toolkit-independent desktop model: windows, icons, viewers, menus and
//! the query cache, driven by a reducer and executed against the API client.

pub mod cache;
pub mod geometry;
pub mod icons;
pub mod menu;
pub mod session;
pub mod viewer;
pub mod window;

pub use cache::{Mutation, MutationOutcome, QueryCache, QueryKey};
pub use geometry::{Point, Viewport, WindowRect, TASKBAR_HEIGHT};
pub use session::{Desktop, DesktopAction, DesktopEffect, DesktopError, DesktopSession};
pub use window::{WindowDescriptor, WindowError, WindowId, WindowKind, WindowManager};

pub mod context_menu;
pub mod drag;
pub mod overlay;
pub mod tooltip;

pub use context_menu::{ContextMenu, ContextMenuAction};
pub use drag::{DragSession, DragState};
pub use overlay::Overlay;
pub use tooltip::Tooltip;

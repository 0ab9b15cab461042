use tracing::info;

use super::context_menu::ContextMenu;
use super::drag::DragSession;
use super::tooltip::Tooltip;

/// Everything on screen that is not inventory data
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    pub visible: bool,
    pub drag: DragSession,
    pub tooltip: Tooltip,
    pub context_menu: ContextMenu,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if !visible {
            self.clear_transient();
        }
    }

    /// Hide the overlay and drop the drag, tooltip and menu
    pub fn close(&mut self) {
        info!("Closing inventory overlay");
        self.set_visible(false);
    }

    fn clear_transient(&mut self) {
        self.drag.end();
        self.tooltip.close();
        self.context_menu.close();
    }
}

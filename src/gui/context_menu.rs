//! Right-click menu and the actions it offers

use crate::types::{Coords, SlotItem, SlotRef};

/// Entries of the right-click menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextMenuAction {
    Use,
    Give,
    Drop,
}

/// Right-click menu anchored at the pointer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextMenu {
    target: Option<(SlotRef, SlotItem)>,
    coords: Coords,
}

impl ContextMenu {
    pub fn open(&mut self, slot: SlotRef, item: SlotItem, coords: Coords) {
        self.target = Some((slot, item));
        self.coords = coords;
    }

    pub fn close(&mut self) {
        self.target = None;
    }

    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    pub fn coords(&self) -> Coords {
        self.coords
    }

    pub fn slot(&self) -> Option<&SlotRef> {
        self.target.as_ref().map(|(slot, _)| slot)
    }

    pub fn item(&self) -> Option<&SlotItem> {
        self.target.as_ref().map(|(_, item)| item)
    }
}

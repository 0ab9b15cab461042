//! Hover tooltip for a single slot

use crate::types::{SlotItem, SlotRef};

/// Hover details for one slot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tooltip {
    target: Option<(SlotRef, SlotItem)>,
}

impl Tooltip {
    pub fn open(&mut self, slot: SlotRef, item: SlotItem) {
        self.target = Some((slot, item));
    }

    pub fn close(&mut self) {
        self.target = None;
    }

    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    pub fn slot(&self) -> Option<&SlotRef> {
        self.target.as_ref().map(|(slot, _)| slot)
    }

    pub fn item(&self) -> Option<&SlotItem> {
        self.target.as_ref().map(|(_, item)| item)
    }
}

//! Slot mutations over both panes
//!
//! Every function here is synchronous and leaves the state untouched when it
//! returns `false`. Panes always keep exactly `capacity` slots; removing an
//! item empties its slot in place.

use tracing::debug;

use super::helpers::{item_durability, transfer_count};
use crate::types::{Inventory, InventorySide, InventoryType, Slot, SlotItem, SlotRef};

/// Contents of both panes; also the shape of a history snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryState {
    pub left: Inventory,
    pub right: Inventory,
}

impl InventoryState {
    pub fn pane(&self, side: InventorySide) -> &Inventory {
        match side {
            InventorySide::Left => &self.left,
            InventorySide::Right => &self.right,
        }
    }

    pub fn pane_mut(&mut self, side: InventorySide) -> &mut Inventory {
        match side {
            InventorySide::Left => &mut self.left,
            InventorySide::Right => &mut self.right,
        }
    }

    /// Pane addressed by a type tag: `player` is the left pane, anything else the right.
    pub fn pane_for(&self, inv_type: &InventoryType) -> &Inventory {
        self.pane(inv_type.side())
    }

    /// Side whose pane currently carries the given id
    ///
    /// `player` always resolves to the left pane.
    pub fn side_by_id(&self, id: &str) -> Option<InventorySide> {
        if id == self.left.id || id == InventoryType::Player.as_str() {
            Some(InventorySide::Left)
        } else if id == self.right.id {
            Some(InventorySide::Right)
        } else {
            None
        }
    }

    /// Side of the pane currently typed `container`
    pub fn container_side(&self) -> Option<InventorySide> {
        if self.right.is_container() {
            Some(InventorySide::Right)
        } else if self.left.is_container() {
            Some(InventorySide::Left)
        } else {
            None
        }
    }
}

/// Normalize a pane received from the host
///
/// The result has one slot per index in `[1, capacity]`, occupied where the
/// host sent an item for that index, with durability recomputed.
pub fn setup_inventory(data: Inventory, now: i64) -> Inventory {
    let Inventory {
        id,
        inv_type,
        label,
        capacity,
        max_weight,
        weight,
        items,
    } = data;

    let mut slots: Vec<Slot> = (1..=capacity).map(Slot::empty).collect();
    for incoming in items {
        let Some(mut item) = incoming.item else {
            continue;
        };
        if incoming.slot == 0 || incoming.slot > capacity {
            debug!("Dropping {} from out-of-range slot {} of {}", item.name, incoming.slot, id);
            continue;
        }
        item.durability = item_durability(&item.metadata, now);
        slots[(incoming.slot - 1) as usize].item = Some(item);
    }

    Inventory {
        id,
        inv_type,
        label,
        capacity,
        max_weight,
        weight,
        items: slots,
    }
}

/// Move `count` units from an occupied slot into an empty one
///
/// A partial count splits the stack and leaves the remainder behind. Vendor
/// panes (shop, crafting) keep their stock.
pub fn move_slots(state: &mut InventoryState, from: &SlotRef, to: &SlotRef, count: u32, now: i64) -> bool {
    if from == to {
        return false;
    }

    let from_side = from.inventory.side();
    let to_side = to.inventory.side();

    let Some(source) = state.pane(from_side).item(from.slot).cloned() else {
        debug!("Move skipped: {} is empty", from);
        return false;
    };
    if state.pane(to_side).slot(to.slot).is_none() {
        debug!("Move skipped: {} does not exist", to);
        return false;
    }

    let count = transfer_count(count, source.count);
    let piece_weight = source.piece_weight();

    if !from.inventory.is_vendor() {
        take_from_source(state, from, &source, count);
    }

    let moved = SlotItem {
        count,
        weight: piece_weight * count as f64,
        durability: item_durability(&source.metadata, now),
        ..source
    };
    debug!("Moved {} x{} {} -> {}", moved.name, count, from, to);

    if let Some(slot) = state.pane_mut(to_side).slot_mut(to.slot) {
        slot.item = Some(moved);
    }
    true
}

/// Exchange the contents of two occupied slots
pub fn swap_slots(state: &mut InventoryState, from: &SlotRef, to: &SlotRef, now: i64) -> bool {
    if from == to {
        return false;
    }

    let from_side = from.inventory.side();
    let to_side = to.inventory.side();

    let (Some(source), Some(target)) = (
        state.pane(from_side).item(from.slot).cloned(),
        state.pane(to_side).item(to.slot).cloned(),
    ) else {
        debug!("Swap skipped: {} or {} is empty", from, to);
        return false;
    };

    let into_from = SlotItem {
        durability: item_durability(&target.metadata, now),
        ..target
    };
    let into_to = SlotItem {
        durability: item_durability(&source.metadata, now),
        ..source
    };
    debug!("Swapped {} <-> {}", from, to);

    if let Some(slot) = state.pane_mut(from_side).slot_mut(from.slot) {
        slot.item = Some(into_from);
    }
    if let Some(slot) = state.pane_mut(to_side).slot_mut(to.slot) {
        slot.item = Some(into_to);
    }
    true
}

/// Add `count` units from the source stack onto a compatible target stack
///
/// The source slot is emptied when it runs out. Vendor panes keep their stock.
pub fn stack_slots(state: &mut InventoryState, from: &SlotRef, to: &SlotRef, count: u32) -> bool {
    if from == to {
        return false;
    }

    let from_side = from.inventory.side();
    let to_side = to.inventory.side();

    let (Some(source), Some(target_count)) = (
        state.pane(from_side).item(from.slot).cloned(),
        state.pane(to_side).item(to.slot).map(|item| item.count),
    ) else {
        debug!("Stack skipped: {} or {} is empty", from, to);
        return false;
    };

    let count = transfer_count(count, source.count);
    let piece_weight = source.piece_weight();
    let new_count = target_count.saturating_add(count);

    if let Some(target) = state
        .pane_mut(to_side)
        .slot_mut(to.slot)
        .and_then(|slot| slot.item.as_mut())
    {
        target.count = new_count;
        target.weight = piece_weight * new_count as f64;
    }

    if !from.inventory.is_vendor() {
        take_from_source(state, from, &source, count);
    }
    debug!("Stacked {} x{} {} -> {} (now {})", source.name, count, from, to, new_count);
    true
}

/// Record a container weight reported by the host on the pane typed `container`.
pub fn set_container_weight(state: &mut InventoryState, weight: f64) -> bool {
    match state.container_side() {
        Some(side) => {
            state.pane_mut(side).weight = Some(weight);
            true
        }
        None => {
            debug!("No container pane to receive weight {}", weight);
            false
        }
    }
}

fn take_from_source(state: &mut InventoryState, from: &SlotRef, source: &SlotItem, count: u32) {
    let remaining = source.count.saturating_sub(count);
    let piece_weight = source.piece_weight();

    if let Some(slot) = state.pane_mut(from.inventory.side()).slot_mut(from.slot) {
        if remaining > 0 {
            if let Some(item) = slot.item.as_mut() {
                item.count = remaining;
                item.weight = piece_weight * remaining as f64;
            }
        } else {
            slot.item = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn player(capacity: u32, items: Vec<Slot>) -> Inventory {
        let mut inv = Inventory::new("player", InventoryType::Player, capacity, 30000.0);
        inv.items = items;
        setup_inventory(inv, NOW)
    }

    fn stash(capacity: u32, items: Vec<Slot>) -> Inventory {
        let mut inv = Inventory::new("stash:1", InventoryType::Stash, capacity, 50000.0);
        inv.items = items;
        setup_inventory(inv, NOW)
    }

    fn left(slot: u32) -> SlotRef {
        SlotRef::new(InventoryType::Player, slot)
    }

    fn right(slot: u32) -> SlotRef {
        SlotRef::new(InventoryType::Stash, slot)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_setup_pads_to_capacity() {
        let inv = player(5, vec![Slot::occupied(2, SlotItem::new("water", 1, 0.5))]);
        assert_eq!(inv.items.len(), 5);
        let indices: Vec<u32> = inv.items.iter().map(|s| s.slot).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5]);
        assert_eq!(inv.item(2).map(|i| i.name.as_str()), Some("water"));
    }

    #[test]
    fn test_setup_drops_out_of_range_items() {
        let inv = player(2, vec![Slot::occupied(7, SlotItem::new("water", 1, 0.5))]);
        assert_eq!(inv.items.len(), 2);
        assert_eq!(inv.occupied().count(), 0);
    }

    #[test]
    fn test_move_to_empty_splits_stack() {
        let mut state = InventoryState {
            left: player(5, vec![Slot::occupied(1, SlotItem::new("water", 3, 1.5))]),
            right: stash(5, vec![]),
        };

        assert!(move_slots(&mut state, &left(1), &left(4), 1, NOW));

        let source = state.left.item(1).unwrap();
        assert_eq!(source.count, 2);
        assert!(approx(source.weight, 1.0));
        let target = state.left.item(4).unwrap();
        assert_eq!(target.count, 1);
        assert!(approx(target.weight, 0.5));
    }

    #[test]
    fn test_move_full_stack_across_panes() {
        let mut state = InventoryState {
            left: player(5, vec![Slot::occupied(1, SlotItem::new("water", 3, 1.5))]),
            right: stash(5, vec![]),
        };

        assert!(move_slots(&mut state, &left(1), &right(2), 0, NOW));

        assert!(state.left.slot(1).unwrap().is_empty());
        assert_eq!(state.right.item(2).map(|i| i.count), Some(3));
        assert_eq!(state.left.items.len(), 5);
    }

    #[test]
    fn test_move_missing_source_is_noop() {
        let mut state = InventoryState {
            left: player(5, vec![]),
            right: stash(5, vec![]),
        };
        let before = state.clone();
        assert!(!move_slots(&mut state, &left(1), &left(2), 1, NOW));
        assert_eq!(state, before);
    }

    #[test]
    fn test_move_from_shop_keeps_stock() {
        let mut shop = Inventory::new("shop:general", InventoryType::Shop, 3, 0.0);
        shop.items = vec![Slot::occupied(1, SlotItem::new("bread", 10, 2.0))];
        let mut state = InventoryState {
            left: player(3, vec![]),
            right: setup_inventory(shop, NOW),
        };

        let from = SlotRef::new(InventoryType::Shop, 1);
        assert!(move_slots(&mut state, &from, &left(1), 2, NOW));
        assert_eq!(state.right.item(1).map(|i| i.count), Some(10));
        assert_eq!(state.left.item(1).map(|i| i.count), Some(2));
    }

    #[test]
    fn test_swap_is_its_own_inverse() {
        let mut state = InventoryState {
            left: player(5, vec![Slot::occupied(1, SlotItem::new("water", 3, 1.5))]),
            right: stash(5, vec![Slot::occupied(3, SlotItem::new("bread", 1, 0.2))]),
        };
        let original = state.clone();

        assert!(swap_slots(&mut state, &left(1), &right(3), NOW));
        assert_eq!(state.left.item(1).map(|i| i.name.as_str()), Some("bread"));
        assert_eq!(state.right.item(3).map(|i| i.name.as_str()), Some("water"));

        assert!(swap_slots(&mut state, &left(1), &right(3), NOW));
        assert_eq!(state, original);
    }

    #[test]
    fn test_swap_with_empty_slot_is_noop() {
        let mut state = InventoryState {
            left: player(5, vec![Slot::occupied(1, SlotItem::new("water", 3, 1.5))]),
            right: stash(5, vec![]),
        };
        let before = state.clone();
        assert!(!swap_slots(&mut state, &left(1), &left(2), NOW));
        assert_eq!(state, before);
    }

    #[test]
    fn test_stack_removes_drained_source() {
        let mut state = InventoryState {
            left: player(
                5,
                vec![
                    Slot::occupied(1, SlotItem::new("bread", 2, 0.4)),
                    Slot::occupied(2, SlotItem::new("bread", 1, 0.2)),
                ],
            ),
            right: stash(5, vec![]),
        };

        assert!(stack_slots(&mut state, &left(1), &left(2), 2));

        assert!(state.left.slot(1).unwrap().is_empty());
        let target = state.left.item(2).unwrap();
        assert_eq!(target.count, 3);
        assert!(approx(target.weight, 0.6));
    }

    #[test]
    fn test_partial_stack_keeps_source() {
        let mut state = InventoryState {
            left: player(5, vec![Slot::occupied(1, SlotItem::new("bread", 4, 0.8))]),
            right: stash(5, vec![Slot::occupied(1, SlotItem::new("bread", 1, 0.2))]),
        };

        assert!(stack_slots(&mut state, &left(1), &right(1), 3));
        assert_eq!(state.left.item(1).map(|i| i.count), Some(1));
        assert_eq!(state.right.item(1).map(|i| i.count), Some(4));
    }

    #[test]
    fn test_container_weight_targets_container_pane() {
        let mut state = InventoryState {
            left: player(5, vec![Slot::occupied(1, SlotItem::new("water", 3, 1.5))]),
            right: setup_inventory(Inventory::new("bag:1", InventoryType::Container, 5, 5000.0), NOW),
        };
        let left_before = state.left.clone();
        let right_items_before = state.right.items.clone();

        assert!(set_container_weight(&mut state, 12.5));
        assert_eq!(state.right.weight, Some(12.5));
        assert_eq!(state.right.items, right_items_before);
        assert_eq!(state.left, left_before);

        let mut no_container = InventoryState {
            left: player(1, vec![]),
            right: stash(1, vec![]),
        };
        assert!(!set_container_weight(&mut no_container, 3.0));
    }

    #[test]
    fn test_side_by_id() {
        let state = InventoryState {
            left: player(1, vec![]),
            right: stash(1, vec![]),
        };
        assert_eq!(state.side_by_id("player"), Some(InventorySide::Left));
        assert_eq!(state.side_by_id("stash:1"), Some(InventorySide::Right));
        assert_eq!(state.side_by_id("trunk:9"), None);
    }
}

//! Slot helpers shared by the store, the refresh path and the operation handler.

use serde_json::Value;

use crate::types::{Inventory, InventoryType, ItemDefinition, Metadata, Slot, SlotItem};

/// Seconds since the Unix epoch, the clock durability is measured against
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Current durability of an item
///
/// A `durability` above 100 together with a nonzero `degrade` is an expiry
/// timestamp; `degrade` is the item's lifetime in minutes. Any other
/// `durability` is returned as stored. Never below zero.
pub fn item_durability(metadata: &Metadata, now: i64) -> Option<f64> {
    let durability = metadata.get("durability")?.as_f64()?;
    let degrade = metadata
        .get("degrade")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    let current = if durability > 100.0 && degrade != 0.0 {
        (durability - now as f64) / (60.0 * degrade) * 100.0
    } else {
        durability
    };

    Some(current.max(0.0))
}

/// Two stacks merge iff names match and metadata is deeply equal.
pub fn can_stack(source: &SlotItem, target: &SlotItem) -> bool {
    source.name == target.name && source.metadata == target.metadata
}

/// Resolve the number of units to transfer out of a stack of `available`.
///
/// Zero means the whole stack; anything larger is clamped.
pub fn transfer_count(requested: u32, available: u32) -> u32 {
    if requested == 0 || requested > available {
        available
    } else {
        requested
    }
}

/// Pick a destination slot for `item` among `slots`
///
/// Stackable items prefer an existing compatible stack, then the first empty
/// slot. Unknown definitions are treated as stackable.
pub fn find_available_slot<'a>(
    item: &SlotItem,
    definition: Option<&ItemDefinition>,
    slots: &'a [Slot],
) -> Option<&'a Slot> {
    let stackable = definition.map(|d| d.stack).unwrap_or(true);

    if stackable {
        let existing = slots
            .iter()
            .find(|s| s.item.as_ref().is_some_and(|target| can_stack(item, target)));
        if existing.is_some() {
            return existing;
        }
    }

    slots.iter().find(|s| s.is_empty())
}

pub fn total_weight(slots: &[Slot]) -> f64 {
    slots
        .iter()
        .filter_map(|s| s.item.as_ref())
        .map(|item| item.weight)
        .sum()
}

pub fn is_container(inventory: &Inventory) -> bool {
    inventory.inv_type == InventoryType::Container
}

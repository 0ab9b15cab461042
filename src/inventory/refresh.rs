//! Authoritative slot updates pushed by the host

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::helpers::item_durability;
use super::operations::InventoryState;
use crate::error::InventoryError;
use crate::types::{InventorySide, Slot, SlotData, SlotItem};

/// Payload of a `refreshSlots` message
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshPayload {
    /// One update or a list of them
    #[serde(default, deserialize_with = "one_or_many")]
    pub items: Vec<RefreshEntry>,

    /// Per-item deltas for the catalog's global counts
    #[serde(default)]
    pub item_count: HashMap<String, i64>,

    #[serde(default)]
    pub weight_data: Option<WeightData>,

    #[serde(default)]
    pub slots_data: Option<SlotsData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub item: SlotData,

    /// Target inventory id; the player pane when absent
    #[serde(default)]
    pub inventory: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightData {
    pub inventory_id: String,
    pub max_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsData {
    pub inventory_id: String,
    pub slots: u32,
}

/// One entry of a refresh batch, decoded on its own
///
/// A malformed entry keeps the decode error so the rest of the batch still
/// applies.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshEntry {
    Update(ItemUpdate),
    Malformed(String),
}

impl From<ItemUpdate> for RefreshEntry {
    fn from(update: ItemUpdate) -> Self {
        RefreshEntry::Update(update)
    }
}

impl RefreshEntry {
    fn decode(value: Value) -> Self {
        match serde_json::from_value::<ItemUpdate>(value.clone()) {
            Ok(update) => RefreshEntry::Update(update),
            Err(e) => RefreshEntry::Malformed(format!("{} in {}", e, value)),
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<RefreshEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(list)) => list
            .into_iter()
            .filter(|value| !value.is_null())
            .map(RefreshEntry::decode)
            .collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(value) => vec![RefreshEntry::decode(value)],
    })
}

/// What a refresh did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshSummary {
    pub upserted: usize,
    pub removed: usize,
    /// Entries that could not be applied and were ignored
    pub skipped: Vec<InventoryError>,
    pub capacity_changed: Option<InventorySide>,
    pub max_weight_changed: Option<InventorySide>,
}

impl RefreshSummary {
    pub fn is_empty(&self) -> bool {
        self.upserted == 0
            && self.removed == 0
            && self.capacity_changed.is_none()
            && self.max_weight_changed.is_none()
    }
}

/// Apply a refresh batch
///
/// `item_count` is not touched here; it belongs to the item catalog.
pub fn refresh_slots(state: &mut InventoryState, payload: &RefreshPayload, now: i64) -> RefreshSummary {
    let mut summary = RefreshSummary::default();

    for entry in &payload.items {
        let result = match entry {
            RefreshEntry::Update(update) => apply_update(state, update, now),
            RefreshEntry::Malformed(reason) => Err(InventoryError::MalformedRefresh(reason.clone())),
        };
        match result {
            Ok(true) => summary.upserted += 1,
            Ok(false) => summary.removed += 1,
            Err(e) => {
                warn!("Ignoring refresh entry: {}", e);
                summary.skipped.push(e);
            }
        }
    }

    if let Some(weight_data) = &payload.weight_data {
        match state.side_by_id(&weight_data.inventory_id) {
            Some(side) => {
                state.pane_mut(side).max_weight = weight_data.max_weight;
                summary.max_weight_changed = Some(side);
            }
            None => {
                let e = InventoryError::MalformedRefresh(format!(
                    "weight update for unknown inventory {}",
                    weight_data.inventory_id
                ));
                warn!("Ignoring refresh entry: {}", e);
                summary.skipped.push(e);
            }
        }
    }

    if let Some(slots_data) = &payload.slots_data {
        match state.side_by_id(&slots_data.inventory_id) {
            Some(side) => {
                resize_pane(state, side, slots_data.slots);
                summary.capacity_changed = Some(side);
            }
            None => {
                let e = InventoryError::MalformedRefresh(format!(
                    "slot count update for unknown inventory {}",
                    slots_data.inventory_id
                ));
                warn!("Ignoring refresh entry: {}", e);
                summary.skipped.push(e);
            }
        }
    }

    summary
}

/// Returns `Ok(true)` for an upsert, `Ok(false)` for a removal.
fn apply_update(state: &mut InventoryState, update: &ItemUpdate, now: i64) -> Result<bool, InventoryError> {
    let side = match update.inventory.as_deref() {
        None => InventorySide::Left,
        Some(id) => state.side_by_id(id).ok_or_else(|| {
            InventoryError::MalformedRefresh(format!("unknown inventory {}", id))
        })?,
    };

    let data = &update.item;
    let pane = state.pane_mut(side);
    let pane_id = pane.id.clone();
    let slot = pane.slot_mut(data.slot).ok_or_else(|| {
        InventoryError::MalformedRefresh(format!("{} has no slot {}", pane_id, data.slot))
    })?;

    let count = data.count.unwrap_or(0);
    if count <= 0 {
        debug!("Refresh cleared {} slot {}", pane_id, data.slot);
        slot.item = None;
        return Ok(false);
    }
    let count = count.min(u32::MAX as i64) as u32;

    let merged = match slot.item.take() {
        Some(existing) => SlotItem {
            name: data.name.clone().unwrap_or(existing.name),
            count,
            weight: data.weight.unwrap_or(existing.weight),
            metadata: data.metadata.clone().unwrap_or(existing.metadata),
            durability: existing.durability,
        },
        None => {
            let Some(name) = data.name.clone() else {
                return Err(InventoryError::MalformedRefresh(format!(
                    "{} slot {} update has no item name",
                    pane_id, data.slot
                )));
            };
            SlotItem {
                name,
                count,
                weight: data.weight.unwrap_or(0.0),
                metadata: data.metadata.clone().unwrap_or_default(),
                durability: None,
            }
        }
    };

    let durability = item_durability(&merged.metadata, now);
    debug!("Refresh set {} slot {} to {} x{}", pane_id, data.slot, merged.name, count);
    slot.item = Some(SlotItem { durability, ..merged });
    Ok(true)
}

/// Truncate or pad a pane to a new slot capacity
fn resize_pane(state: &mut InventoryState, side: InventorySide, capacity: u32) {
    let pane = state.pane_mut(side);
    debug!("Resizing {} from {} to {} slots", pane.id, pane.capacity, capacity);

    pane.capacity = capacity;
    pane.items.retain(|s| s.slot >= 1 && s.slot <= capacity);
    for index in 1..=capacity {
        if pane.position(index).is_none() {
            pane.items.push(Slot::empty(index));
        }
    }
    pane.items.sort_by_key(|s| s.slot);
}

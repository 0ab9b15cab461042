use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Free-form item metadata as sent by the host
pub type Metadata = Map<String, Value>;

/// Inventory type tag attached to every pane
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InventoryType {
    Player,
    Shop,
    Container,
    Crafting,
    Drop,
    Stash,
    Trunk,
    Glovebox,
    /// Any tag the host sends that has no dedicated handling
    Unknown(String),
}

impl InventoryType {
    /// Parse an inventory type from the host's tag
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "player" => InventoryType::Player,
            "shop" => InventoryType::Shop,
            "container" => InventoryType::Container,
            "crafting" => InventoryType::Crafting,
            "drop" => InventoryType::Drop,
            "stash" => InventoryType::Stash,
            "trunk" => InventoryType::Trunk,
            "glovebox" => InventoryType::Glovebox,
            other => InventoryType::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            InventoryType::Player => "player",
            InventoryType::Shop => "shop",
            InventoryType::Container => "container",
            InventoryType::Crafting => "crafting",
            InventoryType::Drop => "drop",
            InventoryType::Stash => "stash",
            InventoryType::Trunk => "trunk",
            InventoryType::Glovebox => "glovebox",
            InventoryType::Unknown(tag) => tag,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self, InventoryType::Player)
    }

    /// Shops and crafting benches hand items out without giving up their own stock.
    pub fn is_vendor(&self) -> bool {
        matches!(self, InventoryType::Shop | InventoryType::Crafting)
    }

    /// Which pane this type is displayed in
    pub fn side(&self) -> InventorySide {
        if self.is_player() {
            InventorySide::Left
        } else {
            InventorySide::Right
        }
    }
}

impl Default for InventoryType {
    fn default() -> Self {
        InventoryType::Unknown(String::new())
    }
}

impl From<String> for InventoryType {
    fn from(tag: String) -> Self {
        InventoryType::from_tag(&tag)
    }
}

impl From<InventoryType> for String {
    fn from(inv_type: InventoryType) -> Self {
        inv_type.as_str().to_string()
    }
}

impl fmt::Display for InventoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two visible panes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InventorySide {
    /// Player inventory
    Left,
    /// Shop, container, crafting bench, drop...
    Right,
}

impl InventorySide {
    pub fn opposite(&self) -> Self {
        match self {
            InventorySide::Left => InventorySide::Right,
            InventorySide::Right => InventorySide::Left,
        }
    }
}

/// The contents of an occupied slot
#[derive(Debug, Clone, PartialEq)]
pub struct SlotItem {
    pub name: String,
    pub count: u32,
    /// Weight of the whole stack
    pub weight: f64,
    pub metadata: Metadata,
    pub durability: Option<f64>,
}

impl SlotItem {
    pub fn new(name: impl Into<String>, count: u32, weight: f64) -> Self {
        Self {
            name: name.into(),
            count,
            weight,
            metadata: Metadata::new(),
            durability: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Weight of a single unit of this stack
    pub fn piece_weight(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.weight / self.count as f64
        }
    }
}

/// A 1-based slot position, empty or holding one stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SlotData", into = "SlotData")]
pub struct Slot {
    pub slot: u32,
    pub item: Option<SlotItem>,
}

impl Slot {
    pub fn empty(slot: u32) -> Self {
        Self { slot, item: None }
    }

    pub fn occupied(slot: u32, item: SlotItem) -> Self {
        Self {
            slot,
            item: Some(item),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.item.is_none()
    }
}

/// Slot as it travels over the host bridge
///
/// Empty slots carry only `slot`. Refresh updates may carry any subset of
/// the remaining fields, and a count of zero or less.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotData {
    pub slot: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durability: Option<f64>,
}

impl From<SlotData> for Slot {
    fn from(data: SlotData) -> Self {
        let count = data
            .count
            .unwrap_or(1)
            .clamp(0, u32::MAX as i64) as u32;
        let item = match data.name {
            Some(name) if count > 0 => Some(SlotItem {
                name,
                count,
                weight: data.weight.unwrap_or(0.0),
                metadata: data.metadata.unwrap_or_default(),
                durability: data.durability,
            }),
            _ => None,
        };
        Slot {
            slot: data.slot,
            item,
        }
    }
}

impl From<Slot> for SlotData {
    fn from(slot: Slot) -> Self {
        match slot.item {
            Some(item) => SlotData {
                slot: slot.slot,
                name: Some(item.name),
                count: Some(item.count as i64),
                weight: Some(item.weight),
                metadata: if item.metadata.is_empty() {
                    None
                } else {
                    Some(item.metadata)
                },
                durability: item.durability,
            },
            None => SlotData {
                slot: slot.slot,
                ..SlotData::default()
            },
        }
    }
}

/// One inventory pane
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    #[serde(default)]
    pub id: String,

    #[serde(rename = "type", default)]
    pub inv_type: InventoryType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Declared slot capacity
    #[serde(rename = "slots", default)]
    pub capacity: u32,

    #[serde(default)]
    pub max_weight: f64,

    /// Current weight as last reported by the host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,

    #[serde(default, deserialize_with = "deserialize_slots")]
    pub items: Vec<Slot>,
}

impl Inventory {
    pub fn new(id: impl Into<String>, inv_type: InventoryType, capacity: u32, max_weight: f64) -> Self {
        Self {
            id: id.into(),
            inv_type,
            label: None,
            capacity,
            max_weight,
            weight: None,
            items: Vec::new(),
        }
    }

    /// Position of a slot index within `items`
    pub fn position(&self, slot: u32) -> Option<usize> {
        self.items.iter().position(|s| s.slot == slot)
    }

    pub fn slot(&self, slot: u32) -> Option<&Slot> {
        self.items.iter().find(|s| s.slot == slot)
    }

    pub fn slot_mut(&mut self, slot: u32) -> Option<&mut Slot> {
        self.items.iter_mut().find(|s| s.slot == slot)
    }

    /// Item stored at a slot, if the slot exists and is occupied
    pub fn item(&self, slot: u32) -> Option<&SlotItem> {
        self.slot(slot).and_then(|s| s.item.as_ref())
    }

    pub fn occupied(&self) -> impl Iterator<Item = (u32, &SlotItem)> {
        self.items
            .iter()
            .filter_map(|s| s.item.as_ref().map(|item| (s.slot, item)))
    }

    pub fn total_weight(&self) -> f64 {
        crate::inventory::helpers::total_weight(&self.items)
    }

    /// Advisory only; the host enforces weight limits.
    pub fn is_overweight(&self) -> bool {
        self.max_weight > 0.0 && self.total_weight() > self.max_weight
    }

    pub fn is_container(&self) -> bool {
        crate::inventory::helpers::is_container(self)
    }
}

/// Items may arrive as an array (possibly with nulls) or as an object keyed by slot.
fn deserialize_slots<'de, D>(deserializer: D) -> Result<Vec<Slot>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SlotsRepr {
        List(Vec<Option<SlotData>>),
        Keyed(BTreeMap<String, SlotData>),
    }

    let repr = Option::<SlotsRepr>::deserialize(deserializer)?;
    let slots = match repr {
        Some(SlotsRepr::List(list)) => list.into_iter().flatten().map(Slot::from).collect(),
        Some(SlotsRepr::Keyed(map)) => map.into_values().map(Slot::from).collect(),
        None => Vec::new(),
    };
    Ok(slots)
}

/// Static catalog entry for an item name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub name: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub weight: f64,

    /// Whether several units share one slot
    #[serde(default = "default_true")]
    pub stack: bool,

    #[serde(default)]
    pub usable: bool,

    #[serde(default)]
    pub close: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Total units the player holds across inventories
    #[serde(default)]
    pub count: i64,
}

fn default_true() -> bool {
    true
}

impl ItemDefinition {
    /// Minimal definition used when the host has nothing better
    pub fn placeholder(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_string(),
            weight: 0.0,
            stack: true,
            usable: false,
            close: false,
            description: None,
            image: None,
            count: 0,
        }
    }
}

/// Address of a slot: pane type tag plus 1-based index
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotRef {
    pub inventory: InventoryType,
    pub slot: u32,
}

impl SlotRef {
    pub fn new(inventory: InventoryType, slot: u32) -> Self {
        Self { inventory, slot }
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.inventory, self.slot)
    }
}

/// Pointer position in overlay coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coords {
    pub x: f64,
    pub y: f64,
}

/// The item picked up at pointer-down
#[derive(Debug, Clone, PartialEq)]
pub struct DragSource {
    pub slot: u32,
    pub name: String,
    pub inventory: InventoryType,
    pub image: Option<String>,
}

impl DragSource {
    pub fn slot_ref(&self) -> SlotRef {
        SlotRef::new(self.inventory.clone(), self.slot)
    }
}

/// The slot under the pointer at pointer-up
#[derive(Debug, Clone, PartialEq)]
pub struct DropTarget {
    pub slot: u32,
    pub inventory: InventoryType,
}

impl DropTarget {
    pub fn slot_ref(&self) -> SlotRef {
        SlotRef::new(self.inventory.clone(), self.slot)
    }
}

/// How a drop onto a slot is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    MoveToEmpty,
    Stack,
    Swap,
}

/// Extra metadata key the host wants shown in tooltips
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub metadata: String,
    pub value: String,
}

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::inventory::RefreshPayload;
use crate::types::{Inventory, ItemDefinition, MetadataEntry};

/// Envelope of every message the host pushes to the overlay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NuiMessage {
    pub action: String,
    #[serde(default)]
    pub data: Value,
}

impl NuiMessage {
    pub fn new(action: impl Into<String>, data: Value) -> Self {
        Self {
            action: action.into(),
            data,
        }
    }
}

/// Parse message data, unwrapping one level of JSON-in-a-string encoding
pub fn parse_message_data<T: DeserializeOwned>(data: &Value) -> Result<T, serde_json::Error> {
    if let Some(string_data) = data.as_str() {
        if let Ok(decoded) = serde_json::from_str::<Value>(string_data) {
            return serde_json::from_value(decoded);
        }
    }
    serde_json::from_value(data.clone())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPayload {
    #[serde(default)]
    pub items: HashMap<String, ItemDefinition>,
    #[serde(default)]
    pub left_inventory: Option<Inventory>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupPayload {
    #[serde(default)]
    pub left_inventory: Option<Inventory>,
    #[serde(default)]
    pub right_inventory: Option<Inventory>,
}

/// Extra tooltip keys, as a list of entries or a `{ key: label }` map
fn metadata_entries<'de, D>(deserializer: D) -> Result<Vec<MetadataEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entries {
        List(Vec<MetadataEntry>),
        Map(HashMap<String, String>),
    }

    Ok(match Entries::deserialize(deserializer)? {
        Entries::List(list) => list,
        Entries::Map(map) => {
            let mut entries: Vec<MetadataEntry> = map
                .into_iter()
                .map(|(metadata, value)| MetadataEntry { metadata, value })
                .collect();
            entries.sort_by(|a, b| a.metadata.cmp(&b.metadata));
            entries
        }
    })
}

struct MetadataList(Vec<MetadataEntry>);

impl<'de> Deserialize<'de> for MetadataList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        metadata_entries(deserializer).map(MetadataList)
    }
}

/// Decoded host message
#[derive(Debug, Clone, PartialEq)]
pub enum NuiEvent {
    Init(InitPayload),
    SetupInventory(SetupPayload),
    RefreshSlots(RefreshPayload),
    DisplayMetadata(Vec<MetadataEntry>),
    SetInventoryVisible(bool),
    CloseInventory,
    SetItemAmount(u32),
}

impl NuiEvent {
    /// Decode an envelope; `Ok(None)` for actions this overlay does not handle
    pub fn from_message(msg: &NuiMessage) -> Result<Option<Self>> {
        debug!("Received message action: {}", msg.action);

        let event = match msg.action.as_str() {
            "init" => NuiEvent::Init(
                parse_message_data(&msg.data).context("Failed to parse init data")?,
            ),
            "setupInventory" => NuiEvent::SetupInventory(
                parse_message_data(&msg.data).context("Failed to parse setupInventory data")?,
            ),
            "refreshSlots" => NuiEvent::RefreshSlots(
                parse_message_data(&msg.data).context("Failed to parse refreshSlots data")?,
            ),
            "displayMetadata" => {
                let MetadataList(entries) = parse_message_data(&msg.data)
                    .context("Failed to parse displayMetadata data")?;
                NuiEvent::DisplayMetadata(entries)
            }
            "setInventoryVisible" => NuiEvent::SetInventoryVisible(
                // A bare `setInventoryVisible` shows the overlay
                if msg.data.is_null() {
                    true
                } else {
                    parse_message_data(&msg.data)
                        .context("Failed to parse setInventoryVisible data")?
                },
            ),
            "closeInventory" => NuiEvent::CloseInventory,
            "setItemAmount" => {
                let amount: i64 = parse_message_data(&msg.data)
                    .context("Failed to parse setItemAmount data")?;
                NuiEvent::SetItemAmount(amount.clamp(0, u32::MAX as i64) as u32)
            }
            _ => {
                warn!("Unknown NUI action: {}", msg.action);
                debug!("Message data: {}", msg.data);
                return Ok(None);
            }
        };

        Ok(Some(event))
    }

    /// Decode a raw JSON envelope
    pub fn parse(text: &str) -> Result<Option<Self>> {
        let msg: NuiMessage =
            serde_json::from_str(text).context("Failed to parse NUI message")?;
        Self::from_message(&msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InventoryType;
    use serde_json::json;

    #[test]
    fn test_parse_double_encoded_data() {
        let data = json!("{\"rightInventory\":{\"id\":\"stash:1\",\"type\":\"stash\",\"slots\":10,\"maxWeight\":1000}}");
        let payload: SetupPayload = parse_message_data(&data).unwrap();
        let right = payload.right_inventory.unwrap();
        assert_eq!(right.inv_type, InventoryType::Stash);
        assert_eq!(right.capacity, 10);
        assert!(payload.left_inventory.is_none());
    }

    #[test]
    fn test_setup_inventory_event() {
        let text = r#"{"action":"setupInventory","data":{"leftInventory":{"id":"player","type":"player","slots":5,"maxWeight":30000,"items":[{"slot":1,"name":"water","count":2,"weight":1}]}}}"#;
        match NuiEvent::parse(text).unwrap() {
            Some(NuiEvent::SetupInventory(payload)) => {
                let left = payload.left_inventory.unwrap();
                assert_eq!(left.id, "player");
                assert_eq!(left.item(1).map(|i| i.count), Some(2));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_display_metadata_forms() {
        let list = NuiMessage::new(
            "displayMetadata",
            json!([{ "metadata": "serial", "value": "Serial Number" }]),
        );
        let map = NuiMessage::new("displayMetadata", json!({ "serial": "Serial Number" }));

        let expected = NuiEvent::DisplayMetadata(vec![MetadataEntry {
            metadata: "serial".to_string(),
            value: "Serial Number".to_string(),
        }]);
        assert_eq!(NuiEvent::from_message(&list).unwrap(), Some(expected.clone()));
        assert_eq!(NuiEvent::from_message(&map).unwrap(), Some(expected));
    }

    #[test]
    fn test_simple_events() {
        assert_eq!(
            NuiEvent::parse(r#"{"action":"closeInventory"}"#).unwrap(),
            Some(NuiEvent::CloseInventory)
        );
        assert_eq!(
            NuiEvent::parse(r#"{"action":"setInventoryVisible","data":false}"#).unwrap(),
            Some(NuiEvent::SetInventoryVisible(false))
        );
        assert_eq!(
            NuiEvent::parse(r#"{"action":"setItemAmount","data":"5"}"#).unwrap(),
            Some(NuiEvent::SetItemAmount(5))
        );
        assert_eq!(
            NuiEvent::parse(r#"{"action":"setItemAmount","data":-2}"#).unwrap(),
            Some(NuiEvent::SetItemAmount(0))
        );
    }

    #[test]
    fn test_unknown_action_is_skipped() {
        assert_eq!(NuiEvent::parse(r#"{"action":"openClothing","data":{}}"#).unwrap(), None);
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        assert!(NuiEvent::parse(r#"{"action":"setItemAmount","data":"lots"}"#).is_err());
        assert!(NuiEvent::parse("not json").is_err());
    }
}

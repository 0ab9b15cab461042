//! Outbound calls to the embedding host
//!
//! Every user action is one request/response round trip. The transport is
//! behind [`HostBridge`]; [`HostClient`] wraps it with typed requests and
//! response decoding.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::types::{InventoryType, ItemDefinition};

/// Named host callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostAction {
    SwapItems,
    BuyItem,
    CraftItem,
    DropItem,
    UseItem,
    GiveItem,
    GetItemData,
}

impl HostAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostAction::SwapItems => "swapItems",
            HostAction::BuyItem => "buyItem",
            HostAction::CraftItem => "craftItem",
            HostAction::DropItem => "dropItem",
            HostAction::UseItem => "useItem",
            HostAction::GiveItem => "giveItem",
            HostAction::GetItemData => "getItemData",
        }
    }
}

impl fmt::Display for HostAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport to the host process
///
/// Implementations return the host's raw JSON answer, or an error when the
/// call itself failed.
#[async_trait]
pub trait HostBridge: Send + Sync {
    async fn call(&self, action: HostAction, payload: Value) -> Result<Value>;
}

/// Parameters of a slot-to-slot transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub from_slot: u32,
    pub from_type: InventoryType,
    pub to_slot: u32,
    pub to_type: InventoryType,
    pub count: u32,
}

/// Host verdict on a `swapItems` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwapResponse {
    Accepted,
    Rejected,
    /// Accepted; the number is the container's new weight
    ContainerWeight(f64),
}

impl SwapResponse {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Bool(false) => SwapResponse::Rejected,
            Value::Number(n) => match n.as_f64() {
                Some(weight) => SwapResponse::ContainerWeight(weight),
                None => SwapResponse::Accepted,
            },
            _ => SwapResponse::Accepted,
        }
    }
}

/// Boolean answer of a fire-and-confirm call
fn accepted(value: &Value) -> bool {
    value.as_bool().unwrap_or(!value.is_null())
}

/// Typed wrapper around a [`HostBridge`]
#[derive(Clone)]
pub struct HostClient {
    bridge: Arc<dyn HostBridge>,
}

impl HostClient {
    pub fn new(bridge: Arc<dyn HostBridge>) -> Self {
        Self { bridge }
    }

    async fn call(&self, action: HostAction, payload: Value) -> Result<Value> {
        debug!("-> {} {}", action, payload);
        let response = self
            .bridge
            .call(action, payload)
            .await
            .with_context(|| format!("{} call failed", action))?;
        debug!("<- {} {}", action, response);
        Ok(response)
    }

    pub async fn swap_items(&self, request: &TransferRequest) -> Result<SwapResponse> {
        let payload = serde_json::to_value(request).context("Failed to encode swapItems payload")?;
        let response = self.call(HostAction::SwapItems, payload).await?;
        Ok(SwapResponse::from_value(&response))
    }

    pub async fn buy_item(&self, request: &TransferRequest) -> Result<bool> {
        let payload = serde_json::to_value(request).context("Failed to encode buyItem payload")?;
        Ok(accepted(&self.call(HostAction::BuyItem, payload).await?))
    }

    pub async fn craft_item(&self, request: &TransferRequest) -> Result<bool> {
        let payload = serde_json::to_value(request).context("Failed to encode craftItem payload")?;
        Ok(accepted(&self.call(HostAction::CraftItem, payload).await?))
    }

    pub async fn use_item(&self, slot: u32) -> Result<bool> {
        Ok(accepted(&self.call(HostAction::UseItem, json!(slot)).await?))
    }

    pub async fn give_item(&self, slot: u32, count: u32) -> Result<bool> {
        let payload = json!({ "slot": slot, "count": count });
        Ok(accepted(&self.call(HostAction::GiveItem, payload).await?))
    }

    pub async fn drop_item(&self, slot: u32, count: u32) -> Result<bool> {
        let payload = json!({ "slot": slot, "count": count });
        Ok(accepted(&self.call(HostAction::DropItem, payload).await?))
    }

    /// Static definition for an item name; `None` when the host knows nothing
    pub async fn get_item_data(&self, name: &str) -> Result<Option<ItemDefinition>> {
        let response = self.call(HostAction::GetItemData, json!(name)).await?;
        if response.is_null() {
            return Ok(None);
        }
        let definition: ItemDefinition =
            serde_json::from_value(response).context("Failed to decode item data")?;
        if definition.name.is_empty() {
            return Ok(None);
        }
        Ok(Some(definition))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedHost;
    use super::*;

    #[test]
    fn test_swap_response_decoding() {
        assert_eq!(SwapResponse::from_value(&json!(false)), SwapResponse::Rejected);
        assert_eq!(SwapResponse::from_value(&json!(true)), SwapResponse::Accepted);
        assert_eq!(
            SwapResponse::from_value(&json!(12.5)),
            SwapResponse::ContainerWeight(12.5)
        );
        assert_eq!(SwapResponse::from_value(&Value::Null), SwapResponse::Accepted);
    }

    #[test]
    fn test_transfer_request_wire_format() {
        let request = TransferRequest {
            from_slot: 1,
            from_type: InventoryType::Player,
            to_slot: 4,
            to_type: InventoryType::Container,
            count: 2,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "fromSlot": 1, "fromType": "player", "toSlot": 4, "toType": "container", "count": 2 })
        );
    }

    #[tokio::test]
    async fn test_get_item_data() {
        let host = Arc::new(ScriptedHost::new());
        host.respond(json!({ "name": "water", "label": "Water", "weight": 500 }))
            .respond(Value::Null);
        let client = HostClient::new(host.clone());

        let water = client.get_item_data("water").await.unwrap().unwrap();
        assert_eq!(water.label, "Water");
        assert!(water.stack);
        assert!(client.get_item_data("nothing").await.unwrap().is_none());

        let calls = host.calls();
        assert_eq!(calls[0], (HostAction::GetItemData, json!("water")));
    }

    #[tokio::test]
    async fn test_transport_error_is_reported() {
        let host = Arc::new(ScriptedHost::new());
        host.fail("connection reset");
        let client = HostClient::new(host);
        assert!(client.use_item(3).await.is_err());
    }
}

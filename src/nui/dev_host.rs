//! In-process host for running the overlay without a game client
//!
//! Answers every callback locally, the way a browser preview would.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::host::{HostAction, HostBridge};
use crate::config::DevHostConfig;

#[derive(Debug, Clone)]
pub struct DevHost {
    accept_moves: bool,
    container_weight: Option<f64>,
}

impl DevHost {
    pub fn new(config: &DevHostConfig) -> Self {
        Self {
            accept_moves: config.accept_moves,
            container_weight: config.container_weight,
        }
    }
}

impl Default for DevHost {
    fn default() -> Self {
        Self::new(&DevHostConfig::default())
    }
}

#[async_trait]
impl HostBridge for DevHost {
    async fn call(&self, action: HostAction, payload: Value) -> Result<Value> {
        debug!("Dev host handling {} {}", action, payload);

        Ok(match action {
            HostAction::SwapItems if !self.accept_moves => json!(false),
            HostAction::SwapItems => match self.container_weight {
                Some(weight) => json!(weight),
                None => json!(true),
            },
            HostAction::GetItemData => match payload.as_str() {
                Some(name) => json!({ "name": name, "label": name, "weight": 0 }),
                None => Value::Null,
            },
            _ => json!(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nui::host::{HostClient, SwapResponse, TransferRequest};
    use crate::types::InventoryType;
    use std::sync::Arc;

    fn request() -> TransferRequest {
        TransferRequest {
            from_slot: 1,
            from_type: InventoryType::Player,
            to_slot: 2,
            to_type: InventoryType::Container,
            count: 1,
        }
    }

    #[tokio::test]
    async fn test_dev_host_answers() {
        let client = HostClient::new(Arc::new(DevHost::new(&DevHostConfig {
            accept_moves: true,
            container_weight: Some(3.0),
        })));
        assert_eq!(client.swap_items(&request()).await.unwrap(), SwapResponse::ContainerWeight(3.0));
        assert!(client.use_item(1).await.unwrap());

        let definition = client.get_item_data("radio").await.unwrap().unwrap();
        assert_eq!(definition.label, "radio");
    }

    #[tokio::test]
    async fn test_dev_host_can_reject_moves() {
        let client = HostClient::new(Arc::new(DevHost::new(&DevHostConfig {
            accept_moves: false,
            container_weight: None,
        })));
        assert_eq!(client.swap_items(&request()).await.unwrap(), SwapResponse::Rejected);
    }
}

//! Item operation handler
//!
//! Turns "from slot" / "to slot" pairs coming out of the overlay into store
//! mutations and host calls:
//! - classifies a drop as move-to-empty, stack or swap
//! - applies it optimistically and asks the host to confirm it
//! - keeps the change, records a new container weight, or rolls back
//! - routes shop and crafting drops to `buyItem` / `craftItem`
//!
//! One optimistic operation may be in flight at a time; the store's busy flag
//! rejects the rest.

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::catalog::ItemCatalog;
use crate::config::InventorySettings;
use crate::error::InventoryError;
use crate::gui::{ContextMenu, ContextMenuAction};
use crate::inventory::helpers::{can_stack, find_available_slot, transfer_count};
use crate::inventory::InventoryStore;
use crate::nui::{HostClient, SwapResponse, TransferRequest};
use crate::types::{DragSource, DropTarget, InventoryType, MoveKind, SlotItem, SlotRef};

/// Configuration for the operation handler
#[derive(Debug, Clone, Default)]
pub struct OperationConfig {
    /// Keep optimistic changes when the host call itself fails
    pub accept_on_bridge_error: bool,
}

impl From<&InventorySettings> for OperationConfig {
    fn from(settings: &InventorySettings) -> Self {
        Self {
            accept_on_bridge_error: settings.accept_on_bridge_error,
        }
    }
}

/// Outcome of a confirmed move
#[derive(Debug, Clone, PartialEq)]
pub struct MoveReport {
    pub id: Uuid,
    pub kind: MoveKind,
    pub count: u32,
    /// Container weight reported by the host, if any
    pub container_weight: Option<f64>,
}

/// Outcome of a drop
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    Moved(MoveReport),
    Bought,
    Crafted,
}

/// Everything decided before the store is touched
struct MovePlan {
    source: SlotItem,
    count: u32,
    kind: MoveKind,
    /// Target pane's weight limit would be exceeded, if it has one
    overweight: bool,
}

#[derive(Clone)]
pub struct ItemOperationHandler {
    store: InventoryStore,
    catalog: ItemCatalog,
    host: HostClient,
    config: OperationConfig,
}

impl ItemOperationHandler {
    pub fn new(store: InventoryStore, catalog: ItemCatalog, host: HostClient) -> Self {
        Self::with_config(store, catalog, host, OperationConfig::default())
    }

    pub fn with_config(
        store: InventoryStore,
        catalog: ItemCatalog,
        host: HostClient,
        config: OperationConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            host,
            config,
        }
    }

    pub fn store(&self) -> &InventoryStore {
        &self.store
    }

    /// Move, stack or swap `from` onto `to`, confirmed by the host
    ///
    /// `count` defaults to the store's item amount; zero means the whole stack.
    pub async fn move_item(
        &self,
        from: &SlotRef,
        to: &SlotRef,
        count: Option<u32>,
    ) -> Result<MoveReport, InventoryError> {
        if from.inventory.side() == to.inventory.side() && from.slot == to.slot {
            return Err(InventoryError::SameSlot);
        }

        let pending = self.store.begin_pending()?;
        let id = pending.id();
        let requested = count.unwrap_or_else(|| self.store.item_amount());

        let plan = match self.plan_move(from, to, requested) {
            Ok(plan) => plan,
            Err(e) => {
                debug!("[{}] Move {} -> {} aborted: {}", id, from, to, e);
                pending.release();
                return Err(e);
            }
        };

        info!(
            "[{}] {:?} {} x{} {} -> {}",
            id, plan.kind, plan.source.name, plan.count, from, to
        );
        if plan.overweight {
            warn!("[{}] Move would exceed the weight limit of {}, leaving it to the host", id, to.inventory);
        }

        let applied = match plan.kind {
            MoveKind::MoveToEmpty => self.store.move_to_empty(from, to, plan.count),
            MoveKind::Stack => self.store.stack(from, to, plan.count),
            MoveKind::Swap => self.store.swap(from, to),
        };
        if !applied {
            warn!("[{}] Store refused the planned {:?}", id, plan.kind);
            pending.rollback();
            return Err(InventoryError::SourceSlotNotFound {
                inventory: from.inventory.clone(),
                slot: from.slot,
            });
        }

        let request = TransferRequest {
            from_slot: from.slot,
            from_type: from.inventory.clone(),
            to_slot: to.slot,
            to_type: to.inventory.clone(),
            count: plan.count,
        };

        match self.host.swap_items(&request).await {
            Ok(SwapResponse::Rejected) => {
                info!("[{}] Host rejected the move", id);
                pending.rollback();
                Err(InventoryError::RemoteRejected)
            }
            Ok(SwapResponse::ContainerWeight(weight)) => {
                self.store.set_container_weight(weight);
                pending.commit();
                Ok(MoveReport {
                    id,
                    kind: plan.kind,
                    count: plan.count,
                    container_weight: Some(weight),
                })
            }
            Ok(SwapResponse::Accepted) => {
                pending.commit();
                Ok(MoveReport {
                    id,
                    kind: plan.kind,
                    count: plan.count,
                    container_weight: None,
                })
            }
            Err(e) if self.config.accept_on_bridge_error => {
                warn!("[{}] {:#}, keeping the move", id, e);
                pending.commit();
                Ok(MoveReport {
                    id,
                    kind: plan.kind,
                    count: plan.count,
                    container_weight: None,
                })
            }
            Err(e) => {
                error!("[{}] {:#}", id, e);
                pending.rollback();
                Err(InventoryError::RemoteError(format!("{:#}", e)))
            }
        }
    }

    fn plan_move(&self, from: &SlotRef, to: &SlotRef, requested: u32) -> Result<MovePlan, InventoryError> {
        let source = self
            .store
            .with_panes(|panes| panes.pane_for(&from.inventory).item(from.slot).cloned())
            .ok_or_else(|| InventoryError::SourceSlotNotFound {
                inventory: from.inventory.clone(),
                slot: from.slot,
            })?;
        let stackable = self.catalog.get(&source.name).map(|d| d.stack).unwrap_or(true);
        let count = transfer_count(requested, source.count);

        self.store.with_panes(|panes| -> Result<MovePlan, InventoryError> {
            let pane = panes.pane_for(&to.inventory);
            let target = pane.slot(to.slot).ok_or_else(|| InventoryError::TargetSlotNotFound {
                inventory: to.inventory.clone(),
                slot: to.slot,
            })?;

            let kind = match &target.item {
                None => MoveKind::MoveToEmpty,
                Some(existing) if stackable && can_stack(&source, existing) => MoveKind::Stack,
                Some(_) => MoveKind::Swap,
            };

            let incoming = source.piece_weight() * count as f64;
            let overweight = from.inventory.side() != to.inventory.side()
                && pane.max_weight > 0.0
                && pane.total_weight() + incoming > pane.max_weight;

            Ok(MovePlan {
                source,
                count,
                kind,
                overweight,
            })
        })
    }

    /// Resolve a finished drag
    pub async fn handle_drop(
        &self,
        source: &DragSource,
        target: &DropTarget,
    ) -> Result<DropOutcome, InventoryError> {
        match &source.inventory {
            InventoryType::Shop | InventoryType::Crafting => self.vendor_drop(source, target).await,
            _ => self
                .move_item(&source.slot_ref(), &target.slot_ref(), None)
                .await
                .map(DropOutcome::Moved),
        }
    }

    /// Buy or craft: the host decides and refreshes the panes itself
    async fn vendor_drop(&self, source: &DragSource, target: &DropTarget) -> Result<DropOutcome, InventoryError> {
        if target.inventory.is_vendor() {
            return Err(InventoryError::UnsupportedSource(source.inventory.clone()));
        }

        let stocked = self
            .store
            .with_panes(|panes| panes.pane_for(&source.inventory).item(source.slot).is_some());
        if !stocked {
            return Err(InventoryError::SourceSlotNotFound {
                inventory: source.inventory.clone(),
                slot: source.slot,
            });
        }

        // Vendor stock is not consumed, so the amount is not clamped to it
        let count = match self.store.item_amount() {
            0 => 1,
            amount => amount,
        };

        let request = TransferRequest {
            from_slot: source.slot,
            from_type: source.inventory.clone(),
            to_slot: target.slot,
            to_type: target.inventory.clone(),
            count,
        };

        let (result, outcome) = if source.inventory == InventoryType::Shop {
            info!("Buying {} x{} into {}", source.name, request.count, target.slot_ref());
            (self.host.buy_item(&request).await, DropOutcome::Bought)
        } else {
            info!("Crafting {} x{} into {}", source.name, request.count, target.slot_ref());
            (self.host.craft_item(&request).await, DropOutcome::Crafted)
        };

        match result {
            Ok(true) => Ok(outcome),
            Ok(false) => {
                info!("Host refused {:?} of {}", outcome, source.name);
                Err(InventoryError::RemoteRejected)
            }
            Err(e) => {
                error!("{:#}", e);
                Err(InventoryError::RemoteError(format!("{:#}", e)))
            }
        }
    }

    /// Shift-click: send the stack to the best slot of the other pane
    pub async fn quick_move(&self, from: &SlotRef, count: Option<u32>) -> Result<MoveReport, InventoryError> {
        if from.inventory.is_vendor() {
            return Err(InventoryError::UnsupportedSource(from.inventory.clone()));
        }

        let to = self.store.with_panes(|panes| -> Result<SlotRef, InventoryError> {
            let source = panes.pane_for(&from.inventory).item(from.slot).ok_or_else(|| {
                InventoryError::SourceSlotNotFound {
                    inventory: from.inventory.clone(),
                    slot: from.slot,
                }
            })?;
            let target_pane = panes.pane(from.inventory.side().opposite());
            let definition = self.catalog.get(&source.name);

            find_available_slot(source, definition.as_ref(), &target_pane.items)
                .map(|slot| SlotRef::new(target_pane.inv_type.clone(), slot.slot))
                .ok_or_else(|| InventoryError::NoFreeSlot(target_pane.inv_type.clone()))
        })?;

        debug!("Quick move {} -> {}", from, to);
        self.move_item(from, &to, count).await
    }

    pub async fn use_item(&self, slot: u32) -> bool {
        Self::confirmed("useItem", self.host.use_item(slot).await)
    }

    pub async fn give_item(&self, slot: u32, count: u32) -> bool {
        Self::confirmed("giveItem", self.host.give_item(slot, count).await)
    }

    pub async fn drop_item(&self, slot: u32, count: u32) -> bool {
        Self::confirmed("dropItem", self.host.drop_item(slot, count).await)
    }

    fn confirmed(action: &str, result: anyhow::Result<bool>) -> bool {
        match result {
            Ok(accepted) => {
                debug!("{} answered {}", action, accepted);
                accepted
            }
            Err(e) => {
                error!("{:#}", e);
                false
            }
        }
    }

    /// Run a context menu entry against the menu's item and close the menu
    pub async fn perform_menu_action(&self, menu: &mut ContextMenu, action: ContextMenuAction) -> bool {
        let target = menu.slot().cloned().zip(menu.item().map(|item| item.count));
        menu.close();

        let Some((slot, available)) = target else {
            debug!("Context menu action {:?} without a target", action);
            return false;
        };
        let count = transfer_count(self.store.item_amount(), available);

        match action {
            ContextMenuAction::Use => self.use_item(slot.slot).await,
            ContextMenuAction::Give => self.give_item(slot.slot, count).await,
            ContextMenuAction::Drop => self.drop_item(slot.slot, count).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nui::host::testing::ScriptedHost;
    use crate::nui::HostAction;
    use crate::types::{Coords, Inventory, ItemDefinition, Slot};
    use serde_json::json;
    use std::sync::Arc;

    struct Fixture {
        host: Arc<ScriptedHost>,
        handler: ItemOperationHandler,
    }

    fn fixture_with(config: OperationConfig) -> Fixture {
        let store = InventoryStore::new();
        let mut left = Inventory::new("player", InventoryType::Player, 5, 30000.0);
        left.items = vec![
            Slot::occupied(1, SlotItem::new("water", 3, 1.5)),
            Slot::occupied(2, SlotItem::new("bread", 2, 0.4)),
            Slot::occupied(3, SlotItem::new("bread", 1, 0.2)),
        ];
        let mut right = Inventory::new("bag:7", InventoryType::Container, 4, 10000.0);
        right.items = vec![Slot::occupied(1, SlotItem::new("radio", 1, 1.0))];
        store.setup_inventory(Some(left), Some(right));

        let host = Arc::new(ScriptedHost::new());
        let client = HostClient::new(host.clone());
        let handler = ItemOperationHandler::with_config(store, ItemCatalog::offline(), client, config);
        Fixture { host, handler }
    }

    fn fixture() -> Fixture {
        fixture_with(OperationConfig::default())
    }

    fn player(slot: u32) -> SlotRef {
        SlotRef::new(InventoryType::Player, slot)
    }

    fn container(slot: u32) -> SlotRef {
        SlotRef::new(InventoryType::Container, slot)
    }

    #[tokio::test]
    async fn test_stack_bread() {
        let f = fixture();
        let report = f.handler.move_item(&player(2), &player(3), Some(2)).await.unwrap();

        assert_eq!(report.kind, MoveKind::Stack);
        let left = f.handler.store().left();
        assert!(left.slot(2).unwrap().is_empty());
        assert_eq!(left.item(3).map(|i| i.count), Some(3));
        assert!(!f.handler.store().is_busy());
    }

    #[tokio::test]
    async fn test_rejected_move_rolls_back() {
        let f = fixture();
        f.host.respond(json!(false));
        let before = f.handler.store().panes();

        let result = f.handler.move_item(&player(1), &container(2), Some(1)).await;

        assert_eq!(result, Err(InventoryError::RemoteRejected));
        assert_eq!(f.handler.store().panes(), before);
        assert!(!f.handler.store().is_busy());
    }

    #[tokio::test]
    async fn test_numeric_answer_sets_container_weight() {
        let f = fixture();
        f.host.respond(json!(12.5));

        let report = f.handler.move_item(&player(1), &container(2), Some(1)).await.unwrap();

        assert_eq!(report.kind, MoveKind::MoveToEmpty);
        assert_eq!(report.container_weight, Some(12.5));
        let right = f.handler.store().right();
        assert_eq!(right.weight, Some(12.5));
        assert_eq!(right.item(2).map(|i| i.count), Some(1));
        assert_eq!(right.item(1).map(|i| i.name.as_str()), Some("radio"));
        assert_eq!(f.handler.store().left().item(1).map(|i| i.count), Some(2));
    }

    #[tokio::test]
    async fn test_outbound_payload_carries_resolved_count() {
        let f = fixture();
        f.handler.store().set_item_amount(0);
        f.handler.move_item(&player(1), &container(3), None).await.unwrap();

        assert_eq!(
            f.host.calls(),
            vec![(
                HostAction::SwapItems,
                json!({ "fromSlot": 1, "fromType": "player", "toSlot": 3, "toType": "container", "count": 3 })
            )]
        );
    }

    #[tokio::test]
    async fn test_busy_store_blocks_second_operation() {
        let f = fixture();
        f.handler.store().begin_optimistic().unwrap();

        let result = f.handler.move_item(&player(1), &container(2), None).await;

        assert_eq!(result, Err(InventoryError::Busy));
        assert!(f.host.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_source_touches_nothing() {
        let f = fixture();
        let before = f.handler.store().panes();

        let result = f.handler.move_item(&player(5), &container(2), None).await;

        assert!(matches!(result, Err(InventoryError::SourceSlotNotFound { slot: 5, .. })));
        assert_eq!(f.handler.store().panes(), before);
        assert!(!f.handler.store().is_busy());
        assert!(f.host.calls().is_empty());
    }

    #[tokio::test]
    async fn test_same_slot_is_rejected() {
        let f = fixture();
        assert_eq!(
            f.handler.move_item(&player(1), &player(1), None).await,
            Err(InventoryError::SameSlot)
        );
    }

    #[tokio::test]
    async fn test_transport_error_rolls_back_unless_configured() {
        let f = fixture();
        f.host.fail("bridge down");
        let before = f.handler.store().panes();
        let result = f.handler.move_item(&player(1), &container(2), None).await;
        assert!(matches!(result, Err(InventoryError::RemoteError(_))));
        assert_eq!(f.handler.store().panes(), before);

        let f = fixture_with(OperationConfig {
            accept_on_bridge_error: true,
        });
        f.host.fail("bridge down");
        f.handler.move_item(&player(1), &container(2), None).await.unwrap();
        assert_eq!(f.handler.store().right().item(2).map(|i| i.count), Some(3));
    }

    #[tokio::test]
    async fn test_non_stackable_definition_swaps() {
        let f = fixture();
        let mut definition = ItemDefinition::placeholder("bread");
        definition.stack = false;
        f.handler.catalog.set_item("bread", definition);

        let report = f.handler.move_item(&player(2), &player(3), None).await.unwrap();

        assert_eq!(report.kind, MoveKind::Swap);
        let left = f.handler.store().left();
        assert_eq!(left.item(2).map(|i| i.count), Some(1));
        assert_eq!(left.item(3).map(|i| i.count), Some(2));
    }

    #[tokio::test]
    async fn test_shop_drop_buys_without_touching_panes() {
        let f = fixture();
        let mut shop = Inventory::new("shop:general", InventoryType::Shop, 3, 0.0);
        shop.items = vec![Slot::occupied(1, SlotItem::new("sandwich", 50, 10.0))];
        f.handler.store().setup(crate::types::InventorySide::Right, shop);
        let before = f.handler.store().panes();
        f.handler.store().set_item_amount(2);

        let source = DragSource {
            slot: 1,
            name: "sandwich".to_string(),
            inventory: InventoryType::Shop,
            image: None,
        };
        let target = DropTarget {
            slot: 4,
            inventory: InventoryType::Player,
        };
        assert_eq!(f.handler.handle_drop(&source, &target).await, Ok(DropOutcome::Bought));
        assert_eq!(f.handler.store().panes(), before);

        let calls = f.host.calls();
        assert_eq!(calls[0].0, HostAction::BuyItem);
        assert_eq!(calls[0].1["count"], json!(2));
    }

    #[tokio::test]
    async fn test_vendor_drop_without_amount_takes_one() {
        let f = fixture();
        let mut bench = Inventory::new("crafting:bench", InventoryType::Crafting, 2, 0.0);
        bench.items = vec![Slot::occupied(1, SlotItem::new("lockpick", 50, 5.0))];
        f.handler.store().setup(crate::types::InventorySide::Right, bench);
        f.handler.store().set_item_amount(0);

        let source = DragSource {
            slot: 1,
            name: "lockpick".to_string(),
            inventory: InventoryType::Crafting,
            image: None,
        };
        let target = DropTarget {
            slot: 4,
            inventory: InventoryType::Player,
        };
        assert_eq!(f.handler.handle_drop(&source, &target).await, Ok(DropOutcome::Crafted));

        assert_eq!(
            f.host.calls(),
            vec![(
                HostAction::CraftItem,
                json!({ "fromSlot": 1, "fromType": "crafting", "toSlot": 4, "toType": "player", "count": 1 })
            )]
        );
    }

    #[tokio::test]
    async fn test_vendor_drop_amount_is_not_clamped_to_stock() {
        let f = fixture();
        let mut shop = Inventory::new("shop:general", InventoryType::Shop, 1, 0.0);
        shop.items = vec![Slot::occupied(1, SlotItem::new("sandwich", 5, 1.0))];
        f.handler.store().setup(crate::types::InventorySide::Right, shop);
        f.handler.store().set_item_amount(8);

        let source = DragSource {
            slot: 1,
            name: "sandwich".to_string(),
            inventory: InventoryType::Shop,
            image: None,
        };
        let target = DropTarget {
            slot: 4,
            inventory: InventoryType::Player,
        };
        f.handler.handle_drop(&source, &target).await.unwrap();
        assert_eq!(f.host.calls()[0].1["count"], json!(8));
    }

    #[tokio::test]
    async fn test_quick_move_finds_free_slot() {
        let f = fixture();
        let report = f.handler.quick_move(&player(1), None).await.unwrap();

        assert_eq!(report.kind, MoveKind::MoveToEmpty);
        assert_eq!(f.handler.store().right().item(2).map(|i| i.name.as_str()), Some("water"));
    }

    #[tokio::test]
    async fn test_quick_move_full_pane() {
        let f = fixture();
        let mut full = Inventory::new("bag:1", InventoryType::Container, 1, 100.0);
        full.items = vec![Slot::occupied(1, SlotItem::new("radio", 1, 1.0))];
        f.handler.store().setup(crate::types::InventorySide::Right, full);

        assert_eq!(
            f.handler.quick_move(&player(1), None).await,
            Err(InventoryError::NoFreeSlot(InventoryType::Container))
        );
    }

    #[tokio::test]
    async fn test_menu_action_gives_selected_amount() {
        let f = fixture();
        f.handler.store().set_item_amount(2);
        let mut menu = ContextMenu::default();
        menu.open(player(1), SlotItem::new("water", 3, 1.5), Coords::default());

        assert!(f.handler.perform_menu_action(&mut menu, ContextMenuAction::Give).await);
        assert!(!menu.is_open());
        assert_eq!(
            f.host.calls(),
            vec![(HostAction::GiveItem, json!({ "slot": 1, "count": 2 }))]
        );

        // Closed menu has nothing to act on
        assert!(!f.handler.perform_menu_action(&mut menu, ContextMenuAction::Use).await);
    }

    #[tokio::test]
    async fn test_item_action_transport_error_is_false() {
        let f = fixture();
        f.host.fail("bridge down");
        assert!(!f.handler.drop_item(1, 1).await);
    }
}

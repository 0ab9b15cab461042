use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::messages::{NuiEvent, NuiMessage};
use crate::catalog::ItemCatalog;
use crate::gui::Overlay;
use crate::inventory::InventoryStore;
use crate::types::InventorySide;

/// Applies host messages to the store, the catalog and the overlay
#[derive(Clone)]
pub struct NuiDispatcher {
    store: InventoryStore,
    catalog: ItemCatalog,
    overlay: Arc<RwLock<Overlay>>,
    prefetch: bool,
}

impl NuiDispatcher {
    pub fn new(store: InventoryStore, catalog: ItemCatalog, overlay: Arc<RwLock<Overlay>>) -> Self {
        Self {
            store,
            catalog,
            overlay,
            prefetch: true,
        }
    }

    /// Fetch item data for unseen names whenever panes change
    pub fn with_prefetch(mut self, prefetch: bool) -> Self {
        self.prefetch = prefetch;
        self
    }

    pub fn apply(&self, event: NuiEvent) {
        match event {
            NuiEvent::Init(payload) => {
                self.catalog.set_items(payload.items);
                if let Some(left) = payload.left_inventory {
                    self.store.setup(InventorySide::Left, left);
                }
                self.prefetch_unknown();
            }
            NuiEvent::SetupInventory(payload) => {
                self.store
                    .setup_inventory(payload.left_inventory, payload.right_inventory);
                self.overlay.write().set_visible(true);
                self.prefetch_unknown();
            }
            NuiEvent::RefreshSlots(payload) => {
                if !payload.item_count.is_empty() {
                    self.catalog.apply_item_counts(&payload.item_count);
                }
                let summary = self.store.refresh(&payload);
                if summary.upserted > 0 {
                    self.prefetch_unknown();
                }
            }
            NuiEvent::DisplayMetadata(entries) => {
                debug!("Registering {} metadata entries", entries.len());
                self.store.add_additional_metadata(entries);
            }
            NuiEvent::SetInventoryVisible(visible) => {
                info!("Inventory visible: {}", visible);
                self.overlay.write().set_visible(visible);
            }
            NuiEvent::CloseInventory => {
                self.overlay.write().close();
            }
            NuiEvent::SetItemAmount(amount) => {
                self.store.set_item_amount(amount);
            }
        }
    }

    /// Decode and apply one raw message; malformed input is logged and dropped
    pub fn handle_message(&self, msg: &NuiMessage) {
        match NuiEvent::from_message(msg) {
            Ok(Some(event)) => self.apply(event),
            Ok(None) => {}
            Err(e) => error!("Error handling NUI message {}: {:#}", msg.action, e),
        }
    }

    /// Apply messages until every sender is gone
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<NuiMessage>) {
        info!("NUI dispatcher started");
        while let Some(msg) = rx.recv().await {
            self.handle_message(&msg);
        }
        info!("NUI dispatcher stopped");
    }

    fn prefetch_unknown(&self) {
        if !self.prefetch {
            return;
        }

        let names: HashSet<String> = self.store.with_panes(|panes| {
            panes
                .left
                .occupied()
                .chain(panes.right.occupied())
                .map(|(_, item)| item.name.clone())
                .collect()
        });

        for name in names {
            if !self.catalog.contains(&name) {
                self.catalog.get_or_fetch(&name);
            }
        }
    }
}

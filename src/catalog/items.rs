//! Item catalog
//!
//! Memoizes static item definitions by name for the lifetime of the session.
//! Lookups never wait: a miss starts a background fetch and the caller
//! re-renders when the catalog announces the name on its load channel.

use anyhow::Result;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::nui::HostClient;
use crate::types::ItemDefinition;

const LOAD_CHANNEL_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct ItemCatalog {
    items: Arc<RwLock<HashMap<String, ItemDefinition>>>,
    /// Names with a fetch in flight
    pending: Arc<Mutex<HashSet<String>>>,
    host: Option<HostClient>,
    loaded: broadcast::Sender<String>,
}

impl ItemCatalog {
    /// Catalog that fetches misses from the host
    pub fn new(host: HostClient) -> Self {
        Self::build(Some(host))
    }

    /// Catalog fed only through [`set_items`](Self::set_items)
    pub fn offline() -> Self {
        Self::build(None)
    }

    fn build(host: Option<HostClient>) -> Self {
        let (loaded, _) = broadcast::channel(LOAD_CHANNEL_CAPACITY);
        Self {
            items: Arc::new(RwLock::new(HashMap::new())),
            pending: Arc::new(Mutex::new(HashSet::new())),
            host,
            loaded,
        }
    }

    /// Names announced here were just added to the catalog
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.loaded.subscribe()
    }

    pub fn get(&self, name: &str) -> Option<ItemDefinition> {
        self.items.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Cached definition, or `None` after scheduling a fetch
    ///
    /// The fetch only runs inside a tokio runtime and only once per name at a time.
    pub fn get_or_fetch(&self, name: &str) -> Option<ItemDefinition> {
        if let Some(definition) = self.get(name) {
            return Some(definition);
        }
        if self.host.is_none() {
            return None;
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No async runtime, cannot fetch item data for {}", name);
                return None;
            }
        };

        if !self.pending.lock().insert(name.to_string()) {
            return None;
        }

        let catalog = self.clone();
        let name = name.to_string();
        handle.spawn(async move {
            if let Err(e) = catalog.fetch(&name).await {
                warn!("Failed to fetch item data for {}: {:#}", name, e);
            }
            catalog.pending.lock().remove(&name);
        });
        None
    }

    /// Fetch a definition from the host now and cache it
    pub async fn fetch(&self, name: &str) -> Result<Option<ItemDefinition>> {
        let Some(host) = &self.host else {
            return Ok(None);
        };

        match host.get_item_data(name).await? {
            Some(definition) => {
                debug!("Fetched item data for {}", name);
                self.set_item(name, definition.clone());
                Ok(Some(definition))
            }
            None => {
                debug!("Host has no item data for {}", name);
                Ok(None)
            }
        }
    }

    pub fn set_item(&self, name: &str, definition: ItemDefinition) {
        self.items.write().insert(name.to_string(), definition);
        let _ = self.loaded.send(name.to_string());
    }

    /// Bulk load, as sent with the host's `init` message
    pub fn set_items(&self, definitions: HashMap<String, ItemDefinition>) {
        let names: Vec<String> = definitions.keys().cloned().collect();
        self.items.write().extend(definitions);
        info!("Loaded {} item definitions", names.len());
        for name in names {
            let _ = self.loaded.send(name);
        }
    }

    /// Add per-item deltas to the global counts
    pub fn apply_item_counts(&self, counts: &HashMap<String, i64>) {
        let mut items = self.items.write();
        for (name, delta) in counts {
            match items.get_mut(name) {
                Some(definition) => definition.count += delta,
                None => debug!("Item data for {} is undefined, count change ignored", name),
            }
        }
    }
}

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::helpers::current_timestamp;
use super::operations::{self, InventoryState};
use super::refresh::{self, RefreshPayload, RefreshSummary};
use crate::error::InventoryError;
use crate::types::{Inventory, InventorySide, MetadataEntry, SlotRef};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Notification sent to subscribers after the store changed
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    Setup(InventorySide),
    Slots,
    Refreshed,
    ContainerWeight(f64),
    Committed,
    RolledBack,
    ItemAmount(u32),
    AdditionalMetadata,
}

#[derive(Debug, Default)]
struct StoreInner {
    panes: InventoryState,
    item_amount: u32,
    shift_pressed: bool,
    is_busy: bool,
    additional_metadata: Vec<MetadataEntry>,
    history: Option<InventoryState>,
    /// Guard that owns `history`, if it was taken through `begin_pending`
    owner: Option<Uuid>,
}

/// Single source of truth for both visible inventory panes
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct InventoryStore {
    inner: Arc<RwLock<StoreInner>>,
    changes: broadcast::Sender<StoreChange>,
}

impl InventoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(RwLock::new(StoreInner::default())),
            changes,
        }
    }

    /// Receive a notification after every change
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    fn notify(&self, change: StoreChange) {
        // No subscribers is fine
        let _ = self.changes.send(change);
    }

    pub fn left(&self) -> Inventory {
        self.inner.read().panes.left.clone()
    }

    pub fn right(&self) -> Inventory {
        self.inner.read().panes.right.clone()
    }

    /// Copy of both panes
    pub fn panes(&self) -> InventoryState {
        self.inner.read().panes.clone()
    }

    /// Read both panes without copying them
    pub fn with_panes<R>(&self, f: impl FnOnce(&InventoryState) -> R) -> R {
        f(&self.inner.read().panes)
    }

    pub fn item_amount(&self) -> u32 {
        self.inner.read().item_amount
    }

    /// Amount picked in the UI; 0 means the whole stack
    pub fn set_item_amount(&self, amount: u32) {
        self.inner.write().item_amount = amount;
        self.notify(StoreChange::ItemAmount(amount));
    }

    pub fn shift_pressed(&self) -> bool {
        self.inner.read().shift_pressed
    }

    pub fn set_shift_pressed(&self, pressed: bool) {
        self.inner.write().shift_pressed = pressed;
    }

    pub fn is_busy(&self) -> bool {
        self.inner.read().is_busy
    }

    pub fn additional_metadata(&self) -> Vec<MetadataEntry> {
        self.inner.read().additional_metadata.clone()
    }

    /// Register extra metadata keys, skipping values already known
    pub fn add_additional_metadata(&self, entries: Vec<MetadataEntry>) {
        let mut inner = self.inner.write();
        for entry in entries {
            if !inner.additional_metadata.iter().any(|e| e.value == entry.value) {
                inner.additional_metadata.push(entry);
            }
        }
        drop(inner);
        self.notify(StoreChange::AdditionalMetadata);
    }

    /// Replace one pane's identity, capacity and contents
    pub fn setup(&self, side: InventorySide, data: Inventory) {
        let pane = operations::setup_inventory(data, current_timestamp());
        info!(
            "Setting up {:?} pane: {} ({}, {} slots)",
            side, pane.id, pane.inv_type, pane.capacity
        );

        let mut inner = self.inner.write();
        *inner.panes.pane_mut(side) = pane;
        inner.shift_pressed = false;
        inner.is_busy = false;
        inner.history = None;
        inner.owner = None;
        drop(inner);

        self.notify(StoreChange::Setup(side));
    }

    /// Set up whichever panes are present
    pub fn setup_inventory(&self, left: Option<Inventory>, right: Option<Inventory>) {
        if let Some(left) = left {
            self.setup(InventorySide::Left, left);
        }
        if let Some(right) = right {
            self.setup(InventorySide::Right, right);
        }
    }

    /// Relocate `count` units into an empty slot; no-op when the source is empty.
    pub fn move_to_empty(&self, from: &SlotRef, to: &SlotRef, count: u32) -> bool {
        let moved = operations::move_slots(&mut self.inner.write().panes, from, to, count, current_timestamp());
        if moved {
            self.notify(StoreChange::Slots);
        }
        moved
    }

    /// Exchange two occupied slots; no-op when either is empty.
    pub fn swap(&self, from: &SlotRef, to: &SlotRef) -> bool {
        let swapped = operations::swap_slots(&mut self.inner.write().panes, from, to, current_timestamp());
        if swapped {
            self.notify(StoreChange::Slots);
        }
        swapped
    }

    /// Add `count` units onto a compatible occupied slot.
    pub fn stack(&self, from: &SlotRef, to: &SlotRef, count: u32) -> bool {
        let stacked = operations::stack_slots(&mut self.inner.write().panes, from, to, count);
        if stacked {
            self.notify(StoreChange::Slots);
        }
        stacked
    }

    /// Apply a batch of authoritative updates from the host
    pub fn refresh(&self, payload: &RefreshPayload) -> RefreshSummary {
        let summary = refresh::refresh_slots(&mut self.inner.write().panes, payload, current_timestamp());
        debug!(
            "Refresh applied: {} upserted, {} removed, {} skipped",
            summary.upserted,
            summary.removed,
            summary.skipped.len()
        );
        if !summary.is_empty() {
            self.notify(StoreChange::Refreshed);
        }
        summary
    }

    /// Record the weight of the pane currently typed `container`
    pub fn set_container_weight(&self, weight: f64) -> bool {
        let updated = operations::set_container_weight(&mut self.inner.write().panes, weight);
        if updated {
            self.notify(StoreChange::ContainerWeight(weight));
        }
        updated
    }

    /// Snapshot both panes and mark the store busy
    ///
    /// Fails with [`InventoryError::Busy`] while another operation is in flight.
    pub fn begin_optimistic(&self) -> Result<(), InventoryError> {
        let mut inner = self.inner.write();
        if inner.is_busy {
            return Err(InventoryError::Busy);
        }
        inner.history = Some(inner.panes.clone());
        inner.is_busy = true;
        inner.owner = None;
        debug!("Optimistic update started");
        Ok(())
    }

    /// Keep the optimistic changes and drop the snapshot
    pub fn commit(&self) {
        let mut inner = self.inner.write();
        inner.history = None;
        inner.is_busy = false;
        inner.owner = None;
        drop(inner);

        debug!("Optimistic update committed");
        self.notify(StoreChange::Committed);
    }

    /// Restore both panes from the snapshot
    pub fn rollback(&self) {
        let mut inner = self.inner.write();
        let restored = match inner.history.take() {
            Some(history) => {
                inner.panes = history;
                true
            }
            None => false,
        };
        inner.is_busy = false;
        inner.owner = None;
        drop(inner);

        if restored {
            info!("Rolled back optimistic update");
        } else {
            warn!("Rollback requested without a snapshot");
        }
        self.notify(StoreChange::RolledBack);
    }

    /// Like [`begin_optimistic`](Self::begin_optimistic), returning a guard
    /// that rolls back if dropped unresolved
    pub fn begin_pending(&self) -> Result<PendingChange, InventoryError> {
        self.begin_optimistic()?;
        let id = Uuid::new_v4();
        self.inner.write().owner = Some(id);
        Ok(PendingChange {
            store: self.clone(),
            id,
            resolved: false,
        })
    }

    /// Whether the snapshot still belongs to guard `id`
    ///
    /// A `setup` in between discards the snapshot, and a later guard may own
    /// a new one; stale guards must leave both alone.
    fn owns(&self, id: Uuid) -> bool {
        let owned = self.inner.read().owner == Some(id);
        if !owned {
            warn!("Pending change {} no longer owns the snapshot, ignoring", id);
        }
        owned
    }
}

impl Default for InventoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// An in-flight optimistic update
pub struct PendingChange {
    store: InventoryStore,
    id: Uuid,
    resolved: bool,
}

impl PendingChange {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Whether this guard still owns the store's snapshot
    pub fn is_current(&self) -> bool {
        self.store.inner.read().owner == Some(self.id)
    }

    pub fn commit(mut self) {
        self.resolved = true;
        if self.store.owns(self.id) {
            self.store.commit();
        }
    }

    pub fn rollback(mut self) {
        self.resolved = true;
        if self.store.owns(self.id) {
            self.store.rollback();
        }
    }

    /// Give up before anything was mutated; same as commit, without the log noise
    pub fn release(mut self) {
        self.resolved = true;
        let mut inner = self.store.inner.write();
        if inner.owner == Some(self.id) {
            inner.history = None;
            inner.is_busy = false;
            inner.owner = None;
        }
    }
}

impl Drop for PendingChange {
    fn drop(&mut self) {
        if !self.resolved {
            warn!("Pending change {} dropped unresolved", self.id);
            if self.store.owns(self.id) {
                self.store.rollback();
            }
        }
    }
}

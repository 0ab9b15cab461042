//! NUI inventory
//!
//! Client-side state and orchestration for a two-pane game inventory shown in
//! an embedded browser overlay. The store holds both panes, the operation
//! handler moves items optimistically and asks the host to confirm, and the
//! dispatcher applies authoritative updates pushed by the host.

pub mod catalog;
pub mod config;
pub mod error;
pub mod gui;
pub mod handlers;
pub mod inventory;
pub mod logging;
pub mod nui;
pub mod types;

pub use catalog::ItemCatalog;
pub use error::InventoryError;
pub use handlers::ItemOperationHandler;
pub use inventory::{InventoryStore, StoreChange};
pub use nui::{HostBridge, HostClient, NuiDispatcher};
pub use types::{Inventory, InventoryType, ItemDefinition, Slot, SlotItem, SlotRef};

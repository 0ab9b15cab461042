pub mod helpers;
pub mod operations;
pub mod refresh;
pub mod store;

pub use operations::InventoryState;
pub use refresh::{ItemUpdate, RefreshEntry, RefreshPayload, RefreshSummary, SlotsData, WeightData};
pub use store::{InventoryStore, PendingChange, StoreChange};

use thiserror::Error;

use crate::types::InventoryType;

/// Failures of local inventory operations
///
/// None of these are fatal: the store is always left either untouched or
/// restored from its snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InventoryError {
    #[error("no item in {inventory} slot {slot}")]
    SourceSlotNotFound { inventory: InventoryType, slot: u32 },

    #[error("{inventory} has no slot {slot}")]
    TargetSlotNotFound { inventory: InventoryType, slot: u32 },

    #[error("no free slot in {0}")]
    NoFreeSlot(InventoryType),

    #[error("source and target are the same slot")]
    SameSlot,

    #[error("another item operation is still pending")]
    Busy,

    #[error("host rejected the operation")]
    RemoteRejected,

    #[error("host call failed: {0}")]
    RemoteError(String),

    #[error("malformed refresh entry: {0}")]
    MalformedRefresh(String),

    #[error("a drag is already in progress")]
    AlreadyDragging,

    #[error("no drag in progress")]
    NotDragging,

    #[error("items from {0} cannot be moved this way")]
    UnsupportedSource(InventoryType),
}

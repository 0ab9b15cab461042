//! Pointer drag session
//!
//! Zero or one drag at a time: `idle -> dragging -> idle`. The session only
//! carries display data and the originating slot; what a drop does is decided
//! by the operation handler.

use tracing::debug;

use crate::error::InventoryError;
use crate::types::{Coords, DragSource, DropTarget};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        source: DragSource,
        position: Coords,
    },
}

#[derive(Debug, Clone, Default)]
pub struct DragSession {
    state: DragState,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn source(&self) -> Option<&DragSource> {
        match &self.state {
            DragState::Dragging { source, .. } => Some(source),
            DragState::Idle => None,
        }
    }

    pub fn position(&self) -> Option<Coords> {
        match &self.state {
            DragState::Dragging { position, .. } => Some(*position),
            DragState::Idle => None,
        }
    }

    pub fn start(&mut self, source: DragSource, position: Coords) -> Result<(), InventoryError> {
        if self.is_dragging() {
            return Err(InventoryError::AlreadyDragging);
        }
        debug!("Drag started from {}", source.slot_ref());
        self.state = DragState::Dragging { source, position };
        Ok(())
    }

    /// Follow the pointer; ignored while idle
    pub fn update_position(&mut self, coords: Coords) {
        if let DragState::Dragging { position, .. } = &mut self.state {
            *position = coords;
        }
    }

    /// Finish the drag over `target`, handing back the source for the transfer
    ///
    /// The session is idle afterwards whatever the caller does with the result.
    pub fn drop(&mut self, target: &DropTarget) -> Result<DragSource, InventoryError> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging { source, .. } => {
                debug!("Dropped {} on {}", source.slot_ref(), target.slot_ref());
                Ok(source)
            }
            DragState::Idle => Err(InventoryError::NotDragging),
        }
    }

    /// Abandon the drag without a target
    pub fn end(&mut self) {
        if self.is_dragging() {
            debug!("Drag cancelled");
        }
        self.state = DragState::Idle;
    }
}

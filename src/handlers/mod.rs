pub mod operation_handler;

pub use operation_handler::{DropOutcome, ItemOperationHandler, MoveReport, OperationConfig};

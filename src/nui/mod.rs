pub mod dev_host;
pub mod dispatcher;
pub mod host;
pub mod messages;

pub use dev_host::DevHost;
pub use dispatcher::NuiDispatcher;
pub use host::{HostAction, HostBridge, HostClient, SwapResponse, TransferRequest};
pub use messages::{parse_message_data, InitPayload, NuiEvent, NuiMessage, SetupPayload};

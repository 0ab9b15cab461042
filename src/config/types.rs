use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub inventory: InventorySettings,

    #[serde(default)]
    pub dev_host: DevHostConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_true")]
    pub file_enabled: bool,

    #[serde(default = "default_log_file_name")]
    pub file_name: String,

    /// Log directory; next to the executable when unset
    #[serde(default)]
    pub directory: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySettings {
    /// Treat a failed `swapItems` transport as acceptance instead of rolling back
    #[serde(default)]
    pub accept_on_bridge_error: bool,

    /// Fetch item data for unknown names as soon as a pane is set up
    #[serde(default = "default_true")]
    pub prefetch_item_data: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevHostConfig {
    #[serde(default = "default_true")]
    pub accept_moves: bool,

    /// Answered instead of `true` for accepted moves
    #[serde(default)]
    pub container_weight: Option<f64>,
}

// Default values
fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file_name() -> String {
    "inventory.log".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_enabled: true,
            file_name: default_log_file_name(),
            directory: None,
        }
    }
}

impl Default for InventorySettings {
    fn default() -> Self {
        Self {
            accept_on_bridge_error: false,
            prefetch_item_data: true,
        }
    }
}

impl Default for DevHostConfig {
    fn default() -> Self {
        Self {
            accept_moves: true,
            container_weight: None,
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::defaults;

/// EventsWatcherConfig is the configuration for the block scanner.
#[derive(Debug, Clone, Serialize, Deserialize, Copy)]
#[serde(rename_all = "kebab-case")]
pub struct EventsWatcherConfig {
    /// if it is enabled for this contract or not.
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,
    /// Polling interval in milliseconds
    #[serde(
        rename(serialize = "pollingInterval"),
        default = "defaults::scan_polling_interval"
    )]
    pub polling_interval: u64,
    /// The maximum number of blocks to fetch logs for in one request.
    #[serde(skip_serializing, default = "defaults::max_blocks_per_step")]
    pub max_blocks_per_step: u64,
    /// print sync progress frequency in milliseconds
    /// if it is zero, means no progress will be printed.
    #[serde(skip_serializing, default = "defaults::print_progress_interval")]
    pub print_progress_interval: u64,
}

impl Default for EventsWatcherConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            polling_interval: defaults::scan_polling_interval(),
            max_blocks_per_step: defaults::max_blocks_per_step(),
            print_progress_interval: defaults::print_progress_interval(),
        }
    }
}

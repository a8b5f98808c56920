use serde::{Deserialize, Serialize};

use crate::defaults;

/// NonceConfig configures the nonce reconciliation task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NonceConfig {
    /// How often the local counter is compared with the network, in milliseconds.
    #[serde(default = "defaults::reconcile_interval")]
    pub reconcile_interval: u64,
    /// The local counter is reset once it runs this far ahead of the network.
    #[serde(default = "defaults::drift_threshold")]
    pub drift_threshold: u64,
}

impl Default for NonceConfig {
    fn default() -> Self {
        Self {
            reconcile_interval: defaults::reconcile_interval(),
            drift_threshold: defaults::drift_threshold(),
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::defaults;

/// CommitmentConfig is the configuration for the two commitment tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommitmentConfig {
    /// How many times a subscription is attempted before it is left failed.
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,
    /// The signature path.
    #[serde(default)]
    pub signature: SignatureCommitmentConfig,
    /// The proof path.
    #[serde(default)]
    pub proof: ProofCommitmentConfig,
}

impl Default for CommitmentConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            signature: Default::default(),
            proof: Default::default(),
        }
    }
}

/// SignatureCommitmentConfig configures the fast commitment task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SignatureCommitmentConfig {
    /// Polling interval in milliseconds
    #[serde(
        rename(serialize = "pollingInterval"),
        default = "defaults::signature_polling_interval"
    )]
    pub polling_interval: u64,
    /// Wait for the receipt of every submitted commitment.
    #[serde(default = "defaults::disabled")]
    pub await_confirmation: bool,
    /// The `uint256` value committed for every subscription.
    #[serde(default = "defaults::signature_payload")]
    pub payload: u64,
}

impl Default for SignatureCommitmentConfig {
    fn default() -> Self {
        Self {
            polling_interval: defaults::signature_polling_interval(),
            await_confirmation: defaults::disabled(),
            payload: defaults::signature_payload(),
        }
    }
}

/// ProofCommitmentConfig configures the slow commitment task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProofCommitmentConfig {
    /// Polling interval in milliseconds
    #[serde(
        rename(serialize = "pollingInterval"),
        default = "defaults::proof_polling_interval"
    )]
    pub polling_interval: u64,
    /// Wait for the receipt of every submitted commitment.
    #[serde(default = "defaults::enabled")]
    pub await_confirmation: bool,
    /// Gas limit attached to every proof commitment.
    #[serde(default = "defaults::proof_gas_limit")]
    pub gas_limit: u64,
    /// The 4 byte callback selector, hex encoded.
    #[serde(default = "defaults::callback_selector")]
    pub callback_selector: String,
}

impl Default for ProofCommitmentConfig {
    fn default() -> Self {
        Self {
            polling_interval: defaults::proof_polling_interval(),
            await_confirmation: defaults::enabled(),
            gas_limit: defaults::proof_gas_limit(),
            callback_selector: defaults::callback_selector(),
        }
    }
}

impl ProofCommitmentConfig {
    /// Decodes [`Self::callback_selector`] into its 4 raw bytes.
    pub fn callback_selector_bytes(
        &self,
    ) -> oraclex_relayer_utils::Result<[u8; 4]> {
        let raw = self
            .callback_selector
            .strip_prefix("0x")
            .unwrap_or(&self.callback_selector);
        let bytes = hex::decode(raw)?;
        let len = bytes.len();
        bytes.try_into().map_err(|_| {
            oraclex_relayer_utils::Error::FieldOverflow {
                field: "callback-selector",
                width: 4,
                len,
            }
        })
    }
}

use ethers::types::Address;
use oraclex_relayer_types::{mnemonic::Mnemonic, rpc_url::RpcUrl};

use crate::defaults;
use crate::event_watcher::EventsWatcherConfig;

use super::*;

/// EvmChainConfig is the configuration for the EVM network the relayer
/// watches and submits commitments to.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EvmChainConfig {
    /// String that groups configuration for this chain on a human-readable name.
    #[serde(default = "defaults::chain_name")]
    pub name: String,
    /// chain specific id (output of chainId opcode on EVM networks)
    #[serde(rename(serialize = "chainId"))]
    pub chain_id: u64,
    /// Http(s) Endpoint for quick Req/Res
    #[serde(skip_serializing)]
    pub http_endpoint: RpcUrl,
    /// Block Explorer for this chain.
    ///
    /// Optional, and only used for printing a clickable links
    /// for transactions and contracts.
    #[serde(skip_serializing)]
    pub explorer: Option<url::Url>,
    /// The seed phrase of the oracle signer.
    ///
    /// 1. if it starts with '$' then it would be considered as an Enviroment
    ///    variable holding the phrase.
    ///    Example: $ORACLE_X_SIGNER_MNEMONIC
    ///
    /// 2. otherwise it is the 12 or 24 word phrase itself.
    #[serde(skip_serializing)]
    pub mnemonic: Option<Mnemonic>,
    /// BIP-44 derivation path of the signer account.
    #[serde(default = "defaults::derivation_path")]
    pub derivation_path: String,
    /// Deadline for a single RPC call, in milliseconds. Zero disables it.
    #[serde(default = "defaults::rpc_timeout")]
    pub rpc_timeout: u64,
}

/// OracleXContractConfig is the configuration of the watched OracleX contract.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OracleXContractConfig {
    /// The address of this contract on this chain.
    pub address: Address,
    /// the block number where this contract got deployed at.
    ///
    /// The scanner starts from here on a cold start.
    #[serde(default)]
    pub deployed_at: u64,
    /// The configuration for the events watcher of this contract.
    #[serde(default)]
    pub events_watcher: EventsWatcherConfig,
}

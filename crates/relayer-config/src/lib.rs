// Copyright 2022 Webb Technologies Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Relayer Configuration Module 🕸️
//!
//! A module for configuring the OracleX relayer.
//!
//! ## Overview
//!
//! The configuration is read from every `*.toml` / `*.json` file under the
//! config directory and then merged with `ORACLEX__*` environment variables.
//! Possible sections include:
//! * `chain`: the EVM network the relayer talks to, and the signer mnemonic.
//! * `contract`: the OracleX contract address and its events watcher.
//! * `commitment`: the signature and proof commitment tasks.
//! * `nonce`: the nonce reconciliation task.
//!
//! See [config/local-anvil](../../config/local-anvil) for an example.

#![warn(missing_docs)]

/// CLI configuration
#[cfg(feature = "cli")]
pub mod cli;
/// Commitment tasks configuration
pub mod commitment;
/// Default values for optional keys
pub mod defaults;
/// Event watcher configuration
pub mod event_watcher;
/// EVM configuration
pub mod evm;
/// Nonce reconciliation configuration
pub mod nonce;
/// Utils for processing configuration
pub mod utils;

use serde::{Deserialize, Serialize};

use commitment::CommitmentConfig;
use evm::{EvmChainConfig, OracleXContractConfig};
use nonce::NonceConfig;

/// OracleXRelayerConfig is the configuration for the OracleX relayer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OracleXRelayerConfig {
    /// The EVM network the relayer is connected to.
    pub chain: EvmChainConfig,
    /// The OracleX contract being watched and committed to.
    pub contract: OracleXContractConfig,
    /// Configuration of the two commitment tasks.
    #[serde(default)]
    pub commitment: CommitmentConfig,
    /// Configuration of the nonce reconciliation task.
    #[serde(default)]
    pub nonce: NonceConfig,
}

impl OracleXRelayerConfig {
    /// Makes sure that the config is valid, by going
    /// through the whole config and doing some basic checks.
    ///
    /// A relayer without a signer can neither sign nor submit commitments,
    /// so a missing mnemonic is fatal.
    pub fn verify(&self) -> oraclex_relayer_utils::Result<()> {
        self.chain
            .mnemonic
            .is_some()
            .then_some(())
            .ok_or(oraclex_relayer_utils::Error::MissingSecrets)?;
        self.commitment.proof.callback_selector_bytes()?;
        if self.contract.events_watcher.max_blocks_per_step == 0 {
            return Err(oraclex_relayer_utils::Error::Generic(
                "max-blocks-per-step must be greater than zero",
            ));
        }
        Ok(())
    }
}

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

#![warn(missing_docs)]
//! # Relayer Context Module 🕸️
//!
//! A module for managing the context of the relayer.
use std::sync::Arc;
use std::time::Duration;

use ethers::prelude::*;
use ethers::signers::coins_bip39::English;
use tokio::sync::broadcast;

use oraclex_relayer_store::InMemoryStore;
use oraclex_relayer_utils::{EthersClient, SignerClient};

/// The chain client trait and its `ethers` implementation.
pub mod chain_client;
/// Retry policy of the JSON-RPC transport.
pub mod ethers_retry_policy;
/// A scripted chain client for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use chain_client::{ChainClient, EthersChainClient};

/// RelayerContext contains Relayer's configuration, the subscription
/// registry and the shutdown signal.
#[derive(Clone)]
pub struct RelayerContext {
    /// The configuration of the relayer.
    pub config: oraclex_relayer_config::OracleXRelayerConfig,
    /// Broadcasts a shutdown signal to all background tasks.
    ///
    /// When a task is spawned, it is passed a broadcast receiver handle.
    /// When a graceful shutdown is initiated, a `()` value is sent via the
    /// broadcast::Sender. Each task receives it, reaches a safe terminal
    /// state, and completes.
    notify_shutdown: broadcast::Sender<()>,
    store: InMemoryStore,
}

impl RelayerContext {
    /// Creates a new RelayerContext.
    pub fn new(
        config: oraclex_relayer_config::OracleXRelayerConfig,
        store: InMemoryStore,
    ) -> Self {
        let (notify_shutdown, _) = broadcast::channel(2);
        Self {
            config,
            notify_shutdown,
            store,
        }
    }
    /// Returns a broadcast receiver handle for the shutdown signal.
    pub fn shutdown_signal(&self) -> Shutdown {
        Shutdown::new(self.notify_shutdown.subscribe())
    }
    /// Sends a shutdown signal to all subscribed tasks.
    pub fn shutdown(&self) {
        let _ = self.notify_shutdown.send(());
    }
    /// The subscription registry.
    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }
    /// The configured per-call RPC deadline.
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.config.chain.rpc_timeout)
    }
    /// Returns a new JSON-RPC provider for the configured chain.
    ///
    /// Rate limited requests are retried according to
    /// [`ethers_retry_policy::OracleXHttpRetryPolicy`].
    pub fn evm_provider(&self) -> EthersClient {
        let endpoint = self.config.chain.http_endpoint.as_url().clone();
        let client = RetryClientBuilder::default()
            .rate_limit_retries(10)
            .timeout_retries(3)
            .initial_backoff(Duration::from_millis(500))
            .build(
                Http::new(endpoint),
                ethers_retry_policy::OracleXHttpRetryPolicy::boxed(),
            );
        Provider::new(client).interval(Duration::from_millis(1000u64))
    }
    /// Derives the oracle signer from the configured mnemonic.
    ///
    /// Fails with [`oraclex_relayer_utils::Error::MissingSecrets`] if the
    /// mnemonic is absent.
    pub fn evm_wallet(&self) -> oraclex_relayer_utils::Result<LocalWallet> {
        let chain_config = &self.config.chain;
        let mnemonic = chain_config
            .mnemonic
            .as_ref()
            .ok_or(oraclex_relayer_utils::Error::MissingSecrets)?;
        derive_wallet(
            mnemonic.phrase(),
            &chain_config.derivation_path,
            chain_config.chain_id,
        )
    }
    /// Returns the signer middleware transactions are sent through.
    pub fn signer_client(
        &self,
    ) -> oraclex_relayer_utils::Result<Arc<SignerClient>> {
        let provider = self.evm_provider();
        let wallet = self.evm_wallet()?;
        Ok(Arc::new(SignerMiddleware::new(provider, wallet)))
    }
    /// Returns the chain client used by every background task.
    pub fn chain_client(
        &self,
    ) -> oraclex_relayer_utils::Result<Arc<dyn ChainClient>> {
        let client = self.signer_client()?;
        Ok(Arc::new(EthersChainClient::new(client, self.rpc_timeout())))
    }
}

/// Derives a wallet from an English seed phrase along `derivation_path`.
pub fn derive_wallet(
    phrase: &str,
    derivation_path: &str,
    chain_id: u64,
) -> oraclex_relayer_utils::Result<LocalWallet> {
    let wallet = MnemonicBuilder::<English>::default()
        .phrase(phrase)
        .derivation_path(derivation_path)?
        .build()?;
    Ok(wallet.with_chain_id(chain_id))
}

/// Listens for the shutdown signal.
///
/// Shutdown is signalled using a `broadcast::Receiver`. Only a single value is
/// ever sent. Once a value has been sent via the broadcast channel, the tasks
/// should stop.
///
/// The `Shutdown` struct listens for the signal and tracks that the signal has
/// been received. Callers may query for whether the shutdown signal has been
/// received or not.
#[derive(Debug)]
pub struct Shutdown {
    /// `true` if the shutdown signal has been received
    shutdown: bool,

    /// The receive half of the channel used to listen for shutdown.
    notify: broadcast::Receiver<()>,
}

impl Shutdown {
    /// Create a new `Shutdown` backed by the given `broadcast::Receiver`.
    pub fn new(notify: broadcast::Receiver<()>) -> Shutdown {
        Shutdown {
            shutdown: false,
            notify,
        }
    }

    /// Returns `true` if the shutdown signal has been received.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    /// Receive the shutdown notice, waiting if necessary.
    pub async fn recv(&mut self) {
        // If the shutdown signal has already been received, then return
        // immediately.
        if self.shutdown {
            return;
        }

        // Cannot receive a "lag error" as only one value is ever sent.
        let _ = self.notify.recv().await;

        // Remember that the signal has been received.
        self.shutdown = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str =
        "test test test test test test test test test test test junk";

    fn config(mnemonic: bool) -> oraclex_relayer_config::OracleXRelayerConfig {
        let mut value = serde_json::json!({
            "chain": {
                "chain-id": 31337,
                "http-endpoint": "http://127.0.0.1:8545",
            },
            "contract": {
                "address": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            },
        });
        if mnemonic {
            value["chain"]["mnemonic"] = PHRASE.into();
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn derives_the_first_anvil_account() {
        let wallet = derive_wallet(PHRASE, "m/44'/60'/0'/0/0", 31337).unwrap();
        let expected: Address =
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
        assert_eq!(wallet.address(), expected);
        assert_eq!(wallet.chain_id(), 31337);

        let second = derive_wallet(PHRASE, "m/44'/60'/0'/0/1", 31337).unwrap();
        assert_ne!(second.address(), expected);
    }

    #[test]
    fn wallet_requires_a_mnemonic() {
        let ctx = RelayerContext::new(config(false), InMemoryStore::default());
        assert!(matches!(
            ctx.evm_wallet(),
            Err(oraclex_relayer_utils::Error::MissingSecrets)
        ));
        let ctx = RelayerContext::new(config(true), InMemoryStore::default());
        assert!(ctx.evm_wallet().is_ok());
    }

    #[tokio::test]
    async fn shutdown_reaches_every_subscriber() {
        let ctx = RelayerContext::new(config(true), InMemoryStore::default());
        let mut a = ctx.shutdown_signal();
        let mut b = ctx.shutdown_signal();
        ctx.shutdown();
        a.recv().await;
        b.recv().await;
        assert!(a.is_shutdown() && b.is_shutdown());
        // a second recv returns immediately.
        a.recv().await;
    }
}

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

//! # Relayer Service Module 🕸️
//!
//! A module for starting the long-running tasks of the relayer.
//!
//! ## Overview
//!
//! Services are tasks which the relayer constantly runs throughout its
//! lifetime. Every task listens to the shutdown signal of the
//! [`RelayerContext`] and stops on it.

use std::sync::Arc;
use std::time::Duration;

use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use tokio::task::JoinHandle;

use oraclex_commitment::{Cadence, CommitmentService, DataSource};
use oraclex_event_watcher::scanner::BlockScanner;
use oraclex_relayer_context::{ChainClient, RelayerContext};
use oraclex_relayer_store::InMemoryStore;
use oraclex_relayer_utils::probe;
use oraclex_relayer_utils::retry::ConstantWithMaxRetryCount;
use oraclex_tx_queue::{NonceManager, TxSubmitter};

/// How often the first nonce fetch is retried before giving up.
const INITIAL_NONCE_RETRIES: usize = 5;

/// Fires up all background services of the relayer.
///
/// The local nonce counter is reconciled once before any commitment task
/// starts, so the first allocation is the network value. Returns the handles
/// of the spawned tasks.
///
/// # Arguments
///
/// * `ctx` - RelayContext reference that holds the configuration
/// * `client` - The chain client every task talks to
/// * `wallet` - The oracle signer
/// * `data_source` - Where proof commitments get their data from
pub async fn ignite(
    ctx: &RelayerContext,
    client: Arc<dyn ChainClient>,
    wallet: LocalWallet,
    data_source: Arc<dyn DataSource>,
) -> crate::Result<Vec<JoinHandle<()>>> {
    tracing::debug!(
        "Relayer configuration: {}",
        serde_json::to_string_pretty(&ctx.config)?
    );
    let account = wallet.address();
    let nonces = NonceManager::new(ctx.config.nonce.drift_threshold);
    let backoff = ConstantWithMaxRetryCount::new(
        Duration::from_millis(ctx.config.nonce.reconcile_interval),
        INITIAL_NONCE_RETRIES,
    );
    let initial_nonce =
        initial_reconcile(&nonces, client.as_ref(), account, backoff).await?;

    let mut handles = Vec::with_capacity(4);
    handles.extend(start_block_scanner(ctx, client.clone()));
    handles.push(start_nonce_reconciliation(
        ctx,
        nonces.clone(),
        client.clone(),
        account,
    ));

    let submitter =
        TxSubmitter::new(client, nonces, ctx.config.chain.explorer.clone());
    let service = CommitmentService::new(
        &ctx.config,
        ctx.store().clone(),
        submitter,
        wallet,
        data_source,
    )?;
    for cadence in [Cadence::Fast, Cadence::Slow] {
        handles.push(start_commitment_task(ctx, service.clone(), cadence));
    }
    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::Lifecycle,
        started = true,
        %account,
        nonce = initial_nonce,
        tasks = handles.len(),
    );
    Ok(handles)
}

/// Fetches the network nonce once and seeds the local counter with it.
///
/// Retries on the given backoff; fails if the network never answers.
pub async fn initial_reconcile<B>(
    nonces: &NonceManager,
    client: &dyn ChainClient,
    account: Address,
    backoff: B,
) -> crate::Result<u64>
where
    B: backoff::backoff::Backoff,
{
    let task = move || async move {
        nonces.sync(client, account).await.map_err(|e| {
            tracing::event!(
                target: probe::TARGET,
                tracing::Level::DEBUG,
                kind = %probe::Kind::Retry,
                error = %e,
                "failed to fetch the network nonce, retrying"
            );
            backoff::Error::transient(e)
        })
    };
    backoff::future::retry(backoff, task).await?;
    let nonce = nonces.current();
    tracing::info!(%account, nonce, "Nonce counter initialized");
    Ok(nonce)
}

/// Starts the block scanner, unless it is disabled in the config.
pub fn start_block_scanner(
    ctx: &RelayerContext,
    client: Arc<dyn ChainClient>,
) -> Option<JoinHandle<()>> {
    let config = &ctx.config.contract;
    if !config.events_watcher.enabled {
        tracing::warn!(
            "Events watcher is disabled for ({:?}).",
            config.address,
        );
        return None;
    }
    let scanner = BlockScanner::new(client, ctx.store().clone(), config);
    let shutdown_signal = ctx.shutdown_signal();
    let contract_address = config.address;
    let task = async move {
        tracing::debug!(
            "Events watcher for ({:?}) Started.",
            contract_address,
        );
        if let Err(e) = scanner.run(shutdown_signal).await {
            tracing::error!(
                "Events watcher for ({:?}) stopped: {}",
                contract_address,
                e,
            );
        }
    };
    Some(tokio::task::spawn(task))
}

/// Starts one of the two commitment tasks.
pub fn start_commitment_task(
    ctx: &RelayerContext,
    service: CommitmentService<InMemoryStore>,
    cadence: Cadence,
) -> JoinHandle<()> {
    let shutdown_signal = ctx.shutdown_signal();
    let task = async move {
        tracing::debug!("Commitment task ({}) Started.", cadence);
        if let Err(e) = service.run(cadence, shutdown_signal).await {
            tracing::error!("Commitment task ({}) stopped: {}", cadence, e);
        }
    };
    tokio::task::spawn(task)
}

/// Starts the nonce reconciliation task.
pub fn start_nonce_reconciliation(
    ctx: &RelayerContext,
    nonces: NonceManager,
    client: Arc<dyn ChainClient>,
    account: Address,
) -> JoinHandle<()> {
    let shutdown_signal = ctx.shutdown_signal();
    let interval = Duration::from_millis(ctx.config.nonce.reconcile_interval);
    let task = async move {
        tracing::debug!("Nonce reconciliation for ({:?}) Started.", account);
        if let Err(e) = nonces
            .run_reconcile(client, account, interval, shutdown_signal)
            .await
        {
            tracing::error!("Nonce reconciliation stopped: {}", e);
        }
    };
    tokio::task::spawn(task)
}

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

use std::sync::Arc;
use std::time::Duration;

use ethers::signers::LocalWallet;
use ethers::types::{Address, Bytes};
use tokio::time::MissedTickBehavior;

use oraclex_relayer_config::commitment::CommitmentConfig;
use oraclex_relayer_config::OracleXRelayerConfig;
use oraclex_relayer_context::Shutdown;
use oraclex_relayer_store::{EntryState, SubscriptionEntry, SubscriptionStore};
use oraclex_relayer_types::NormalizedEvent;
use oraclex_relayer_utils::{probe, Error, Result};
use oraclex_tx_queue::{SubmittedTx, TxStatus, TxSubmitter};

use crate::data_source::DataSource;
use crate::encoding::abi_uint256;
use crate::multisig;
use crate::proof::ProofBuilder;
use crate::route::{route, Cadence, Route};
use crate::signature::SignatureBuilder;

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Entries a transaction was sent for.
    pub submitted: usize,
    /// Entries whose transaction was mined successfully.
    pub confirmed: usize,
    /// Entries that ended the tick failed.
    pub failed: usize,
    /// Entries that were left untouched.
    pub skipped: usize,
}

/// Answers registry entries with data commitments.
///
/// One value serves both cadences; run it once per [`Cadence`].
#[derive(Clone)]
pub struct CommitmentService<S> {
    store: S,
    submitter: TxSubmitter,
    contract: Address,
    signature: SignatureBuilder,
    proof: ProofBuilder,
    config: CommitmentConfig,
}

impl<S> CommitmentService<S>
where
    S: SubscriptionStore + 'static,
{
    /// Creates the service from the relayer config.
    pub fn new(
        config: &OracleXRelayerConfig,
        store: S,
        submitter: TxSubmitter,
        wallet: LocalWallet,
        data_source: Arc<dyn DataSource>,
    ) -> Result<Self> {
        let contract = config.contract.address;
        let chain_id = config.chain.chain_id;
        let signature = SignatureBuilder::new(
            contract,
            chain_id,
            abi_uint256(config.commitment.signature.payload),
            wallet,
        );
        let proof = ProofBuilder::new(
            contract,
            chain_id,
            config.commitment.proof.callback_selector_bytes()?,
            data_source,
        );
        Ok(Self {
            store,
            submitter,
            contract,
            signature,
            proof,
            config: config.commitment.clone(),
        })
    }

    /// Works through every eligible entry of the given cadence once.
    ///
    /// Failures are recorded on the entry they belong to; only a failure to
    /// read the registry fails the tick.
    pub async fn tick(&self, cadence: Cadence) -> Result<TickReport> {
        let mut report = TickReport::default();
        for entry in self.store.eligible(self.config.max_attempts)? {
            let route = route(entry.event());
            if route.cadence() != cadence {
                continue;
            }
            let state = match route {
                Route::Multisig => {
                    multisig::handle(&entry);
                    report.skipped += 1;
                    continue;
                }
                Route::Unsupported => {
                    let e = Error::UnsupportedRoute(format!(
                        "{} with auth mode {}",
                        entry.event().name(),
                        entry.event().auth_mode()
                    ));
                    tracing::warn!(entry = entry.id(), error = %e, "dropping subscription");
                    EntryState::Failed {
                        reason: e.to_string(),
                        retryable: false,
                    }
                }
                Route::Signature | Route::Proof => {
                    match self.commit(&entry, route).await {
                        Ok(Some(state)) => state,
                        Ok(None) => {
                            report.skipped += 1;
                            continue;
                        }
                        Err(e) => {
                            tracing::error!(entry = entry.id(), error = %e, "registry error");
                            report.skipped += 1;
                            continue;
                        }
                    }
                }
            };
            match &state {
                EntryState::Submitted { .. } => report.submitted += 1,
                EntryState::Confirmed { .. } => {
                    report.submitted += 1;
                    report.confirmed += 1;
                }
                EntryState::Failed { .. } => report.failed += 1,
                EntryState::Pending | EntryState::InFlight => {}
            }
            tracing::event!(
                target: probe::TARGET,
                tracing::Level::DEBUG,
                kind = %probe::Kind::Commitment,
                entry = entry.id(),
                %route,
                state = ?state,
            );
            match self.store.set_state(entry.id(), state) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(entry = entry.id(), "entry was settled meanwhile");
                }
                Err(e) => {
                    tracing::error!(entry = entry.id(), error = %e, "failed to record commitment state");
                }
            }
        }
        Ok(report)
    }

    /// Runs one attempt for an entry and returns its new state.
    ///
    /// `None` if the entry is gone or was claimed or settled since the
    /// registry was read.
    async fn commit(
        &self,
        entry: &SubscriptionEntry,
        route: Route,
    ) -> Result<Option<EntryState>> {
        let Some(attempt) = self
            .store
            .begin_attempt(entry.id(), self.config.max_attempts)?
        else {
            return Ok(None);
        };
        let subscription = entry.event().subscription_key();
        tracing::debug!(entry = entry.id(), %subscription, attempt, %route, "building commitment");
        let (calldata, gas_limit, await_confirmation) =
            match self.build(entry.event(), route).await {
                Ok(built) => built,
                Err(e) => {
                    tracing::error!(
                        %subscription,
                        error = %e,
                        "failed to build the commitment"
                    );
                    return Ok(Some(EntryState::Failed {
                        reason: e.to_string(),
                        retryable: false,
                    }));
                }
            };
        let tx = match self
            .submitter
            .submit(self.contract, calldata, gas_limit, await_confirmation)
            .await
        {
            Ok(tx) => tx,
            Err(e) => {
                tracing::warn!(
                    %subscription,
                    attempt,
                    error = %e,
                    "failed to submit the commitment"
                );
                return Ok(Some(EntryState::Failed {
                    reason: e.to_string(),
                    retryable: true,
                }));
            }
        };
        Ok(Some(state_of(tx)))
    }

    async fn build(
        &self,
        event: &NormalizedEvent,
        route: Route,
    ) -> Result<(Bytes, Option<u64>, bool)> {
        match (route, event) {
            (Route::Signature, NormalizedEvent::ActiveModeQuery(query)) => {
                let calldata = self.signature.calldata(query).await?;
                Ok((
                    calldata,
                    None,
                    self.config.signature.await_confirmation,
                ))
            }
            (Route::Proof, NormalizedEvent::PassiveModeQuery(query)) => {
                let calldata = self.proof.calldata(query).await?;
                Ok((
                    calldata,
                    Some(self.config.proof.gas_limit),
                    self.config.proof.await_confirmation,
                ))
            }
            (Route::Proof, NormalizedEvent::ActiveModeQuery(query)) => {
                Err(Error::MissingCallbackMetadata {
                    subscription_id: query.subscription_id.clone(),
                })
            }
            (route, event) => Err(Error::UnsupportedRoute(format!(
                "{} via {route}",
                event.name()
            ))),
        }
    }

    /// Runs [`Self::tick`] for `cadence` on its polling interval until
    /// shutdown.
    #[tracing::instrument(skip_all, fields(contract = ?self.contract, tag = %cadence))]
    pub async fn run(self, cadence: Cadence, mut shutdown: Shutdown) -> Result<()> {
        let period = match cadence {
            Cadence::Fast => self.config.signature.polling_interval,
            Cadence::Slow => self.config.proof.polling_interval,
        };
        let mut interval = tokio::time::interval(Duration::from_millis(period));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::DEBUG,
            kind = %probe::Kind::Lifecycle,
            started = true,
            %cadence,
        );
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.recv() => {
                    tracing::debug!("{} commitment task is shutting down", cadence);
                    return Ok(());
                }
            }
            match self.tick(cadence).await {
                Ok(report) if report != TickReport::default() => {
                    tracing::debug!(?report, "commitment tick done");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read the registry");
                }
            }
        }
    }
}

fn state_of(tx: SubmittedTx) -> EntryState {
    match tx.status {
        TxStatus::Sent => EntryState::Submitted {
            tx_hash: tx.tx_hash,
            nonce: tx.nonce,
        },
        TxStatus::Confirmed => EntryState::Confirmed {
            tx_hash: Some(tx.tx_hash),
        },
        TxStatus::Reverted => EntryState::Failed {
            reason: format!("transaction {:?} reverted", tx.tx_hash),
            retryable: true,
        },
        TxStatus::Dropped => EntryState::Failed {
            reason: format!("transaction {:?} was dropped", tx.tx_hash),
            retryable: true,
        },
    }
}

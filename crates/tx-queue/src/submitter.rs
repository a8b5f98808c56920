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

use ethers::types::{Address, Bytes, TxHash};
use url::Url;

use oraclex_relayer_context::ChainClient;
use oraclex_relayer_utils::clickable_link::tx_link;
use oraclex_relayer_utils::probe;

use crate::nonce::NonceManager;

/// What became of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    /// Sent, and not waited for.
    Sent,
    /// Mined with a success status.
    Confirmed,
    /// Mined, but the call reverted.
    Reverted,
    /// Never mined.
    Dropped,
}

/// A transaction the submitter handed to the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmittedTx {
    /// Hash of the signed transaction.
    pub tx_hash: TxHash,
    /// Nonce the transaction was sent with.
    pub nonce: u64,
    /// Outcome, as far as it is known.
    pub status: TxStatus,
}

/// Sends calls with locally allocated nonces.
///
/// A nonce that was allocated for a failed submission is not returned; the
/// reconciliation task repairs the gap.
#[derive(Clone)]
pub struct TxSubmitter {
    client: Arc<dyn ChainClient>,
    nonces: NonceManager,
    explorer: Option<Url>,
}

impl TxSubmitter {
    /// Creates a submitter sending through `client`.
    pub fn new(
        client: Arc<dyn ChainClient>,
        nonces: NonceManager,
        explorer: Option<Url>,
    ) -> Self {
        Self {
            client,
            nonces,
            explorer,
        }
    }

    /// The nonce allocator used by this submitter.
    pub fn nonces(&self) -> &NonceManager {
        &self.nonces
    }

    /// Sends `calldata` to `to` with the next local nonce, optionally
    /// waiting for the receipt.
    #[tracing::instrument(
        skip(self, calldata),
        fields(nonce = tracing::field::Empty)
    )]
    pub async fn submit(
        &self,
        to: Address,
        calldata: Bytes,
        gas_limit: Option<u64>,
        await_confirmation: bool,
    ) -> oraclex_relayer_utils::Result<SubmittedTx> {
        let nonce = self.nonces.allocate();
        tracing::Span::current().record("nonce", nonce);
        let tx_hash = match self
            .client
            .submit_transaction(to, calldata, nonce, gas_limit)
            .await
        {
            Ok(tx_hash) => tx_hash,
            Err(e) => {
                tracing::error!(nonce, error = %e, "Error while sending tx");
                tracing::event!(
                    target: probe::TARGET,
                    tracing::Level::DEBUG,
                    kind = %probe::Kind::TxQueue,
                    errored = true,
                    nonce,
                    error = %e,
                );
                return Err(e);
            }
        };
        let tx_hash_string = format!("0x{tx_hash:x}");
        let link = tx_link(self.explorer.as_ref(), &tx_hash_string);
        tracing::info!(nonce, "Tx {} is submitted and pending!", link);
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::DEBUG,
            kind = %probe::Kind::TxQueue,
            pending = true,
            nonce,
            %tx_hash,
        );
        if !await_confirmation {
            return Ok(SubmittedTx {
                tx_hash,
                nonce,
                status: TxStatus::Sent,
            });
        }

        let status = match self.client.await_confirmation(tx_hash).await {
            Ok(Some(receipt)) => match receipt.status {
                Some(v) if v.is_zero() => {
                    tracing::warn!("Tx {} Failed", link);
                    TxStatus::Reverted
                }
                _ => {
                    tracing::info!("Tx {} Finalized", link);
                    TxStatus::Confirmed
                }
            },
            Ok(None) => {
                tracing::warn!("Tx {} Dropped from Mempool!!", link);
                TxStatus::Dropped
            }
            Err(e) => {
                // the transaction may still land, it stays pending.
                tracing::warn!(error = %e, "Tx {} is still pending", link);
                TxStatus::Sent
            }
        };
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::DEBUG,
            kind = %probe::Kind::TxQueue,
            finalized = status == TxStatus::Confirmed,
            status = ?status,
            nonce,
            %tx_hash,
        );
        Ok(SubmittedTx {
            tx_hash,
            nonce,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oraclex_relayer_context::test_utils::{MockChainClient, ReceiptScript};

    fn setup(start: u64) -> (Arc<MockChainClient>, TxSubmitter) {
        let chain = Arc::new(MockChainClient::new());
        let submitter = TxSubmitter::new(
            chain.clone(),
            NonceManager::with_nonce(start, 20),
            None,
        );
        (chain, submitter)
    }

    #[tokio::test]
    async fn every_submission_uses_its_own_nonce() {
        let (chain, submitter) = setup(7);
        let to = Address::repeat_byte(1);
        let a = submitter
            .submit(to, Bytes::from(vec![1]), None, false)
            .await
            .unwrap();
        let b = submitter
            .submit(to, Bytes::from(vec![2]), Some(500_000), false)
            .await
            .unwrap();
        assert_eq!((a.nonce, b.nonce), (7, 8));
        assert_eq!(a.status, TxStatus::Sent);
        let sent = chain.submissions();
        assert_eq!(sent[0].nonce, 7);
        assert_eq!(sent[1].gas_limit, Some(500_000));
        assert_eq!(sent[1].tx_hash, b.tx_hash);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn failed_submissions_keep_the_nonce_consumed() {
        let (chain, submitter) = setup(0);
        chain.fail_submissions(1);
        let to = Address::repeat_byte(1);
        assert!(submitter.submit(to, Bytes::default(), None, false).await.is_err());
        assert!(logs_contain("Error while sending tx"));
        let tx = submitter.submit(to, Bytes::default(), None, false).await.unwrap();
        assert_eq!(tx.nonce, 1);
        assert_eq!(submitter.nonces().current(), 2);
    }

    #[tokio::test]
    async fn receipts_are_mapped_to_a_status() {
        let (chain, submitter) = setup(0);
        let to = Address::repeat_byte(1);
        let tx = submitter.submit(to, Bytes::default(), None, true).await.unwrap();
        assert_eq!(tx.status, TxStatus::Confirmed);
        chain.set_receipt(ReceiptScript::Reverted);
        let tx = submitter.submit(to, Bytes::default(), None, true).await.unwrap();
        assert_eq!(tx.status, TxStatus::Reverted);
        chain.set_receipt(ReceiptScript::Dropped);
        let tx = submitter.submit(to, Bytes::default(), None, true).await.unwrap();
        assert_eq!(tx.status, TxStatus::Dropped);
    }
}

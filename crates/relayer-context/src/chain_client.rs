use std::sync::Arc;
use std::time::Duration;

use ethers::prelude::*;

use oraclex_relayer_utils::timeout::with_timeout;
use oraclex_relayer_utils::{Error, SignerClient};

/// The calls the relayer issues against the chain.
///
/// Everything the scanner, the nonce allocator and the commitment tasks need
/// from the network goes through this trait, so they can be driven by a
/// scripted client in tests.
#[async_trait::async_trait]
pub trait ChainClient: Send + Sync {
    /// Current block height.
    async fn block_number(&self) -> oraclex_relayer_utils::Result<u64>;
    /// Logs emitted by `address` in the inclusive range `[from, to]`.
    async fn logs(
        &self,
        address: Address,
        from: u64,
        to: u64,
    ) -> oraclex_relayer_utils::Result<Vec<Log>>;
    /// The next valid nonce of `account` at the latest block.
    async fn account_nonce(
        &self,
        account: Address,
    ) -> oraclex_relayer_utils::Result<u64>;
    /// Signs and sends a call to `to` with an explicit nonce.
    async fn submit_transaction(
        &self,
        to: Address,
        calldata: Bytes,
        nonce: u64,
        gas_limit: Option<u64>,
    ) -> oraclex_relayer_utils::Result<TxHash>;
    /// Waits until the transaction is mined.
    ///
    /// `None` means the transaction was dropped from the mempool.
    async fn await_confirmation(
        &self,
        tx_hash: TxHash,
    ) -> oraclex_relayer_utils::Result<Option<TransactionReceipt>>;
}

/// A [`ChainClient`] talking JSON-RPC through `ethers`.
///
/// Every call is bounded by the configured rpc timeout.
#[derive(Debug, Clone)]
pub struct EthersChainClient {
    client: Arc<SignerClient>,
    timeout: Duration,
}

impl EthersChainClient {
    /// Creates a new client sending transactions through `client`.
    pub fn new(client: Arc<SignerClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// The account transactions are sent from.
    pub fn signer_address(&self) -> Address {
        self.client.address()
    }
}

#[async_trait::async_trait]
impl ChainClient for EthersChainClient {
    async fn block_number(&self) -> oraclex_relayer_utils::Result<u64> {
        let provider = self.client.provider();
        let n = with_timeout("eth_blockNumber", self.timeout, async {
            Ok(provider.get_block_number().await?)
        })
        .await?;
        Ok(n.as_u64())
    }

    async fn logs(
        &self,
        address: Address,
        from: u64,
        to: u64,
    ) -> oraclex_relayer_utils::Result<Vec<Log>> {
        let provider = self.client.provider();
        let filter = Filter::new()
            .address(address)
            .from_block(from)
            .to_block(to);
        with_timeout("eth_getLogs", self.timeout, async {
            Ok(provider.get_logs(&filter).await?)
        })
        .await
    }

    async fn account_nonce(
        &self,
        account: Address,
    ) -> oraclex_relayer_utils::Result<u64> {
        let provider = self.client.provider();
        let nonce =
            with_timeout("eth_getTransactionCount", self.timeout, async {
                Ok(provider
                    .get_transaction_count(
                        account,
                        Some(BlockNumber::Latest.into()),
                    )
                    .await?)
            })
            .await?;
        if nonce > U256::from(u64::MAX) {
            return Err(Error::InvalidQuantity {
                field: "nonce",
                value: nonce.to_string(),
            });
        }
        Ok(nonce.as_u64())
    }

    async fn submit_transaction(
        &self,
        to: Address,
        calldata: Bytes,
        nonce: u64,
        gas_limit: Option<u64>,
    ) -> oraclex_relayer_utils::Result<TxHash> {
        let mut tx = TransactionRequest::new()
            .to(to)
            .data(calldata)
            .nonce(nonce);
        if let Some(gas) = gas_limit {
            tx = tx.gas(gas);
        }
        let client = self.client.clone();
        with_timeout("eth_sendRawTransaction", self.timeout, async move {
            let pending = client.send_transaction(tx, None).await?;
            Ok(*pending)
        })
        .await
    }

    async fn await_confirmation(
        &self,
        tx_hash: TxHash,
    ) -> oraclex_relayer_utils::Result<Option<TransactionReceipt>> {
        let provider = self.client.provider();
        with_timeout("eth_getTransactionReceipt", self.timeout, async {
            let receipt = PendingTransaction::new(tx_hash, provider)
                .interval(Duration::from_millis(1000))
                .await?;
            Ok(receipt)
        })
        .await
    }
}

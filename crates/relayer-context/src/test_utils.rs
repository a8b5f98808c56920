//! A scripted, in-memory [`ChainClient`] for tests.

use ethers::types::{
    Address, Bytes, Log, TransactionReceipt, TxHash, H256, U64,
};
use parking_lot::Mutex;

use oraclex_relayer_utils::Error;

use crate::ChainClient;

/// What [`MockChainClient::await_confirmation`] reports for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceiptScript {
    /// Mined with status 1.
    #[default]
    Success,
    /// Mined with status 0.
    Reverted,
    /// Never mined.
    Dropped,
}

/// A transaction recorded by the mock client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Destination of the call.
    pub to: Address,
    /// Call data.
    pub calldata: Bytes,
    /// The explicit nonce it was sent with.
    pub nonce: u64,
    /// Gas limit, if one was set.
    pub gas_limit: Option<u64>,
    /// The hash handed back to the caller.
    pub tx_hash: TxHash,
}

#[derive(Debug, Default)]
struct MockState {
    height: u64,
    logs: Vec<Log>,
    failing_log_fetches: usize,
    log_requests: Vec<(u64, u64)>,
    nonce: u64,
    failing_nonce_fetches: usize,
    failing_submissions: usize,
    submissions: Vec<Submission>,
    receipt: ReceiptScript,
}

/// A scripted chain: block height, logs, account nonce and receipts are set
/// by the test, submissions are recorded.
#[derive(Debug, Default)]
pub struct MockChainClient {
    state: Mutex<MockState>,
}

impl MockChainClient {
    /// Creates an empty chain at height 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current block height.
    pub fn set_height(&self, height: u64) {
        self.state.lock().height = height;
    }

    /// Adds a log to the chain.
    pub fn push_log(&self, log: Log) {
        self.state.lock().logs.push(log);
    }

    /// The next `n` log fetches fail.
    pub fn fail_log_fetches(&self, n: usize) {
        self.state.lock().failing_log_fetches = n;
    }

    /// Every `(from, to)` range logs were requested for, in order.
    pub fn log_requests(&self) -> Vec<(u64, u64)> {
        self.state.lock().log_requests.clone()
    }

    /// Sets the network nonce of every account.
    pub fn set_nonce(&self, nonce: u64) {
        self.state.lock().nonce = nonce;
    }

    /// The next `n` nonce fetches fail.
    pub fn fail_nonce_fetches(&self, n: usize) {
        self.state.lock().failing_nonce_fetches = n;
    }

    /// The next `n` submissions fail.
    pub fn fail_submissions(&self, n: usize) {
        self.state.lock().failing_submissions = n;
    }

    /// Sets what every subsequent confirmation reports.
    pub fn set_receipt(&self, receipt: ReceiptScript) {
        self.state.lock().receipt = receipt;
    }

    /// Every transaction submitted so far.
    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().submissions.clone()
    }
}

/// Builds a log emitted by `address` at `block` with the given topics and data.
pub fn log_at(
    address: Address,
    block: u64,
    topics: Vec<H256>,
    data: Vec<u8>,
) -> Log {
    Log {
        address,
        topics,
        data: data.into(),
        block_number: Some(U64::from(block)),
        ..Default::default()
    }
}

#[async_trait::async_trait]
impl ChainClient for MockChainClient {
    async fn block_number(&self) -> oraclex_relayer_utils::Result<u64> {
        Ok(self.state.lock().height)
    }

    async fn logs(
        &self,
        address: Address,
        from: u64,
        to: u64,
    ) -> oraclex_relayer_utils::Result<Vec<Log>> {
        let mut state = self.state.lock();
        state.log_requests.push((from, to));
        if state.failing_log_fetches > 0 {
            state.failing_log_fetches -= 1;
            return Err(Error::Generic("scripted log fetch failure"));
        }
        Ok(state
            .logs
            .iter()
            .filter(|log| log.address == address)
            .filter(|log| {
                log.block_number
                    .map(|n| (from..=to).contains(&n.as_u64()))
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn account_nonce(
        &self,
        _account: Address,
    ) -> oraclex_relayer_utils::Result<u64> {
        let mut state = self.state.lock();
        if state.failing_nonce_fetches > 0 {
            state.failing_nonce_fetches -= 1;
            return Err(Error::Generic("scripted nonce fetch failure"));
        }
        Ok(state.nonce)
    }

    async fn submit_transaction(
        &self,
        to: Address,
        calldata: Bytes,
        nonce: u64,
        gas_limit: Option<u64>,
    ) -> oraclex_relayer_utils::Result<TxHash> {
        let mut state = self.state.lock();
        if state.failing_submissions > 0 {
            state.failing_submissions -= 1;
            return Err(Error::Generic("scripted submission failure"));
        }
        let tx_hash =
            H256::from_low_u64_be(state.submissions.len() as u64 + 1);
        state.submissions.push(Submission {
            to,
            calldata,
            nonce,
            gas_limit,
            tx_hash,
        });
        Ok(tx_hash)
    }

    async fn await_confirmation(
        &self,
        tx_hash: TxHash,
    ) -> oraclex_relayer_utils::Result<Option<TransactionReceipt>> {
        let status = match self.state.lock().receipt {
            ReceiptScript::Success => 1u64,
            ReceiptScript::Reverted => 0u64,
            ReceiptScript::Dropped => return Ok(None),
        };
        Ok(Some(TransactionReceipt {
            transaction_hash: tx_hash,
            status: Some(U64::from(status)),
            ..Default::default()
        }))
    }
}

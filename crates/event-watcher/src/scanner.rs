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

use ethers::types::Address;
use tokio::time::MissedTickBehavior;

use oraclex_relayer_config::event_watcher::EventsWatcherConfig;
use oraclex_relayer_config::evm::OracleXContractConfig;
use oraclex_relayer_context::{ChainClient, Shutdown};
use oraclex_relayer_store::SubscriptionStore;
use oraclex_relayer_utils::probe;

use crate::decoder;

/// An inclusive block range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    /// First block of the range.
    pub from: u64,
    /// Last block of the range.
    pub to: u64,
}

impl std::fmt::Display for ScanWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.from, self.to)
    }
}

/// Where the scanner is.
///
/// `last_scanned_block` is the first block of the next window. It only moves
/// after the logs of a window were fetched, so a failed window is retried as
/// is on the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanCursor {
    last_scanned_block: u64,
    cold_start: bool,
    start_block: u64,
}

impl ScanCursor {
    /// A cold cursor that starts scanning at `start_block`.
    pub fn new(start_block: u64) -> Self {
        Self {
            last_scanned_block: 0,
            cold_start: true,
            start_block,
        }
    }

    /// The next block to scan.
    pub fn last_scanned_block(&self) -> u64 {
        self.last_scanned_block
    }

    /// `true` until the first window was scanned.
    pub fn is_cold(&self) -> bool {
        self.cold_start
    }

    fn next_start(&self) -> u64 {
        if self.cold_start {
            self.start_block
        } else {
            self.last_scanned_block
        }
    }

    /// Whether the chain reached the next block to scan.
    pub fn should_scan(&self, height: u64) -> bool {
        height >= self.next_start()
    }

    /// The next window of at most `step` blocks, never past `height`.
    pub fn next_window(&self, step: u64, height: u64) -> Option<ScanWindow> {
        if step == 0 || !self.should_scan(height) {
            return None;
        }
        let from = self.next_start();
        let to = from.saturating_add(step - 1).min(height);
        Some(ScanWindow { from, to })
    }

    /// Moves past a scanned window.
    pub fn advance(&mut self, window: ScanWindow) {
        self.cold_start = false;
        self.last_scanned_block = window.to.saturating_add(1);
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanReport {
    /// Number of logs returned for the window.
    pub logs: usize,
    /// Query events added to the registry.
    pub appended: usize,
    /// Registry entries settled by commitment events.
    pub settled: usize,
    /// Logs that were skipped: foreign, unknown or malformed.
    pub skipped: usize,
}

/// Polls the chain for new blocks and feeds the subscription registry.
pub struct BlockScanner<S> {
    client: Arc<dyn ChainClient>,
    store: S,
    contract: Address,
    config: EventsWatcherConfig,
    cursor: ScanCursor,
}

impl<S> BlockScanner<S>
where
    S: SubscriptionStore,
{
    /// Creates a cold scanner for `contract`.
    pub fn new(
        client: Arc<dyn ChainClient>,
        store: S,
        contract: &OracleXContractConfig,
    ) -> Self {
        Self {
            client,
            store,
            contract: contract.address,
            config: contract.events_watcher,
            cursor: ScanCursor::new(contract.deployed_at),
        }
    }

    /// The current cursor.
    pub fn cursor(&self) -> &ScanCursor {
        &self.cursor
    }

    /// Scans the next window, if the chain has reached it.
    ///
    /// Returns `Ok(None)` when there is nothing to scan. A failed height or
    /// log fetch leaves the cursor where it was.
    pub async fn tick(
        &mut self,
    ) -> oraclex_relayer_utils::Result<Option<(ScanWindow, ScanReport)>> {
        let height = self.client.block_number().await?;
        let Some(window) =
            self.cursor.next_window(self.config.max_blocks_per_step, height)
        else {
            tracing::trace!(
                height,
                next = self.cursor.next_start(),
                "nothing to scan"
            );
            return Ok(None);
        };
        let logs = self
            .client
            .logs(self.contract, window.from, window.to)
            .await?;
        // the window is consumed even if some logs fail to decode.
        self.cursor.advance(window);

        let mut report = ScanReport {
            logs: logs.len(),
            ..Default::default()
        };
        for log in logs {
            if log.address != self.contract {
                tracing::debug!(address = ?log.address, "skipping foreign log");
                report.skipped += 1;
                continue;
            }
            let event = match decoder::decode_log(&log) {
                Ok(Some(event)) => event,
                Ok(None) => {
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        block = ?log.block_number,
                        tx_hash = ?log.transaction_hash,
                        "failed to decode log"
                    );
                    report.skipped += 1;
                    continue;
                }
            };
            tracing::debug!(event = event.name(), key = %event.subscription_key(), "decoded");
            if event.is_query() {
                match self.store.append(event) {
                    Ok(_) => report.appended += 1,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to register subscription")
                    }
                }
            } else {
                match self.store.settle(&event.subscription_key()) {
                    Ok(n) => report.settled += n,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to settle subscription")
                    }
                }
            }
        }
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::TRACE,
            kind = %probe::Kind::Sync,
            from = window.from,
            to = window.to,
            logs = report.logs,
            appended = report.appended,
            settled = report.settled,
        );
        Ok(Some((window, report)))
    }

    /// Runs [`Self::tick`] every polling interval until shutdown.
    #[tracing::instrument(
        skip_all,
        fields(address = ?self.contract, tag = "block-scanner"),
    )]
    pub async fn run(
        mut self,
        mut shutdown: Shutdown,
    ) -> oraclex_relayer_utils::Result<()> {
        let mut interval = tokio::time::interval(Duration::from_millis(
            self.config.polling_interval,
        ));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let print_progress_interval =
            Duration::from_millis(self.config.print_progress_interval);
        // saves the last time we printed sync progress.
        let mut instant = std::time::Instant::now();
        let mut last_height = 0u64;
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::DEBUG,
            kind = %probe::Kind::Lifecycle,
            started = true,
            start_block = self.cursor.next_start(),
        );
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.recv() => {
                    tracing::debug!("block scanner is shutting down");
                    return Ok(());
                }
            }
            match self.tick().await {
                Ok(Some((window, _))) => last_height = last_height.max(window.to),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, next = self.cursor.next_start(), "scan failed, retrying the same window");
                }
            }
            if !print_progress_interval.is_zero()
                && instant.elapsed() > print_progress_interval
            {
                let currently_at = self.cursor.last_scanned_block();
                let target_block = match self.client.block_number().await {
                    Ok(height) => height,
                    Err(_) => last_height,
                };
                let progress = if target_block == 0 {
                    100.0
                } else {
                    currently_at as f64 / target_block as f64 * 100.0
                };
                let is_syncing = progress < 99.99;
                tracing::info!(
                    target_block,
                    currently_at,
                    diff = target_block.saturating_sub(currently_at),
                    is_syncing,
                    progress,
                );
                instant = std::time::Instant::now();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::Token;
    use ethers::types::{Log, U256};
    use oraclex_relayer_context::test_utils::{log_at, MockChainClient};
    use oraclex_relayer_store::{InMemoryStore, EntryState};
    use oraclex_relayer_types::AuthMode;

    use crate::abi;

    fn contract() -> Address {
        "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap()
    }

    fn contract_config(step: u64) -> OracleXContractConfig {
        OracleXContractConfig {
            address: contract(),
            deployed_at: 0,
            events_watcher: EventsWatcherConfig {
                max_blocks_per_step: step,
                ..Default::default()
            },
        }
    }

    fn event_log(name: &str, block: u64, args: &[Token]) -> Log {
        let event = abi::event_by_name(name).unwrap();
        let raw = abi::encode_log(event, args);
        log_at(contract(), block, raw.topics, raw.data)
    }

    fn active_query(block: u64, id: u64, mode: u8) -> Log {
        event_log(
            abi::QUERY_ACTIVE_MODE_SUBMITTED,
            block,
            &[
                Token::Uint(U256::from(id)),
                Token::Tuple(vec![
                    Token::Uint(U256::zero()),
                    Token::FixedBytes(vec![mode]),
                    Token::Address(Address::repeat_byte(0xaa)),
                    Token::Bytes(vec![]),
                ]),
            ],
        )
    }

    fn setup(step: u64) -> (Arc<MockChainClient>, InMemoryStore, BlockScanner<InMemoryStore>) {
        let chain = Arc::new(MockChainClient::new());
        let store = InMemoryStore::default();
        let scanner =
            BlockScanner::new(chain.clone(), store.clone(), &contract_config(step));
        (chain, store, scanner)
    }

    #[test]
    fn windows_are_contiguous() {
        let mut cursor = ScanCursor::new(0);
        let mut windows = vec![];
        for _ in 0..3 {
            let w = cursor.next_window(4, 100).unwrap();
            cursor.advance(w);
            windows.push((w.from, w.to));
        }
        assert_eq!(windows, vec![(0, 3), (4, 7), (8, 11)]);
        assert_eq!(cursor.last_scanned_block(), 12);
    }

    #[test]
    fn windows_never_pass_the_chain_head() {
        let mut cursor = ScanCursor::new(10);
        assert!(cursor.should_scan(10));
        assert!(!cursor.should_scan(9));
        let w = cursor.next_window(4, 11).unwrap();
        assert_eq!((w.from, w.to), (10, 11));
        cursor.advance(w);
        assert!(!cursor.is_cold());
        // head did not move, nothing to do.
        assert_eq!(cursor.next_window(4, 11), None);
        let w = cursor.next_window(4, 12).unwrap();
        assert_eq!((w.from, w.to), (12, 12));
        assert_eq!(cursor.next_window(0, 100), None);
    }

    #[tokio::test]
    async fn failed_fetch_retries_the_same_window() {
        let (chain, _, mut scanner) = setup(4);
        chain.set_height(100);
        scanner.tick().await.unwrap();
        scanner.tick().await.unwrap();
        assert_eq!(scanner.cursor().last_scanned_block(), 8);

        chain.fail_log_fetches(1);
        assert!(scanner.tick().await.is_err());
        assert_eq!(scanner.cursor().last_scanned_block(), 8);

        let (window, _) = scanner.tick().await.unwrap().unwrap();
        assert_eq!(window, ScanWindow { from: 8, to: 11 });
        assert_eq!(
            chain.log_requests(),
            vec![(0, 3), (4, 7), (8, 11), (8, 11)]
        );
    }

    #[tokio::test]
    async fn cold_start_begins_at_deployment() {
        let chain = Arc::new(MockChainClient::new());
        let mut config = contract_config(2);
        config.deployed_at = 50;
        let mut scanner =
            BlockScanner::new(chain.clone(), InMemoryStore::default(), &config);
        chain.set_height(40);
        assert_eq!(scanner.tick().await.unwrap(), None);
        chain.set_height(60);
        let (window, _) = scanner.tick().await.unwrap().unwrap();
        assert_eq!(window, ScanWindow { from: 50, to: 51 });
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn a_malformed_log_does_not_poison_the_window() {
        let (chain, store, mut scanner) = setup(4);
        chain.set_height(10);
        chain.push_log(active_query(1, 42, 0x00));
        let bad = abi::event_by_name(abi::QUERY_ACTIVE_MODE_SUBMITTED).unwrap();
        chain.push_log(log_at(contract(), 2, vec![bad.signature()], vec![1, 2, 3]));
        chain.push_log(active_query(3, 43, 0x02));

        let (_, report) = scanner.tick().await.unwrap().unwrap();
        assert_eq!(report.logs, 3);
        assert_eq!(report.appended, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(scanner.cursor().last_scanned_block(), 4);
        assert!(logs_contain("failed to decode log"));

        let entries = store.snapshot().unwrap();
        assert_eq!(entries[0].event().auth_mode(), AuthMode::Signature);
        assert_eq!(entries[1].event().auth_mode(), AuthMode::Proof);
    }

    #[tokio::test]
    async fn commitment_events_settle_entries() {
        let (chain, store, mut scanner) = setup(2);
        chain.set_height(10);
        chain.push_log(active_query(0, 42, 0x00));
        chain.push_log(event_log(
            abi::DATA_COMMITMENT_EXECUTED_ACTIVE,
            2,
            &[Token::Uint(U256::from(42)), Token::FixedBytes(vec![0x00])],
        ));
        scanner.tick().await.unwrap();
        assert_eq!(store.snapshot().unwrap()[0].state(), &EntryState::Pending);
        let (_, report) = scanner.tick().await.unwrap().unwrap();
        assert_eq!(report.settled, 1);
        assert_eq!(
            store.snapshot().unwrap()[0].state(),
            &EntryState::Confirmed { tx_hash: None }
        );
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let (chain, store, scanner) = setup(4);
        chain.set_height(3);
        chain.push_log(active_query(2, 1, 0x00));
        let (tx, _) = tokio::sync::broadcast::channel(1);
        let handle = tokio::spawn(scanner.run(Shutdown::new(tx.subscribe())));
        for _ in 0..50 {
            if !store.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
        assert_eq!(store.len(), 1);
    }
}

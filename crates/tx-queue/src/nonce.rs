use std::sync::Arc;
use std::time::Duration;

use ethers::types::Address;
use parking_lot::Mutex;
use tokio::time::MissedTickBehavior;

use oraclex_relayer_context::{ChainClient, Shutdown};
use oraclex_relayer_utils::probe;

/// The local nonce counter and how far it may run ahead of the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonceState {
    /// The next nonce to hand out.
    pub local: u64,
    /// Maximum distance between the local counter and the network nonce.
    pub drift_threshold: u64,
}

/// Hands out transaction nonces without a network round-trip per transaction.
///
/// The counter runs ahead of the network while transactions are in flight
/// and is pulled back by [`NonceManager::reconcile`] once it drifted more
/// than `drift_threshold` ahead, or on a cold start.
#[derive(Debug, Clone)]
pub struct NonceManager {
    state: Arc<Mutex<NonceState>>,
}

impl NonceManager {
    /// A cold counter at zero.
    pub fn new(drift_threshold: u64) -> Self {
        Self::with_nonce(0, drift_threshold)
    }

    /// A counter starting at `local`.
    pub fn with_nonce(local: u64, drift_threshold: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(NonceState {
                local,
                drift_threshold,
            })),
        }
    }

    /// The next nonce [`Self::allocate`] would return.
    pub fn current(&self) -> u64 {
        self.state.lock().local
    }

    /// Returns the current nonce and moves the counter forward.
    pub fn allocate(&self) -> u64 {
        let mut state = self.state.lock();
        let nonce = state.local;
        state.local = state.local.saturating_add(1);
        nonce
    }

    /// Compares the counter with the network nonce.
    ///
    /// The counter is reset to `network` if it is zero or more than
    /// `drift_threshold` ahead. It is never moved up. Returns `true` if the
    /// counter changed.
    pub fn reconcile(&self, network: u64) -> bool {
        let mut state = self.state.lock();
        let drifted =
            network.saturating_add(state.drift_threshold) < state.local;
        if !(drifted || state.local == 0) || state.local == network {
            return false;
        }
        let previous = state.local;
        state.local = network;
        drop(state);
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::DEBUG,
            kind = %probe::Kind::Nonce,
            previous,
            network,
            drifted,
        );
        tracing::info!(previous, network, "local nonce reset");
        true
    }

    /// Fetches the network nonce of `account` and reconciles against it.
    pub async fn sync(
        &self,
        client: &dyn ChainClient,
        account: Address,
    ) -> oraclex_relayer_utils::Result<bool> {
        let network = client.account_nonce(account).await?;
        Ok(self.reconcile(network))
    }

    /// Runs [`Self::sync`] every `interval` until shutdown.
    ///
    /// Failed fetches are logged and retried on the next tick.
    #[tracing::instrument(skip_all, fields(account = ?account, tag = "nonce"))]
    pub async fn run_reconcile(
        self,
        client: Arc<dyn ChainClient>,
        account: Address,
        interval: Duration,
        mut shutdown: Shutdown,
    ) -> oraclex_relayer_utils::Result<()> {
        let mut interval = tokio::time::interval(interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.recv() => {
                    tracing::debug!("nonce reconciliation is shutting down");
                    return Ok(());
                }
            }
            if let Err(e) = self.sync(client.as_ref(), account).await {
                tracing::warn!(error = %e, "failed to fetch the network nonce");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oraclex_relayer_context::test_utils::MockChainClient;
    use std::collections::HashSet;

    #[test]
    fn allocations_are_sequential() {
        let nonces = NonceManager::with_nonce(5, 20);
        assert_eq!(nonces.allocate(), 5);
        assert_eq!(nonces.allocate(), 6);
        assert_eq!(nonces.current(), 7);
    }

    #[test]
    fn concurrent_allocations_never_repeat_or_skip() {
        let nonces = NonceManager::with_nonce(100, 20);
        let threads = 8;
        let per_thread = 250;
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let nonces = nonces.clone();
                std::thread::spawn(move || {
                    (0..per_thread).map(|_| nonces.allocate()).collect::<Vec<_>>()
                })
            })
            .collect();
        let mut all = vec![];
        for h in handles {
            all.extend(h.join().unwrap());
        }
        let unique: HashSet<_> = all.iter().copied().collect();
        assert_eq!(unique.len(), threads * per_thread);
        all.sort_unstable();
        let expected: Vec<u64> = (100..100 + (threads * per_thread) as u64).collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn cold_counter_takes_the_network_value() {
        let nonces = NonceManager::new(20);
        assert!(nonces.reconcile(7));
        assert_eq!(nonces.current(), 7);
    }

    #[test]
    fn drifted_counter_is_pulled_back() {
        let nonces = NonceManager::with_nonce(50, 20);
        assert!(nonces.reconcile(10));
        assert_eq!(nonces.current(), 10);
    }

    #[test]
    fn counter_within_threshold_is_kept() {
        let nonces = NonceManager::with_nonce(15, 20);
        assert!(!nonces.reconcile(10));
        assert_eq!(nonces.current(), 15);
        // exactly at the threshold is not a drift.
        let nonces = NonceManager::with_nonce(30, 20);
        assert!(!nonces.reconcile(10));
        assert_eq!(nonces.current(), 30);
    }

    #[test]
    fn counter_is_never_moved_up() {
        let nonces = NonceManager::with_nonce(3, 20);
        assert!(!nonces.reconcile(9));
        assert_eq!(nonces.current(), 3);
    }

    #[tokio::test]
    async fn sync_uses_the_network_nonce() {
        let chain = MockChainClient::new();
        chain.set_nonce(12);
        let nonces = NonceManager::new(20);
        assert!(nonces.sync(&chain, Address::zero()).await.unwrap());
        assert_eq!(nonces.allocate(), 12);
        chain.fail_nonce_fetches(1);
        assert!(nonces.sync(&chain, Address::zero()).await.is_err());
        assert_eq!(nonces.current(), 13);
    }

    #[tokio::test]
    async fn reconcile_task_stops_on_shutdown() {
        let chain = Arc::new(MockChainClient::new());
        chain.set_nonce(4);
        let nonces = NonceManager::new(20);
        let (tx, _) = tokio::sync::broadcast::channel(1);
        let handle = tokio::spawn(nonces.clone().run_reconcile(
            chain.clone(),
            Address::zero(),
            Duration::from_millis(5),
            Shutdown::new(tx.subscribe()),
        ));
        for _ in 0..100 {
            if nonces.current() == 4 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
        assert_eq!(nonces.current(), 4);
    }
}

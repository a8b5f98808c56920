use ethers::types::TxHash;
use oraclex_relayer_types::NormalizedEvent;
use serde::{Deserialize, Serialize};

/// Position of an entry in the registry.
pub type EntryId = u64;

/// A registry entry that wraps the observed query event and maintains its
/// commitment state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionEntry {
    id: EntryId,
    /// The query event as it was decoded.
    event: NormalizedEvent,
    /// How many commitment attempts were started for this entry.
    attempts: u32,
    /// The current commitment state.
    state: EntryState,
}

impl SubscriptionEntry {
    /// Creates a new pending entry.
    pub fn new(id: EntryId, event: NormalizedEvent) -> Self {
        Self {
            id,
            event,
            attempts: 0,
            state: EntryState::default(),
        }
    }

    /// The id of this entry.
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// The query event of this entry.
    pub fn event(&self) -> &NormalizedEvent {
        &self.event
    }

    /// Number of attempts started so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the state of the entry.
    pub fn state(&self) -> &EntryState {
        &self.state
    }

    /// Moves the entry to `state`.
    ///
    /// A confirmed entry stays confirmed; returns `false` if the move was
    /// refused.
    pub(crate) fn set_state(&mut self, state: EntryState) -> bool {
        if matches!(self.state, EntryState::Confirmed { .. }) {
            return false;
        }
        self.state = state;
        true
    }

    /// Claims the entry for a new attempt if it is still eligible.
    ///
    /// The entry is `InFlight` until the attempt records its outcome.
    pub(crate) fn begin_attempt(&mut self, max_attempts: u32) -> Option<u32> {
        if !self.is_eligible(max_attempts) {
            return None;
        }
        self.attempts = self.attempts.saturating_add(1);
        self.state = EntryState::InFlight;
        Some(self.attempts)
    }

    /// `Pending` entries are always eligible; `Failed` entries only while
    /// they are retryable and have attempts left.
    pub fn is_eligible(&self, max_attempts: u32) -> bool {
        match &self.state {
            EntryState::Pending => self.attempts < max_attempts,
            EntryState::Failed { retryable, .. } => {
                *retryable && self.attempts < max_attempts
            }
            EntryState::InFlight
            | EntryState::Submitted { .. }
            | EntryState::Confirmed { .. } => false,
        }
    }
}

/// The commitment state of a subscription.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum EntryState {
    /// Waiting for a commitment task.
    #[default]
    Pending,
    /// A commitment task is building or sending a commitment.
    InFlight,
    /// A commitment transaction was sent and not yet settled.
    Submitted {
        /// Hash of the commitment transaction.
        tx_hash: TxHash,
        /// Nonce the transaction was sent with.
        nonce: u64,
    },
    /// The commitment landed on chain.
    Confirmed {
        /// Hash of the commitment transaction, if this relayer sent it.
        tx_hash: Option<TxHash>,
    },
    /// The last attempt failed.
    Failed {
        /// The error message.
        reason: String,
        /// Whether another attempt could succeed.
        retryable: bool,
    },
}

impl EntryState {
    /// Returns true if the entry reached a final state.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            EntryState::Confirmed { .. }
                | EntryState::Failed {
                    retryable: false,
                    ..
                }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oraclex_relayer_types::{ActiveModeQuery, AuthMode};

    fn entry() -> SubscriptionEntry {
        SubscriptionEntry::new(
            0,
            NormalizedEvent::ActiveModeQuery(ActiveModeQuery {
                subscription_id: "42".into(),
                auth_mode: AuthMode::Signature,
                manager_address: "0x00000000000000000000000000000000000000aa"
                    .into(),
                extra_params: "0x".into(),
            }),
        )
    }

    #[test]
    fn eligibility_follows_the_state() {
        let rpc_down = || EntryState::Failed {
            reason: "rpc down".into(),
            retryable: true,
        };
        let mut e = entry();
        assert!(e.is_eligible(3));
        assert_eq!(e.begin_attempt(3), Some(1));
        assert!(!e.is_eligible(3));
        assert_eq!(e.begin_attempt(3), None);
        e.set_state(rpc_down());
        assert!(e.is_eligible(3));
        assert_eq!(e.begin_attempt(3), Some(2));
        e.set_state(rpc_down());
        assert_eq!(e.begin_attempt(3), Some(3));
        e.set_state(rpc_down());
        assert!(!e.is_eligible(3));
        assert_eq!(e.begin_attempt(3), None);
        assert_eq!(e.attempts(), 3);

        let mut e = entry();
        e.set_state(EntryState::Failed {
            reason: "oversized".into(),
            retryable: false,
        });
        assert!(!e.is_eligible(3));
        assert!(e.state().is_final());

        let mut e = entry();
        e.set_state(EntryState::Submitted {
            tx_hash: TxHash::zero(),
            nonce: 1,
        });
        assert!(!e.is_eligible(3));
        assert!(!e.state().is_final());
    }

    #[test]
    fn confirmed_entries_stay_confirmed() {
        let mut e = entry();
        assert_eq!(e.begin_attempt(3), Some(1));
        assert!(e.set_state(EntryState::Confirmed { tx_hash: None }));
        assert!(!e.set_state(EntryState::Submitted {
            tx_hash: TxHash::zero(),
            nonce: 4,
        }));
        assert!(!e.set_state(EntryState::Pending));
        assert_eq!(e.state(), &EntryState::Confirmed { tx_hash: None });
        assert_eq!(e.begin_attempt(3), None);
    }

    #[test]
    fn state_is_tagged_when_serialized() {
        let v = serde_json::to_value(EntryState::Failed {
            reason: "x".into(),
            retryable: true,
        })
        .unwrap();
        assert_eq!(v["status"], "failed");
        assert_eq!(v["retryable"], true);
    }
}

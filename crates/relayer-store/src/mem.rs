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

use parking_lot::RwLock;

use oraclex_relayer_types::{NormalizedEvent, SubscriptionKey};
use oraclex_relayer_utils::probe;

use super::{EntryId, EntryState, SubscriptionEntry, SubscriptionStore};

/// InMemoryStore keeps the subscription registry in memory.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<RwLock<Vec<SubscriptionEntry>>>,
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("entries", &self.entries.read().len())
            .finish()
    }
}

impl InMemoryStore {
    /// Number of entries in the registry.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing was appended yet.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn update<F, R>(&self, id: EntryId, f: F) -> Option<R>
    where
        F: FnOnce(&mut SubscriptionEntry) -> R,
    {
        let mut guard = self.entries.write();
        // ids are indices, entries are never removed.
        guard.get_mut(id as usize).map(f)
    }
}

impl SubscriptionStore for InMemoryStore {
    #[tracing::instrument(skip_all, fields(event = event.name()))]
    fn append(&self, event: NormalizedEvent) -> crate::Result<EntryId> {
        if !event.is_query() {
            return Err(oraclex_relayer_utils::Error::Generic(
                "only query events can be registered",
            ));
        }
        let mut guard = self.entries.write();
        let id = guard.len() as EntryId;
        let key = event.subscription_key();
        let auth_mode = event.auth_mode();
        guard.push(SubscriptionEntry::new(id, event));
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::DEBUG,
            kind = %probe::Kind::Registry,
            %key,
            %auth_mode,
            id,
            "appended"
        );
        Ok(id)
    }

    fn snapshot(&self) -> crate::Result<Vec<SubscriptionEntry>> {
        Ok(self.entries.read().clone())
    }

    fn eligible(
        &self,
        max_attempts: u32,
    ) -> crate::Result<Vec<SubscriptionEntry>> {
        let guard = self.entries.read();
        Ok(guard
            .iter()
            .filter(|e| e.is_eligible(max_attempts))
            .cloned()
            .collect())
    }

    fn begin_attempt(
        &self,
        id: EntryId,
        max_attempts: u32,
    ) -> crate::Result<Option<u32>> {
        Ok(self
            .update(id, |e| e.begin_attempt(max_attempts))
            .flatten())
    }

    #[tracing::instrument(skip(self))]
    fn set_state(&self, id: EntryId, state: EntryState) -> crate::Result<bool> {
        let updated = self
            .update(id, |e| e.set_state(state.clone()))
            .unwrap_or(false);
        if updated {
            tracing::event!(
                target: probe::TARGET,
                tracing::Level::DEBUG,
                kind = %probe::Kind::Registry,
                id,
                state = ?state
            );
        } else {
            tracing::debug!(id, state = ?state, "state change refused");
        }
        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    fn settle(&self, key: &SubscriptionKey) -> crate::Result<usize> {
        let mut guard = self.entries.write();
        let mut settled = 0;
        for entry in guard
            .iter_mut()
            .filter(|e| &e.event().subscription_key() == key)
        {
            let tx_hash = match entry.state() {
                EntryState::Confirmed { .. } => continue,
                EntryState::Submitted { tx_hash, .. } => Some(*tx_hash),
                EntryState::Pending
                | EntryState::InFlight
                | EntryState::Failed { .. } => None,
            };
            if entry.set_state(EntryState::Confirmed { tx_hash }) {
                settled += 1;
            }
        }
        if settled > 0 {
            tracing::event!(
                target: probe::TARGET,
                tracing::Level::DEBUG,
                kind = %probe::Kind::Registry,
                %key,
                settled,
                "settled"
            );
        }
        Ok(settled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::TxHash;
    use oraclex_relayer_types::{
        ActiveModeCommitment, ActiveModeQuery, AuthMode, PassiveModeQuery,
    };

    fn active(id: &str, auth_mode: AuthMode) -> NormalizedEvent {
        NormalizedEvent::ActiveModeQuery(ActiveModeQuery {
            subscription_id: id.into(),
            auth_mode,
            manager_address: "0x00000000000000000000000000000000000000aa"
                .into(),
            extra_params: "0x".into(),
        })
    }

    fn passive(request_id: &str) -> NormalizedEvent {
        NormalizedEvent::PassiveModeQuery(PassiveModeQuery {
            request_id: request_id.into(),
            nonce: "1".into(),
            subscription_id: "9".into(),
            auth_mode: AuthMode::Proof,
            callback_address: "0x00000000000000000000000000000000000000bb"
                .into(),
            manager_address: "0x00000000000000000000000000000000000000aa"
                .into(),
            callback_gas_limit: "100000".into(),
            extra_params: "0x".into(),
        })
    }

    #[test]
    fn appends_keep_their_order() {
        let store = InMemoryStore::default();
        assert_eq!(store.append(active("1", AuthMode::Signature)).unwrap(), 0);
        assert_eq!(store.append(passive("7")).unwrap(), 1);
        assert_eq!(store.append(active("2", AuthMode::Proof)).unwrap(), 2);
        let ids: Vec<_> =
            store.snapshot().unwrap().iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn commitment_events_are_rejected() {
        let store = InMemoryStore::default();
        let event = NormalizedEvent::ActiveModeCommitment(ActiveModeCommitment {
            sub_id: "1".into(),
            auth_mode: AuthMode::Signature,
        });
        assert!(store.append(event).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn snapshot_is_not_affected_by_later_appends() {
        let store = InMemoryStore::default();
        store.append(active("1", AuthMode::Signature)).unwrap();
        let snapshot = store.snapshot().unwrap();
        store.append(active("2", AuthMode::Signature)).unwrap();
        store
            .set_state(0, EntryState::Confirmed { tx_hash: None })
            .unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].state(), &EntryState::Pending);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn eligible_skips_in_flight_and_exhausted_entries() {
        let store = InMemoryStore::default();
        for id in ["1", "2", "3", "4"] {
            store.append(active(id, AuthMode::Signature)).unwrap();
        }
        store.begin_attempt(0, 3).unwrap();
        store
            .set_state(
                0,
                EntryState::Submitted {
                    tx_hash: TxHash::repeat_byte(1),
                    nonce: 0,
                },
            )
            .unwrap();
        store.begin_attempt(1, 3).unwrap();
        store
            .set_state(
                1,
                EntryState::Failed {
                    reason: "timeout".into(),
                    retryable: true,
                },
            )
            .unwrap();
        store.begin_attempt(2, 3).unwrap();
        store
            .set_state(
                2,
                EntryState::Failed {
                    reason: "overflow".into(),
                    retryable: false,
                },
            )
            .unwrap();
        let ids: Vec<_> =
            store.eligible(3).unwrap().iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![1, 3]);
        // entry 1 runs out of attempts
        let retry = || EntryState::Failed {
            reason: "timeout".into(),
            retryable: true,
        };
        assert_eq!(store.begin_attempt(1, 3).unwrap(), Some(2));
        store.set_state(1, retry()).unwrap();
        assert_eq!(store.begin_attempt(1, 3).unwrap(), Some(3));
        store.set_state(1, retry()).unwrap();
        assert_eq!(store.begin_attempt(1, 3).unwrap(), None);
        let ids: Vec<_> =
            store.eligible(3).unwrap().iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let store = InMemoryStore::default();
        assert_eq!(store.begin_attempt(5, 3).unwrap(), None);
        assert!(!store.set_state(5, EntryState::Pending).unwrap());
    }

    #[test]
    fn settle_confirms_matching_entries_only() {
        let store = InMemoryStore::default();
        store.append(active("42", AuthMode::Signature)).unwrap();
        store.append(passive("42")).unwrap();
        store.append(active("43", AuthMode::Signature)).unwrap();
        let hash = TxHash::repeat_byte(7);
        store
            .set_state(0, EntryState::Submitted { tx_hash: hash, nonce: 3 })
            .unwrap();

        let key = SubscriptionKey::Active("42".into());
        assert_eq!(store.settle(&key).unwrap(), 1);
        // settling twice changes nothing.
        assert_eq!(store.settle(&key).unwrap(), 0);

        let snapshot = store.snapshot().unwrap();
        assert_eq!(
            snapshot[0].state(),
            &EntryState::Confirmed {
                tx_hash: Some(hash)
            }
        );
        assert_eq!(snapshot[1].state(), &EntryState::Pending);
        assert_eq!(snapshot[2].state(), &EntryState::Pending);

        assert_eq!(
            store
                .settle(&SubscriptionKey::Passive("42".into()))
                .unwrap(),
            1
        );
    }

    #[test]
    fn settled_entries_are_not_reopened() {
        let store = InMemoryStore::default();
        store.append(active("42", AuthMode::Signature)).unwrap();
        store.append(active("43", AuthMode::Signature)).unwrap();
        let key = SubscriptionKey::Active("42".into());

        // settled while an attempt is running
        assert_eq!(store.begin_attempt(0, 3).unwrap(), Some(1));
        assert!(!store.eligible(3).unwrap().iter().any(|e| e.id() == 0));
        assert_eq!(store.settle(&key).unwrap(), 1);
        let late = EntryState::Submitted {
            tx_hash: TxHash::repeat_byte(2),
            nonce: 9,
        };
        assert!(!store.set_state(0, late).unwrap());

        // settled before an attempt could start
        store.settle(&SubscriptionKey::Active("43".into())).unwrap();
        assert_eq!(store.begin_attempt(1, 3).unwrap(), None);

        let snapshot = store.snapshot().unwrap();
        for entry in &snapshot {
            assert_eq!(entry.state(), &EntryState::Confirmed { tx_hash: None });
        }
        assert_eq!(snapshot[1].attempts(), 0);
    }

    #[test]
    fn concurrent_appends_are_all_kept() {
        let store = InMemoryStore::default();
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        store
                            .append(active(
                                &format!("{t}-{i}"),
                                AuthMode::Signature,
                            ))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.len(), 400);
        assert!(snapshot.iter().enumerate().all(|(i, e)| e.id() == i as u64));
    }
}

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
//! # OracleX Relayer Store 🕸️
//!
//! The subscription registry: an ordered, append-only list of query
//! subscriptions, each carrying its own commitment state.

use oraclex_relayer_types::{NormalizedEvent, SubscriptionKey};

/// A module for the subscription entries and their state machine.
pub mod entry;
/// A module for managing in-memory storage of the relayer.
pub mod mem;

pub use entry::{EntryId, EntryState, SubscriptionEntry};
pub use mem::InMemoryStore;

/// A type alias for the result used across the store.
pub type Result<T> = oraclex_relayer_utils::Result<T>;

/// A Subscription Store keeps every query subscription the scanner picked up,
/// in the order they were observed.
///
/// There is one writer (the block scanner) and many readers (the commitment
/// tasks); readers never observe a half-written entry.
pub trait SubscriptionStore: Clone + Send + Sync {
    /// Appends a query event and returns the id of the new entry.
    ///
    /// Commitment events are not subscriptions and are rejected.
    fn append(&self, event: NormalizedEvent) -> crate::Result<EntryId>;
    /// Returns a copy of every entry, in append order.
    fn snapshot(&self) -> crate::Result<Vec<SubscriptionEntry>>;
    /// Returns a copy of the entries that a commitment task should work on.
    ///
    /// See [`SubscriptionEntry::is_eligible`].
    fn eligible(
        &self,
        max_attempts: u32,
    ) -> crate::Result<Vec<SubscriptionEntry>>;
    /// Claims the given entry for a new commitment attempt.
    ///
    /// Eligibility is checked again under the write lock and the entry is
    /// marked in flight. Returns the new attempt count, or `None` if the
    /// entry does not exist or is no longer eligible.
    fn begin_attempt(
        &self,
        id: EntryId,
        max_attempts: u32,
    ) -> crate::Result<Option<u32>>;
    /// Moves the given entry to a new state.
    ///
    /// Confirmed entries never leave that state. Returns `false` if no such
    /// entry exists or the move was refused.
    fn set_state(&self, id: EntryId, state: EntryState) -> crate::Result<bool>;
    /// Marks every unsettled entry for this subscription as confirmed.
    ///
    /// Returns the number of entries that changed.
    fn settle(&self, key: &SubscriptionKey) -> crate::Result<usize>;
}

impl<S: SubscriptionStore> SubscriptionStore for std::sync::Arc<S> {
    fn append(&self, event: NormalizedEvent) -> crate::Result<EntryId> {
        S::append(self, event)
    }

    fn snapshot(&self) -> crate::Result<Vec<SubscriptionEntry>> {
        S::snapshot(self)
    }

    fn eligible(
        &self,
        max_attempts: u32,
    ) -> crate::Result<Vec<SubscriptionEntry>> {
        S::eligible(self, max_attempts)
    }

    fn begin_attempt(
        &self,
        id: EntryId,
        max_attempts: u32,
    ) -> crate::Result<Option<u32>> {
        S::begin_attempt(self, id, max_attempts)
    }

    fn set_state(&self, id: EntryId, state: EntryState) -> crate::Result<bool> {
        S::set_state(self, id, state)
    }

    fn settle(&self, key: &SubscriptionKey) -> crate::Result<usize> {
        S::settle(self, key)
    }
}

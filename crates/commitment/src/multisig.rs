//! Multisig commitments.
//!
//! Subscriptions asking for several oracle signatures are recognized but not
//! answered; their entries stay pending and untouched.

use oraclex_relayer_store::SubscriptionEntry;

/// Handles a multisig subscription. Does nothing.
pub fn handle(entry: &SubscriptionEntry) {
    tracing::trace!(
        entry = entry.id(),
        subscription = %entry.event().subscription_key(),
        "multisig commitments are not supported, skipping"
    );
}

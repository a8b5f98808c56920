#![warn(missing_docs)]
//! # OracleX Relayer Types 🕸️
//!
//! Value types shared across the relayer: configuration wrappers that can be
//! read from the environment, and the normalized contract events the scanner
//! produces.

/// Subscription authentication modes.
pub mod auth_mode;
/// Normalized contract events.
pub mod event;
/// Seed phrase wrapper.
pub mod mnemonic;
/// RPC endpoint wrapper.
pub mod rpc_url;

pub use auth_mode::AuthMode;
pub use event::{
    ActiveModeCommitment, ActiveModeQuery, NormalizedEvent,
    PassiveModeCommitment, PassiveModeQuery, SubscriptionKey,
};

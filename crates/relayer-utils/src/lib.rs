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

//! # OracleX Relayer Utils 🕸️
//!
//! Shared error type, probes and small helpers used by every crate of the
//! relayer workspace.

use std::time::Duration;

use ethers::middleware::signer::SignerMiddlewareError;
use ethers::providers::{Http, Provider, RetryClient};
use ethers::signers::LocalWallet;

pub mod clickable_link;
/// A module used for debugging relayer lifecycle, sync state, or other relayer state.
pub mod probe;
/// Retry functionality
pub mod retry;
/// Deadline wrapper for network calls.
pub mod timeout;

/// The signer middleware the relayer submits transactions through.
pub type SignerClient =
    ethers::middleware::SignerMiddleware<EthersClient, LocalWallet>;
/// The provider the relayer reads chain state through.
pub type EthersClient = Provider<RetryClient<Http>>;

/// An enum of all possible errors that could be encountered during the execution of the
/// OracleX Relayer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An Io error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// JSON Error occurred.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Config loading error.
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    /// Error while iterating over a glob pattern.
    #[error(transparent)]
    GlobPattern(#[from] glob::PatternError),
    /// Error from Glob Iterator.
    #[error(transparent)]
    Glob(#[from] glob::GlobError),
    /// Error while parsing a URL.
    #[error(transparent)]
    Url(#[from] url::ParseError),
    /// Invalid hex string.
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
    /// Error in Http Provider (ethers client).
    #[error(transparent)]
    EthersProvider(#[from] ethers::providers::ProviderError),
    /// Error while sending a transaction through the signer middleware.
    #[error(transparent)]
    EthersSigner(#[from] SignerMiddlewareError<EthersClient, LocalWallet>),
    /// Ether wallet errors.
    #[error(transparent)]
    EtherWalletError(#[from] ethers::signers::WalletError),
    /// ABI encoding or decoding error.
    #[error(transparent)]
    Abi(#[from] ethers::abi::Error),
    /// Error while parsing the config files.
    #[error("Config parse error: {}", _0)]
    ParseConfig(#[from] serde_path_to_error::Error<config::ConfigError>),
    /// Generic error.
    #[error("{}", _0)]
    Generic(&'static str),
    /// Missing Secrets in the config, the signer mnemonic.
    #[error("Missing required signer mnemonic in the config")]
    MissingSecrets,
    /// A network call did not finish in time.
    #[error("{call} timed out after {}ms", after.as_millis())]
    Timeout {
        /// The name of the call that timed out.
        call: &'static str,
        /// The deadline that was exceeded.
        after: Duration,
    },
    /// A value could not be parsed as a decimal or hex quantity.
    #[error("Invalid quantity for {field}: {value:?}")]
    InvalidQuantity {
        /// The field being parsed.
        field: &'static str,
        /// The offending input.
        value: String,
    },
    /// A value does not fit into its fixed-width slot.
    #[error("{field} needs {len} bytes but the slot is {width} bytes wide")]
    FieldOverflow {
        /// The field being encoded.
        field: &'static str,
        /// The width of the slot.
        width: usize,
        /// The actual length of the value.
        len: usize,
    },
    /// A log matched a known event but its arguments have the wrong shape.
    #[error("Malformed {event} event: {reason}")]
    MalformedEvent {
        /// The event name.
        event: &'static str,
        /// What was wrong with it.
        reason: String,
    },
    /// The proof path needs callback metadata the event does not carry.
    #[error("Subscription {subscription_id} carries no callback metadata for a proof commitment")]
    MissingCallbackMetadata {
        /// The subscription that was routed to the proof path.
        subscription_id: String,
    },
    /// The subscription cannot be serviced by any commitment path.
    #[error("No commitment path for {}", _0)]
    UnsupportedRoute(String),
}

/// A type alias for the result for the OracleX relayer, that uses the `Error` enum.
pub type Result<T> = std::result::Result<T, Error>;

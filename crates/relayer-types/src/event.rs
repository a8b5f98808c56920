use serde::{Deserialize, Serialize};

use crate::AuthMode;

// Identifiers and integers are kept in their canonical string forms
// (decimal for uint256, lower-cased 0x-hex for addresses and bytes) so
// 256-bit values survive untouched.

/// `QueryActiveModeSubmitted`: a recurring subscription asking the oracle to
/// push data commitments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveModeQuery {
    /// The subscription id.
    pub subscription_id: String,
    /// Requested authentication mode.
    pub auth_mode: AuthMode,
    /// The subscription manager, lower-cased.
    pub manager_address: String,
    /// Opaque extra parameters, 0x-hex.
    pub extra_params: String,
}

/// `QueryPassiveModeSubmitted`: a one-off request answered through a callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassiveModeQuery {
    /// The request id.
    pub request_id: String,
    /// The request nonce.
    pub nonce: String,
    /// The subscription the request belongs to.
    pub subscription_id: String,
    /// Requested authentication mode.
    pub auth_mode: AuthMode,
    /// Contract receiving the callback, lower-cased.
    pub callback_address: String,
    /// The subscription manager, lower-cased.
    pub manager_address: String,
    /// Gas forwarded to the callback.
    pub callback_gas_limit: String,
    /// Opaque extra parameters, 0x-hex.
    pub extra_params: String,
}

/// `DataCommitmentExecutedPassive`: a passive request was answered on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassiveModeCommitment {
    /// The answered request.
    pub request_id: String,
    /// The task that produced the answer.
    pub task_id: String,
    /// The callback that was invoked, lower-cased.
    pub callback_address: String,
    /// Authentication mode used.
    pub auth_mode: AuthMode,
}

/// `DataCommitmentExecutedActive`: an active subscription was served on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveModeCommitment {
    /// The served subscription.
    pub sub_id: String,
    /// Authentication mode used.
    pub auth_mode: AuthMode,
}

/// One decoded contract event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "flag", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NormalizedEvent {
    /// See [`ActiveModeQuery`].
    ActiveModeQuery(ActiveModeQuery),
    /// See [`PassiveModeQuery`].
    PassiveModeQuery(PassiveModeQuery),
    /// See [`PassiveModeCommitment`].
    PassiveModeCommitment(PassiveModeCommitment),
    /// See [`ActiveModeCommitment`].
    ActiveModeCommitment(ActiveModeCommitment),
}

/// Identifies the subscription an event is about, so a commitment event can
/// be matched against the query that asked for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionKey {
    /// An active subscription, by subscription id.
    Active(String),
    /// A passive request, by request id.
    Passive(String),
}

impl std::fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active(id) => write!(f, "active:{id}"),
            Self::Passive(id) => write!(f, "passive:{id}"),
        }
    }
}

impl NormalizedEvent {
    /// The contract event name this value was decoded from.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ActiveModeQuery(_) => "QueryActiveModeSubmitted",
            Self::PassiveModeQuery(_) => "QueryPassiveModeSubmitted",
            Self::PassiveModeCommitment(_) => "DataCommitmentExecutedPassive",
            Self::ActiveModeCommitment(_) => "DataCommitmentExecutedActive",
        }
    }

    /// The auth mode carried by the event.
    pub fn auth_mode(&self) -> AuthMode {
        match self {
            Self::ActiveModeQuery(e) => e.auth_mode,
            Self::PassiveModeQuery(e) => e.auth_mode,
            Self::PassiveModeCommitment(e) => e.auth_mode,
            Self::ActiveModeCommitment(e) => e.auth_mode,
        }
    }

    /// Whether the event asks the oracle for a commitment.
    pub fn is_query(&self) -> bool {
        matches!(self, Self::ActiveModeQuery(_) | Self::PassiveModeQuery(_))
    }

    /// The subscription this event opens (queries) or settles (commitments).
    pub fn subscription_key(&self) -> SubscriptionKey {
        match self {
            Self::ActiveModeQuery(e) => {
                SubscriptionKey::Active(e.subscription_id.clone())
            }
            Self::ActiveModeCommitment(e) => {
                SubscriptionKey::Active(e.sub_id.clone())
            }
            Self::PassiveModeQuery(e) => {
                SubscriptionKey::Passive(e.request_id.clone())
            }
            Self::PassiveModeCommitment(e) => {
                SubscriptionKey::Passive(e.request_id.clone())
            }
        }
    }
}

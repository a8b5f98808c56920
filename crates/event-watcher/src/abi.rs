//! The event schema of the OracleX contract.
//!
//! None of the event parameters are indexed, so every argument is ABI
//! encoded in the log data and `topic0` identifies the event.

use ethers::abi::{Event, EventParam, ParamType, RawLog, Token};
use ethers::types::{Log, H256};
use once_cell::sync::Lazy;

/// `QueryActiveModeSubmitted(uint256,(uint8,bytes1,address,bytes))`
pub const QUERY_ACTIVE_MODE_SUBMITTED: &str = "QueryActiveModeSubmitted";
/// `QueryPassiveModeSubmitted(uint256,uint256,(uint256,bytes1,address,address,uint64,bytes))`
pub const QUERY_PASSIVE_MODE_SUBMITTED: &str = "QueryPassiveModeSubmitted";
/// `DataCommitmentExecutedPassive(uint256,uint256,address,bytes1)`
pub const DATA_COMMITMENT_EXECUTED_PASSIVE: &str =
    "DataCommitmentExecutedPassive";
/// `DataCommitmentExecutedActive(uint256,bytes1)`
pub const DATA_COMMITMENT_EXECUTED_ACTIVE: &str =
    "DataCommitmentExecutedActive";

fn event(name: &str, inputs: Vec<(&str, ParamType)>) -> Event {
    Event {
        name: name.to_string(),
        inputs: inputs
            .into_iter()
            .map(|(name, kind)| EventParam {
                name: name.to_string(),
                kind,
                indexed: false,
            })
            .collect(),
        anonymous: false,
    }
}

static EVENTS: Lazy<Vec<Event>> = Lazy::new(|| {
    vec![
        event(
            QUERY_ACTIVE_MODE_SUBMITTED,
            vec![
                ("subscriptionId", ParamType::Uint(256)),
                (
                    "query",
                    ParamType::Tuple(vec![
                        ParamType::Uint(8),
                        ParamType::FixedBytes(1),
                        ParamType::Address,
                        ParamType::Bytes,
                    ]),
                ),
            ],
        ),
        event(
            QUERY_PASSIVE_MODE_SUBMITTED,
            vec![
                ("requestId", ParamType::Uint(256)),
                ("nonce", ParamType::Uint(256)),
                (
                    "query",
                    ParamType::Tuple(vec![
                        ParamType::Uint(256),
                        ParamType::FixedBytes(1),
                        ParamType::Address,
                        ParamType::Address,
                        ParamType::Uint(64),
                        ParamType::Bytes,
                    ]),
                ),
            ],
        ),
        event(
            DATA_COMMITMENT_EXECUTED_PASSIVE,
            vec![
                ("requestId", ParamType::Uint(256)),
                ("taskId", ParamType::Uint(256)),
                ("callbackAddress", ParamType::Address),
                ("authMode", ParamType::FixedBytes(1)),
            ],
        ),
        event(
            DATA_COMMITMENT_EXECUTED_ACTIVE,
            vec![
                ("subId", ParamType::Uint(256)),
                ("authMode", ParamType::FixedBytes(1)),
            ],
        ),
    ]
});

/// Every event the relayer understands.
pub fn events() -> &'static [Event] {
    &EVENTS
}

/// Looks an event up by name.
pub fn event_by_name(name: &str) -> Option<&'static Event> {
    EVENTS.iter().find(|e| e.name == name)
}

/// Looks an event up by its `topic0`.
pub fn event_by_topic(topic: &H256) -> Option<&'static Event> {
    EVENTS.iter().find(|e| &e.signature() == topic)
}

/// Splits a log into its event and positional arguments.
///
/// Returns `Ok(None)` for logs that are not one of [`events`].
pub fn parse_log(
    log: &Log,
) -> oraclex_relayer_utils::Result<Option<(&'static Event, Vec<Token>)>> {
    let Some(event) = log.topics.first().and_then(event_by_topic) else {
        return Ok(None);
    };
    let raw = RawLog {
        topics: log.topics.clone(),
        data: log.data.to_vec(),
    };
    let parsed = event.parse_log(raw)?;
    Ok(Some((
        event,
        parsed.params.into_iter().map(|p| p.value).collect(),
    )))
}

/// Encodes the arguments of `event` as a raw log, the way the contract emits it.
pub fn encode_log(event: &Event, args: &[Token]) -> RawLog {
    RawLog {
        topics: vec![event.signature()],
        data: ethers::abi::encode(args),
    }
}

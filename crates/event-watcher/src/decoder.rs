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

//! Turns decoded event arguments into [`NormalizedEvent`]s.
//!
//! Numbers are kept as decimal strings and byte values as `0x` hex, so
//! 256-bit identifiers survive untouched.

use ethers::abi::Token;
use ethers::types::{Log, U256};

use oraclex_relayer_types::{
    ActiveModeCommitment, ActiveModeQuery, AuthMode, NormalizedEvent,
    PassiveModeCommitment, PassiveModeQuery,
};
use oraclex_relayer_utils::{Error, Result};

use crate::abi;

/// Decodes a raw log of the OracleX contract.
///
/// Logs of other events yield `Ok(None)`.
pub fn decode_log(log: &Log) -> Result<Option<NormalizedEvent>> {
    match abi::parse_log(log)? {
        Some((event, args)) => decode_event(&event.name, &args),
        None => {
            tracing::trace!(topic0 = ?log.topics.first(), "skipping unknown event");
            Ok(None)
        }
    }
}

/// Maps the positional arguments of a named event to a [`NormalizedEvent`].
///
/// Unknown event names yield `Ok(None)`; arguments of the wrong shape are
/// an [`Error::MalformedEvent`].
pub fn decode_event(
    name: &str,
    args: &[Token],
) -> Result<Option<NormalizedEvent>> {
    let event = match name {
        abi::QUERY_ACTIVE_MODE_SUBMITTED => {
            let e = abi::QUERY_ACTIVE_MODE_SUBMITTED;
            let query = tuple(e, args, 1)?;
            NormalizedEvent::ActiveModeQuery(ActiveModeQuery {
                subscription_id: uint(e, args, 0)?,
                auth_mode: auth_mode(e, query, 1)?,
                manager_address: address(e, query, 2)?,
                extra_params: bytes(e, query, 3)?,
            })
        }
        abi::QUERY_PASSIVE_MODE_SUBMITTED => {
            let e = abi::QUERY_PASSIVE_MODE_SUBMITTED;
            let query = tuple(e, args, 2)?;
            NormalizedEvent::PassiveModeQuery(PassiveModeQuery {
                request_id: uint(e, args, 0)?,
                nonce: uint(e, args, 1)?,
                subscription_id: uint(e, query, 0)?,
                auth_mode: auth_mode(e, query, 1)?,
                callback_address: address(e, query, 2)?,
                manager_address: address(e, query, 3)?,
                callback_gas_limit: uint(e, query, 4)?,
                extra_params: bytes(e, query, 5)?,
            })
        }
        abi::DATA_COMMITMENT_EXECUTED_PASSIVE => {
            let e = abi::DATA_COMMITMENT_EXECUTED_PASSIVE;
            NormalizedEvent::PassiveModeCommitment(PassiveModeCommitment {
                request_id: uint(e, args, 0)?,
                task_id: uint(e, args, 1)?,
                callback_address: address(e, args, 2)?,
                auth_mode: auth_mode(e, args, 3)?,
            })
        }
        abi::DATA_COMMITMENT_EXECUTED_ACTIVE => {
            let e = abi::DATA_COMMITMENT_EXECUTED_ACTIVE;
            NormalizedEvent::ActiveModeCommitment(ActiveModeCommitment {
                sub_id: uint(e, args, 0)?,
                auth_mode: auth_mode(e, args, 1)?,
            })
        }
        other => {
            tracing::debug!(event = other, "no mapping for event");
            return Ok(None);
        }
    };
    Ok(Some(event))
}

fn arg<'a>(
    event: &'static str,
    args: &'a [Token],
    index: usize,
) -> Result<&'a Token> {
    args.get(index).ok_or_else(|| Error::MalformedEvent {
        event,
        reason: format!("missing argument #{index}"),
    })
}

fn malformed(event: &'static str, index: usize, expected: &str, got: &Token) -> Error {
    Error::MalformedEvent {
        event,
        reason: format!("argument #{index} should be {expected}, got {got:?}"),
    }
}

fn tuple<'a>(
    event: &'static str,
    args: &'a [Token],
    index: usize,
) -> Result<&'a [Token]> {
    match arg(event, args, index)? {
        Token::Tuple(inner) => Ok(inner),
        other => Err(malformed(event, index, "a tuple", other)),
    }
}

fn uint(event: &'static str, args: &[Token], index: usize) -> Result<String> {
    match arg(event, args, index)? {
        Token::Uint(v) | Token::Int(v) => Ok(v.to_string()),
        other => Err(malformed(event, index, "an integer", other)),
    }
}

fn address(
    event: &'static str,
    args: &[Token],
    index: usize,
) -> Result<String> {
    match arg(event, args, index)? {
        Token::Address(a) => Ok(format!("0x{}", hex::encode(a.as_bytes()))),
        other => Err(malformed(event, index, "an address", other)),
    }
}

fn bytes(event: &'static str, args: &[Token], index: usize) -> Result<String> {
    match arg(event, args, index)? {
        Token::Bytes(b) | Token::FixedBytes(b) => {
            Ok(format!("0x{}", hex::encode(b)))
        }
        other => Err(malformed(event, index, "bytes", other)),
    }
}

/// The auth mode is a `bytes1`, older deployments emit it as a small integer.
fn auth_mode(
    event: &'static str,
    args: &[Token],
    index: usize,
) -> Result<AuthMode> {
    match arg(event, args, index)? {
        Token::FixedBytes(b) | Token::Bytes(b) => Ok(AuthMode::from_bytes(b)),
        Token::Uint(v) if *v <= U256::from(u8::MAX) => {
            Ok(AuthMode::from_byte(v.low_u32() as u8))
        }
        Token::Uint(_) => Ok(AuthMode::Unknown),
        other => Err(malformed(event, index, "an auth mode byte", other)),
    }
}

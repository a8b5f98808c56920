use std::sync::Arc;

use ethers::abi::{AbiEncode, Token};
use ethers::types::{Address, Bytes};

use oraclex_relayer_types::PassiveModeQuery;
use oraclex_relayer_utils::Result;

use crate::contract::DataCommitmentByProofCall;
use crate::data_source::DataSource;
use crate::encoding::{left_pad, parse_address, parse_quantity, trim_leading_zeros};

/// Prefix the verifier expects in front of the ABI wrapped public input.
pub const PROOF_PREFIX: [u8; 4] = [0x8e, 0x76, 0x0a, 0xfe];
/// Length of the packed public input.
pub const PUBLIC_INPUT_LEN: usize = 137;
/// Query mode byte of a passive request.
pub const PASSIVE_QUERY_MODE: u8 = 0;

/// The fields a proof commitment is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataCommitmentProof {
    /// The oracle contract that will verify the proof.
    pub oracle_contract: Address,
    /// The chain the oracle contract lives on.
    pub chain_id: u64,
    /// The function invoked on the callback contract.
    pub callback_selector: [u8; 4],
    /// The request id, minimal big-endian.
    pub request_id: Vec<u8>,
    /// The `subId` slot of the public input, minimal big-endian.
    pub subscription_id: Vec<u8>,
    /// The contract receiving the callback.
    pub callback_address: Address,
    /// The callback gas limit, minimal big-endian.
    pub callback_gas_limit: Vec<u8>,
    /// The committed data.
    pub payload: Bytes,
}

/// The packed public input of a proof commitment.
///
/// Laid out as `taskId (8) ‖ callbackSelector (4) ‖ queryMode (1) ‖
/// requestId (32) ‖ subId (32) ‖ callbackAddress (20) ‖
/// callbackGasLimit (8) ‖ data (32)`, every field big-endian and left
/// padded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofPublicInput {
    pub task_id: [u8; 8],
    pub callback_selector: [u8; 4],
    pub query_mode: u8,
    pub request_id: [u8; 32],
    pub sub_id: [u8; 32],
    pub callback_address: [u8; 20],
    pub callback_gas_limit: [u8; 8],
    pub data: [u8; 32],
}

impl TryFrom<&DataCommitmentProof> for ProofPublicInput {
    type Error = oraclex_relayer_utils::Error;

    fn try_from(c: &DataCommitmentProof) -> Result<Self> {
        Ok(Self {
            task_id: [0u8; 8],
            callback_selector: c.callback_selector,
            query_mode: PASSIVE_QUERY_MODE,
            request_id: left_pad("requestId", &c.request_id)?,
            sub_id: left_pad("subId", &c.subscription_id)?,
            callback_address: c.callback_address.to_fixed_bytes(),
            callback_gas_limit: left_pad(
                "callbackGasLimit",
                &c.callback_gas_limit,
            )?,
            data: left_pad("data", trim_leading_zeros(&c.payload))?,
        })
    }
}

impl ProofPublicInput {
    /// Packs the fields into their fixed layout.
    pub fn encode(&self) -> [u8; PUBLIC_INPUT_LEN] {
        let mut out = [0u8; PUBLIC_INPUT_LEN];
        let query_mode = [self.query_mode];
        let parts: [&[u8]; 8] = [
            &self.task_id,
            &self.callback_selector,
            &query_mode,
            &self.request_id,
            &self.sub_id,
            &self.callback_address,
            &self.callback_gas_limit,
            &self.data,
        ];
        let mut offset = 0;
        for part in parts {
            out[offset..offset + part.len()].copy_from_slice(part);
            offset += part.len();
        }
        out
    }

    /// `PROOF_PREFIX ‖ abi.encode(bytes publicInput)`, the `proof` argument
    /// of `dataCommitmentByProof`.
    pub fn to_proof(&self) -> Bytes {
        let wrapped = ethers::abi::encode(&[Token::Bytes(self.encode().to_vec())]);
        let mut proof = Vec::with_capacity(PROOF_PREFIX.len() + wrapped.len());
        proof.extend_from_slice(&PROOF_PREFIX);
        proof.extend_from_slice(&wrapped);
        proof.into()
    }
}

/// Builds proof commitments for passive requests.
#[derive(Clone)]
pub struct ProofBuilder {
    oracle_contract: Address,
    chain_id: u64,
    callback_selector: [u8; 4],
    data_source: Arc<dyn DataSource>,
}

impl ProofBuilder {
    /// Creates a builder answering requests with data from `data_source`.
    pub fn new(
        oracle_contract: Address,
        chain_id: u64,
        callback_selector: [u8; 4],
        data_source: Arc<dyn DataSource>,
    ) -> Self {
        Self {
            oracle_contract,
            chain_id,
            callback_selector,
            data_source,
        }
    }

    /// Collects the commitment fields for a request.
    pub async fn commitment(
        &self,
        query: &PassiveModeQuery,
    ) -> Result<DataCommitmentProof> {
        let payload = self.data_source.fetch(query.into()).await?;
        Ok(DataCommitmentProof {
            oracle_contract: self.oracle_contract,
            chain_id: self.chain_id,
            callback_selector: self.callback_selector,
            request_id: parse_quantity("requestId", &query.request_id)?,
            // subId carries the request id
            subscription_id: parse_quantity("subId", &query.request_id)?,
            callback_address: parse_address(
                "callbackAddress",
                &query.callback_address,
            )?,
            callback_gas_limit: parse_quantity(
                "callbackGasLimit",
                &query.callback_gas_limit,
            )?,
            payload,
        })
    }

    /// Builds the `dataCommitmentByProof` calldata for a request.
    pub async fn calldata(&self, query: &PassiveModeQuery) -> Result<Bytes> {
        let commitment = self.commitment(query).await?;
        let input = ProofPublicInput::try_from(&commitment)?;
        tracing::trace!(
            request_id = %query.request_id,
            public_input = %hex::encode(input.encode()),
            "Packed proof public input"
        );
        let call = DataCommitmentByProofCall {
            proof: input.to_proof(),
        };
        Ok(call.encode().into())
    }
}

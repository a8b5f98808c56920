use async_trait::async_trait;
use ethers::types::Bytes;

use oraclex_relayer_types::PassiveModeQuery;
use oraclex_relayer_utils::Result;

use crate::encoding::abi_uint256;

/// A request for the data a proof commitment answers with.
#[derive(Debug, Clone, Copy)]
pub struct ProofRequest<'a> {
    /// The request being answered.
    pub request_id: &'a str,
    /// The subscription it belongs to.
    pub subscription_id: &'a str,
    /// Opaque parameters supplied by the requester, 0x-hex.
    pub extra_params: &'a str,
}

impl<'a> From<&'a PassiveModeQuery> for ProofRequest<'a> {
    fn from(query: &'a PassiveModeQuery) -> Self {
        Self {
            request_id: &query.request_id,
            subscription_id: &query.subscription_id,
            extra_params: &query.extra_params,
        }
    }
}

/// Where proof commitments get their data from.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetches the data for a request. At most 32 bytes are committed.
    async fn fetch(&self, request: ProofRequest<'_>) -> Result<Bytes>;
}

/// Answers every request with `abi.encode(uint256 1)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderDataSource;

#[async_trait]
impl DataSource for PlaceholderDataSource {
    async fn fetch(&self, _request: ProofRequest<'_>) -> Result<Bytes> {
        Ok(abi_uint256(1))
    }
}

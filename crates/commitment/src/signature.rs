use ethers::abi::{AbiEncode, Token};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, Signature, H256, U256};
use ethers::utils::keccak256;

use oraclex_relayer_types::ActiveModeQuery;
use oraclex_relayer_utils::Result;

use crate::contract::DataCommitmentBySignatureACall;
use crate::encoding::{left_pad, parse_quantity};

/// The fields an oracle signature commits to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataCommitmentSig {
    /// The oracle contract that will verify the signature.
    pub oracle_contract: Address,
    /// The chain the oracle contract lives on.
    pub chain_id: u64,
    /// The subscription id as a 32 byte word.
    pub subscription_id: [u8; 32],
    /// The committed data.
    pub payload: Bytes,
}

impl DataCommitmentSig {
    /// `keccak256(abi.encode(address, uint256, bytes32, bytes))` over the
    /// commitment fields.
    pub fn signing_hash(&self) -> H256 {
        let encoded = ethers::abi::encode(&[
            Token::Address(self.oracle_contract),
            Token::Uint(U256::from(self.chain_id)),
            Token::FixedBytes(self.subscription_id.to_vec()),
            Token::Bytes(self.payload.to_vec()),
        ]);
        H256(keccak256(encoded))
    }
}

/// Builds and signs commitments for active subscriptions.
#[derive(Debug, Clone)]
pub struct SignatureBuilder {
    oracle_contract: Address,
    chain_id: u64,
    payload: Bytes,
    wallet: LocalWallet,
}

impl SignatureBuilder {
    /// Creates a builder signing `payload` with `wallet` for the given
    /// oracle contract.
    pub fn new(
        oracle_contract: Address,
        chain_id: u64,
        payload: Bytes,
        wallet: LocalWallet,
    ) -> Self {
        Self {
            oracle_contract,
            chain_id,
            payload,
            wallet,
        }
    }

    /// The address signatures recover to.
    pub fn signer(&self) -> Address {
        self.wallet.address()
    }

    /// Collects the commitment fields for a subscription.
    pub fn commitment(&self, query: &ActiveModeQuery) -> Result<DataCommitmentSig> {
        let id = parse_quantity("subscriptionId", &query.subscription_id)?;
        Ok(DataCommitmentSig {
            oracle_contract: self.oracle_contract,
            chain_id: self.chain_id,
            subscription_id: left_pad("subscriptionId", &id)?,
            payload: self.payload.clone(),
        })
    }

    /// Signs the commitment hash as an Ethereum personal message.
    pub async fn sign(&self, commitment: &DataCommitmentSig) -> Result<Signature> {
        let hash = commitment.signing_hash();
        Ok(self.wallet.sign_message(hash.as_bytes()).await?)
    }

    /// Builds the `dataCommitmentBySignatureA` calldata for a subscription.
    pub async fn calldata(&self, query: &ActiveModeQuery) -> Result<Bytes> {
        let commitment = self.commitment(query)?;
        let signature = self.sign(&commitment).await?;
        tracing::trace!(
            subscription_id = %query.subscription_id,
            hash = ?commitment.signing_hash(),
            "Signed data commitment"
        );
        let call = DataCommitmentBySignatureACall {
            subscription_id: commitment.subscription_id,
            data: commitment.payload,
            signatures: vec![Bytes::from(signature.to_vec())],
        };
        Ok(call.encode().into())
    }
}

//! Bindings for the commitment entry points of the OracleX contract.

pub use bindings::*;

#[allow(missing_docs)]
mod bindings {
    use ethers::contract::abigen;

    abigen!(
        OracleXContract,
        r#"[
            function dataCommitmentBySignatureA(bytes32 subscriptionId, bytes data, bytes[] signatures) external
            function dataCommitmentByProof(bytes proof) external
        ]"#
    );
}

#![deny(unsafe_code)]
#![warn(missing_docs)]

//! # OracleX Relayer Crate 🕸️
//!
//! An off-chain oracle relay node for the OracleX contract.
//!
//! ## Overview
//!
//! The relayer watches the OracleX contract for data requests and answers
//! each one with a data commitment sent back to the same contract. Four
//! background tasks do the work:
//!
//!   1. The block scanner walks the chain in small windows, decodes the
//!      contract events and appends every query to the subscription registry.
//!   2. The signature task answers active subscriptions with a signed
//!      commitment, without waiting for the receipt.
//!   3. The proof task answers passive requests with a packed public input
//!      for the proof verifier and waits for every receipt.
//!   4. The nonce task pulls the local nonce counter back to the network
//!      value when it drifts too far ahead.

/// Background services of the relayer.
pub mod service;

/// A type alias for the result used by the relayer binary.
pub type Result<T> = oraclex_relayer_utils::Result<T>;

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

//! # OracleX Commitment 🕸️
//!
//! Builds data commitments for registry entries and sends them to the
//! OracleX contract.
//!
//! Active subscriptions are answered with an oracle signature over
//! `keccak256(abi.encode(oracle, chainId, subscriptionId, payload))`.
//! Passive requests are answered with a packed 137 byte public input handed
//! to the proof verifier. Both paths share one nonce allocator and run on
//! their own cadence.

pub mod contract;
/// Fixed-width encoding helpers.
pub mod encoding;
/// The seam proof commitments get their data from.
pub mod data_source;
pub mod multisig;
/// Proof commitments.
pub mod proof;
/// Routing of registry entries to commitment paths.
pub mod route;
/// The recurring commitment tasks.
pub mod service;
/// Signature commitments.
pub mod signature;

pub use data_source::{DataSource, PlaceholderDataSource, ProofRequest};
pub use proof::{DataCommitmentProof, ProofBuilder, ProofPublicInput};
pub use route::{route, Cadence, Route};
pub use service::{CommitmentService, TickReport};
pub use signature::{DataCommitmentSig, SignatureBuilder};

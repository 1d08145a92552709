//! merkledrop
//!
//! Merkle-committed token distribution. A fixed allocation list is committed
//! to a single root off-line; recipients later claim their allocation by
//! presenting an inclusion proof, and each allocation is disbursed at most
//! once.
//!
//! ## Crates
//!
//! - `merkledrop-core`: addresses, digests, amounts and hex codecs
//! - `merkledrop-merkle`: leaf hashing, sorted-pair proofs, tree builder
//! - `merkledrop-distributor`: claim ledger, disbursement and sweep
//! - `merkledrop-builder`: allocation list → root + per-recipient proofs

pub use merkledrop_builder as builder;
pub use merkledrop_core as core;
pub use merkledrop_distributor as distributor;
pub use merkledrop_merkle as merkle;

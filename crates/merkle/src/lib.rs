//! merkledrop Merkle
//!
//! Allocation leaves, sorted-pair proof verification and the binary tree
//! used to commit an allocation list to a single root.
//!
//! The verifier (`verify`, `process_proof`) is what the distributor runs on
//! every claim. `MerkleTree` is the construction side; both go through the
//! same `leaf_hash` and `hash_sorted_pair`, so a root built here always
//! verifies there.

pub mod hasher;
pub mod proof;
pub mod tree;

pub use hasher::{HashAlgorithm, ParseHashAlgorithmError};
pub use proof::{hash_sorted_pair, leaf_hash, process_proof, verify};
pub use tree::MerkleTree;

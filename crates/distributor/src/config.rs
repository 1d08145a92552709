use merkledrop_core::{serde_digest, Digest};
use merkledrop_merkle::HashAlgorithm;
use serde::{Deserialize, Serialize};

/// Distributor configuration
///
/// Fixed at construction: there is no way to change the root or the hash
/// algorithm of a running distributor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributorConfig {
    /// Committed Merkle root over all allocations
    #[serde(with = "serde_digest")]
    pub merkle_root: Digest,
    /// Hash used for leaves and internal nodes
    #[serde(default)]
    pub hash: HashAlgorithm,
}

impl DistributorConfig {
    /// Keccak-256 configuration for `merkle_root`
    pub fn new(merkle_root: Digest) -> Self {
        Self {
            merkle_root,
            hash: HashAlgorithm::default(),
        }
    }

    pub fn with_hash(mut self, hash: HashAlgorithm) -> Self {
        self.hash = hash;
        self
    }
}

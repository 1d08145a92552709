//! Built distribution: committed root plus per-recipient proofs.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::Path;

use merkledrop_core::{hex_prefix, serde_amount, serde_digest, serde_digests, Address, Amount, Digest};
use merkledrop_distributor::DistributorConfig;
use merkledrop_merkle::{verify, HashAlgorithm, MerkleTree};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use crate::{Allocation, BuilderError, Result};

/// One recipient's entry in the distribution file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimEntry {
    /// Leaf position after sorting by recipient
    pub index: usize,
    #[serde(with = "serde_amount")]
    pub amount: Amount,
    /// Sibling digests, leaf level first
    #[serde(with = "serde_digests")]
    pub proof: Vec<Digest>,
}

/// Merkle distribution ready for deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    #[serde(with = "serde_digest")]
    pub merkle_root: Digest,
    #[serde(default)]
    pub hash: HashAlgorithm,
    /// Sum of all allocations (custody needed to pay every claim)
    #[serde(with = "serde_amount")]
    pub token_total: Amount,
    pub claims: BTreeMap<Address, ClaimEntry>,
}

impl Distribution {
    /// Build a distribution from an allocation list.
    ///
    /// Allocations are sorted by recipient so the root does not depend on
    /// input order. Rejects empty lists, zero addresses, zero amounts,
    /// duplicate recipients and totals that overflow.
    pub fn build(hash: HashAlgorithm, allocations: &[Allocation]) -> Result<Self> {
        if allocations.is_empty() {
            return Err(BuilderError::Empty);
        }

        let mut seen = HashSet::with_capacity(allocations.len());
        let mut token_total: Amount = 0;
        for (i, allocation) in allocations.iter().enumerate() {
            if allocation.address.is_zero() {
                return Err(BuilderError::ZeroAddress(i));
            }
            if allocation.amount == 0 {
                return Err(BuilderError::ZeroAmount(allocation.address));
            }
            if !seen.insert(allocation.address) {
                return Err(BuilderError::DuplicateRecipient(allocation.address));
            }
            token_total = token_total
                .checked_add(allocation.amount)
                .ok_or(BuilderError::TotalOverflow)?;
        }

        let mut entries: Vec<(Address, Amount)> = allocations
            .iter()
            .map(|a| (a.address, a.amount))
            .collect();
        entries.sort_by_key(|(address, _)| *address);

        let tree = MerkleTree::from_allocations(hash, &entries);
        let merkle_root = tree.root();

        let mut claims = BTreeMap::new();
        for (index, (address, amount)) in entries.iter().enumerate() {
            let proof = tree.proof(index).ok_or(BuilderError::Empty)?;
            claims.insert(
                *address,
                ClaimEntry {
                    index,
                    amount: *amount,
                    proof,
                },
            );
        }

        info!(
            "Built distribution: {} recipients, total {}, depth {}, root {}",
            entries.len(),
            token_total,
            tree.depth(),
            hex_prefix(&merkle_root),
        );

        Ok(Self {
            merkle_root,
            hash,
            token_total,
            claims,
        })
    }

    /// Configuration for a distributor committed to this distribution.
    pub fn config(&self) -> DistributorConfig {
        DistributorConfig::new(self.merkle_root).with_hash(self.hash)
    }

    pub fn claim_for(&self, recipient: &Address) -> Option<&ClaimEntry> {
        self.claims.get(recipient)
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Recipients whose stored proof does not verify against the root.
    /// Empty for any distribution produced by `build`.
    pub fn invalid_entries(&self) -> Vec<Address> {
        self.claims
            .iter()
            .filter(|(address, entry)| {
                !verify(self.hash, address, entry.amount, &entry.proof, &self.merkle_root)
            })
            .map(|(address, _)| *address)
            .collect()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write atomically: a temp file next to `path` is renamed over it.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp_file = NamedTempFile::new_in(parent)?;
        temp_file.write_all(json.as_bytes())?;
        temp_file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

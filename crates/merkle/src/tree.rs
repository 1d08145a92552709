//! Binary Merkle tree over allocation leaves.
//!
//! Internal nodes use `hash_sorted_pair`. When a level has an odd number of
//! nodes the last one has no sibling and is promoted unchanged to the next
//! level; its proof simply has no entry for that level.

use merkledrop_core::{Address, Amount, Digest};

use crate::proof::{hash_sorted_pair, leaf_hash, process_proof};
use crate::HashAlgorithm;

/// A binary Merkle tree.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    algo: HashAlgorithm,
    /// All nodes stored level by level, bottom-up. `layers[0]` = leaves.
    layers: Vec<Vec<Digest>>,
}

impl MerkleTree {
    /// Build a tree from `(recipient, amount)` allocations, in order.
    pub fn from_allocations(algo: HashAlgorithm, allocations: &[(Address, Amount)]) -> Self {
        let leaves = allocations
            .iter()
            .map(|(recipient, amount)| leaf_hash(algo, recipient, *amount))
            .collect();
        Self::from_leaves(algo, leaves)
    }

    /// Build a tree from pre-hashed leaves.
    pub fn from_leaves(algo: HashAlgorithm, leaves: Vec<Digest>) -> Self {
        let mut layers = vec![leaves];

        loop {
            let prev = &layers[layers.len() - 1];
            if prev.len() <= 1 {
                break;
            }
            let next: Vec<Digest> = prev
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => hash_sorted_pair(algo, left, right),
                    [single] => *single,
                    _ => unreachable!("chunks(2) yields one or two nodes"),
                })
                .collect();
            layers.push(next);
        }

        Self { algo, layers }
    }

    /// The committed root. An empty tree has the all-zero root, which no
    /// leaf can fold to.
    pub fn root(&self) -> Digest {
        self.layers
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or([0u8; 32])
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algo
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    /// Number of levels above the leaves (upper bound on proof length).
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn leaf(&self, index: usize) -> Option<Digest> {
        self.layers[0].get(index).copied()
    }

    /// Sibling digests from leaf level to root for the leaf at `index`.
    ///
    /// Returns `None` if the index is out of range.
    pub fn proof(&self, index: usize) -> Option<Vec<Digest>> {
        if index >= self.leaf_count() {
            return None;
        }

        let mut siblings = Vec::with_capacity(self.depth());
        let mut idx = index;

        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling_idx = idx ^ 1;
            if let Some(sibling) = layer.get(sibling_idx) {
                siblings.push(*sibling);
            }
            idx /= 2;
        }

        Some(siblings)
    }

    /// Check a proof for a raw leaf against this tree's root.
    pub fn contains_leaf(&self, leaf: Digest, proof: &[Digest]) -> bool {
        self.leaf_count() > 0 && process_proof(self.algo, leaf, proof) == self.root()
    }
}

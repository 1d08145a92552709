//! Proof verification.
//!
//! Leaf formula: `H(recipient[20] || amount as 32-byte big-endian word)`.
//! Internal nodes: `H(min(a, b) || max(a, b))` where the two children are
//! ordered as unsigned big-endian integers (byte-wise lexicographic order).
//!
//! Because pairs are sorted before hashing, a proof is just the list of
//! sibling digests bottom-up; no left/right path bits are carried.

use merkledrop_core::{amount_word, Address, Amount, Digest};

use crate::HashAlgorithm;

/// Compute the allocation leaf for `(recipient, amount)`.
pub fn leaf_hash(algo: HashAlgorithm, recipient: &Address, amount: Amount) -> Digest {
    algo.hash(&[recipient.as_bytes(), &amount_word(amount)])
}

/// Combine two nodes independent of their position in the tree.
pub fn hash_sorted_pair(algo: HashAlgorithm, a: &Digest, b: &Digest) -> Digest {
    if a <= b {
        algo.hash(&[a, b])
    } else {
        algo.hash(&[b, a])
    }
}

/// Fold `proof` over `leaf`, returning the implied root.
pub fn process_proof(algo: HashAlgorithm, leaf: Digest, proof: &[Digest]) -> Digest {
    proof
        .iter()
        .fold(leaf, |acc, sibling| hash_sorted_pair(algo, &acc, sibling))
}

/// Check that `(recipient, amount)` is committed under `root`.
///
/// Malformed input is not an error: anything that does not fold to the
/// root is simply `false`.
pub fn verify(
    algo: HashAlgorithm,
    recipient: &Address,
    amount: Amount,
    proof: &[Digest],
    root: &Digest,
) -> bool {
    let leaf = leaf_hash(algo, recipient, amount);
    process_proof(algo, leaf, proof) == *root
}

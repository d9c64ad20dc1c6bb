//! Merkle tree over chunk hashes, used to derive a manifest's root hash.
//!
//! Construction is bottom-up pairwise hashing of 32-byte digests. An odd
//! element at any level is paired with itself — `hash(node || node)` — rather
//! than promoted unchanged, so every level above the leaves is itself a hash
//! of exactly 64 bytes.

use crate::hash::blake3::hash;
use crate::mem::constant_time;
use serde::{Deserialize, Serialize};

fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(left);
    data[32..].copy_from_slice(right);
    hash(&data)
}

/// Compute the Merkle root of a sequence of leaf hashes.
///
/// A single leaf is its own root. An empty slice returns the all-zero hash;
/// callers building a manifest for a zero-length file must supply the single
/// empty-chunk hash as the one leaf rather than calling this with no leaves.
pub fn merkle_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    if leaves.is_empty() {
        return [0u8; 32];
    }

    let mut level = leaves.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let combined = if pair.len() == 2 {
                hash_pair(&pair[0], &pair[1])
            } else {
                hash_pair(&pair[0], &pair[0])
            };
            next.push(combined);
        }
        level = next;
    }
    level[0]
}

/// Merkle tree retaining leaves, for proof generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleTree {
    leaves: Vec<[u8; 32]>,
}

impl MerkleTree {
    /// Build a Merkle tree from leaf hashes.
    pub fn build(leaves: Vec<[u8; 32]>) -> Self {
        Self { leaves }
    }

    /// The Merkle root, per [`merkle_root`].
    pub fn root(&self) -> [u8; 32] {
        merkle_root(&self.leaves)
    }

    /// Generate a proof of inclusion for a leaf.
    pub fn prove(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaves.len() {
            return None;
        }

        let mut proof_hashes = Vec::new();
        let mut current_index = index;
        let mut level = self.leaves.clone();

        while level.len() > 1 {
            let sibling_index = if current_index % 2 == 0 {
                current_index + 1
            } else {
                current_index - 1
            };
            let sibling = if sibling_index < level.len() {
                level[sibling_index]
            } else {
                level[current_index]
            };
            proof_hashes.push(sibling);

            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            for pair in level.chunks(2) {
                let combined = if pair.len() == 2 {
                    hash_pair(&pair[0], &pair[1])
                } else {
                    hash_pair(&pair[0], &pair[0])
                };
                next.push(combined);
            }
            current_index /= 2;
            level = next;
        }

        Some(MerkleProof {
            leaf_hash: self.leaves[index],
            proof_hashes,
            leaf_index: index,
        })
    }

    /// Verify a Merkle proof against an expected root, in constant time.
    pub fn verify(proof: &MerkleProof, root: &[u8; 32], leaf: &[u8; 32]) -> bool {
        if !constant_time::ct_eq(&proof.leaf_hash, leaf) {
            return false;
        }

        let mut current_hash = *leaf;
        let mut current_index = proof.leaf_index;

        for sibling in &proof.proof_hashes {
            current_hash = if current_index % 2 == 0 {
                hash_pair(&current_hash, sibling)
            } else {
                hash_pair(sibling, &current_hash)
            };
            current_index /= 2;
        }

        constant_time::ct_eq(&current_hash, root)
    }
}

/// Proof of inclusion for a leaf in a Merkle tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Hash of the leaf being proven
    pub leaf_hash: [u8; 32],
    /// Hashes along the path from leaf to root
    pub proof_hashes: Vec<[u8; 32]>,
    /// Index of the leaf in the tree
    pub leaf_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_leaf_is_its_own_root() {
        let leaf = hash(b"leaf0");
        assert_eq!(merkle_root(&[leaf]), leaf);
    }

    #[test]
    fn odd_element_paired_with_itself() {
        let leaves = vec![hash(b"a"), hash(b"b"), hash(b"c")];
        let expected_level2 = [hash_pair(&leaves[0], &leaves[1]), hash_pair(&leaves[2], &leaves[2])];
        let expected_root = hash_pair(&expected_level2[0], &expected_level2[1]);
        assert_eq!(merkle_root(&leaves), expected_root);
    }

    #[test]
    fn deterministic_for_same_input() {
        let leaves = vec![hash(b"x"), hash(b"y"), hash(b"z"), hash(b"w")];
        assert_eq!(merkle_root(&leaves), merkle_root(&leaves));
    }

    #[test]
    fn proof_roundtrip_even_and_odd_leaf_counts() {
        for n in [1usize, 2, 3, 4, 5, 7, 8] {
            let leaves: Vec<[u8; 32]> = (0..n).map(|i| hash(format!("leaf{i}").as_bytes())).collect();
            let tree = MerkleTree::build(leaves.clone());
            let root = tree.root();
            for (i, leaf) in leaves.iter().enumerate() {
                let proof = tree.prove(i).unwrap();
                assert!(MerkleTree::verify(&proof, &root, leaf), "n={n} i={i}");
            }
        }
    }

    #[test]
    fn proof_rejects_wrong_leaf() {
        let leaves = vec![hash(b"leaf0"), hash(b"leaf1")];
        let tree = MerkleTree::build(leaves);
        let root = tree.root();
        let proof = tree.prove(0).unwrap();
        assert!(!MerkleTree::verify(&proof, &root, &hash(b"wrong")));
    }
}

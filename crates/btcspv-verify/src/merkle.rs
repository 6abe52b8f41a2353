//! Bitcoin-style hash256 Merkle trees: inclusion proof verification over a flattened proof
//! buffer, and a small tree builder used to assemble proofs from a block's transaction ids.

use tracing::trace;

use crate::error::SpvError;
use crate::hash::{digest_at, hash256_merkle_step, Hash256Digest};

/// Verify a hash256 Merkle proof.
///
/// The proof is a tightly packed buffer of 32-byte nodes: the first node is the leaf, the last
/// is the root, and the nodes in between are siblings ordered from the leaf's level upward.
/// `index` is the 0-based position of the leaf and only decides the sibling order at each level;
/// it is not a reliable indicator of the leaf's location within a block.
pub fn verify_hash256_merkle(proof: &[u8], index: u64) -> bool {
    check_hash256_merkle(proof, index).is_ok()
}

/// Same as [`verify_hash256_merkle`], reporting why the proof was rejected.
///
/// An empty buffer is a caller bug and yields [`SpvError::EmptyMerkleProof`].
pub fn check_hash256_merkle(proof: &[u8], index: u64) -> Result<(), SpvError> {
    if proof.is_empty() {
        return Err(SpvError::EmptyMerkleProof);
    }
    if proof.len() % 32 != 0 {
        return Err(SpvError::MerkleProofLength(proof.len()));
    }

    match proof.len() {
        // Single-transaction block: the leaf is the root
        32 => return Ok(()),
        // A leaf and a root with nothing to combine them
        64 => return Err(SpvError::MalformedMerkleProof),
        _ => {}
    }

    let levels = proof.len() / 32 - 1;
    let root = digest_at(proof, proof.len() - 32);
    let mut current = digest_at(proof, 0);
    let mut idx = index;

    for i in 1..levels {
        let next = &proof[i * 32..i * 32 + 32];
        current = if idx % 2 == 1 {
            hash256_merkle_step(next, &current)
        } else {
            hash256_merkle_step(&current, next)
        };
        trace!("Merkle level {} (index {}): {}", i, idx, hex::encode(current));
        idx >>= 1;
    }

    if current != root {
        return Err(SpvError::BadMerkleProof);
    }
    Ok(())
}

/// Evaluate a Bitcoin Merkle inclusion proof.
///
/// - `txid`: the transaction id (LE)
/// - `merkle_root`: the Merkle root as found in the block header (LE)
/// - `intermediate_nodes`: the sibling digests between leaf and root
/// - `index`: the leaf's 0-based index in the block
pub fn prove(
    txid: Hash256Digest,
    merkle_root: Hash256Digest,
    intermediate_nodes: &[u8],
    index: u64,
) -> bool {
    check_prove(txid, merkle_root, intermediate_nodes, index).is_ok()
}

/// Same as [`prove`], reporting why the proof was rejected.
pub fn check_prove(
    txid: Hash256Digest,
    merkle_root: Hash256Digest,
    intermediate_nodes: &[u8],
    index: u64,
) -> Result<(), SpvError> {
    if txid == merkle_root && index == 0 && intermediate_nodes.is_empty() {
        return Ok(());
    }

    let mut proof = Vec::with_capacity(64 + intermediate_nodes.len());
    proof.extend_from_slice(&txid);
    proof.extend_from_slice(intermediate_nodes);
    proof.extend_from_slice(&merkle_root);

    check_hash256_merkle(&proof, index)
}

/// A block's transaction Merkle tree, kept layer by layer from the leaves to the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    layers: Vec<Vec<Hash256Digest>>,
}

impl MerkleTree {
    /// Build the tree over `leaves` (transaction ids in LE order).
    ///
    /// A layer with an odd number of nodes pairs its last node with itself.
    /// Returns `None` if there are no leaves.
    pub fn from_leaves(leaves: Vec<Hash256Digest>) -> Option<Self> {
        if leaves.is_empty() {
            return None;
        }

        let mut layers = vec![leaves];
        while let Some(layer) = layers.last().filter(|layer| layer.len() > 1) {
            let parent = layer
                .chunks(2)
                .map(|chunk| match chunk {
                    [left, right] => hash256_merkle_step(left, right),
                    [left] => hash256_merkle_step(left, left),
                    _ => unreachable!("Chunk size is at most 2"),
                })
                .collect();
            layers.push(parent);
        }

        Some(Self { layers })
    }

    /// Merkle root (LE)
    pub fn root(&self) -> Hash256Digest {
        self.layers[self.layers.len() - 1][0]
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    /// Number of hashing levels between the leaves and the root
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    /// Sibling digests for the leaf at `index`, concatenated bottom-up.
    ///
    /// Returns `None` if `index` is out of bounds.
    pub fn branch(&self, index: usize) -> Option<Vec<u8>> {
        if index >= self.leaf_count() {
            return None;
        }

        let mut nodes = Vec::with_capacity(self.depth() * 32);
        let mut idx = index;
        for layer in &self.layers[..self.depth()] {
            let sibling = if idx % 2 == 1 {
                idx - 1
            } else {
                // No right sibling on an odd layer: the node is paired with itself
                (idx + 1).min(layer.len() - 1)
            };
            nodes.extend_from_slice(&layer[sibling]);
            idx /= 2;
        }
        Some(nodes)
    }

    /// Full proof buffer for the leaf at `index`: `leaf || siblings || root`.
    pub fn proof(&self, index: usize) -> Option<Vec<u8>> {
        let branch = self.branch(index)?;
        let mut proof = Vec::with_capacity(branch.len() + 64);
        proof.extend_from_slice(&self.layers[0][index]);
        proof.extend_from_slice(&branch);
        proof.extend_from_slice(&self.root());
        Some(proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(byte: u8) -> Hash256Digest {
        [byte; 32]
    }

    fn concat(nodes: &[Hash256Digest]) -> Vec<u8> {
        nodes.iter().flatten().copied().collect()
    }

    #[test]
    fn test_single_node_is_trivially_valid() {
        assert!(verify_hash256_merkle(&leaf(7), 0));
        assert!(verify_hash256_merkle(&leaf(7), 1));
        assert!(verify_hash256_merkle(&leaf(7), 12345));
    }

    #[test]
    fn test_malformed_lengths() {
        assert!(!verify_hash256_merkle(&[0u8; 31], 0));
        assert!(!verify_hash256_merkle(&[0u8; 33], 0));
        assert!(!verify_hash256_merkle(&[0u8; 100], 0));
        assert_eq!(
            check_hash256_merkle(&[0u8; 100], 0),
            Err(SpvError::MerkleProofLength(100))
        );
    }

    #[test]
    fn test_leaf_and_root_only_is_rejected() {
        // Even when leaf and root are identical
        let proof = concat(&[leaf(1), leaf(1)]);
        assert!(!verify_hash256_merkle(&proof, 0));
        assert_eq!(
            check_hash256_merkle(&proof, 0),
            Err(SpvError::MalformedMerkleProof)
        );
    }

    #[test]
    fn test_empty_proof_is_a_contract_violation() {
        assert!(!verify_hash256_merkle(&[], 0));
        let err = check_hash256_merkle(&[], 0).unwrap_err();
        assert_eq!(err, SpvError::EmptyMerkleProof);
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_sibling_order_follows_index_parity() {
        let (a, b) = (leaf(0xaa), leaf(0xbb));

        // Leaf at even index: sibling follows
        let root_even = hash256_merkle_step(&a, &b);
        let proof = concat(&[a, b, root_even]);
        assert!(verify_hash256_merkle(&proof, 0));
        assert!(!verify_hash256_merkle(&proof, 1));

        // Leaf at odd index: sibling precedes
        let root_odd = hash256_merkle_step(&b, &a);
        let proof = concat(&[a, b, root_odd]);
        assert!(verify_hash256_merkle(&proof, 1));
        assert!(!verify_hash256_merkle(&proof, 0));
    }

    #[test]
    fn test_two_level_layout() {
        let (l0, l1, l2, l3) = (leaf(0), leaf(1), leaf(2), leaf(3));
        let n01 = hash256_merkle_step(&l0, &l1);
        let n23 = hash256_merkle_step(&l2, &l3);
        let root = hash256_merkle_step(&n01, &n23);

        // Leaf 2: sibling l3 follows, then n01 precedes
        let proof = concat(&[l2, l3, n01, root]);
        assert!(verify_hash256_merkle(&proof, 2));
        assert!(!verify_hash256_merkle(&proof, 0));
        assert!(!verify_hash256_merkle(&proof, 3));

        // Swapping the two sibling levels breaks the proof
        let swapped = concat(&[l2, n01, l3, root]);
        assert!(!verify_hash256_merkle(&swapped, 2));
    }

    #[test]
    fn test_prove_shortcut() {
        let txid = leaf(9);
        assert!(prove(txid, txid, &[], 0));
        // The shortcut only applies at index 0
        assert!(!prove(txid, txid, &[], 1));
        // Distinct txid and root with no siblings cannot be proven
        assert!(!prove(txid, leaf(8), &[], 0));
    }

    #[test]
    fn test_prove_rejects_ragged_intermediate_nodes() {
        let tree = MerkleTree::from_leaves(vec![leaf(0), leaf(1), leaf(2)]).unwrap();
        let mut branch = tree.branch(1).unwrap();
        branch.pop();
        assert_eq!(
            check_prove(leaf(1), tree.root(), &branch, 1),
            Err(SpvError::MerkleProofLength(64 + 63))
        );
    }

    #[test]
    fn test_tree_matches_manual_construction() {
        let leaves = vec![leaf(0), leaf(1), leaf(2)];
        let tree = MerkleTree::from_leaves(leaves).unwrap();

        let n01 = hash256_merkle_step(&leaf(0), &leaf(1));
        let n22 = hash256_merkle_step(&leaf(2), &leaf(2));
        assert_eq!(tree.root(), hash256_merkle_step(&n01, &n22));
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.leaf_count(), 3);

        // The last leaf of an odd layer is its own sibling
        assert_eq!(tree.branch(2).unwrap(), concat(&[leaf(2), n01]));
        assert!(tree.branch(3).is_none());
    }

    #[test]
    fn test_every_leaf_proves() {
        for n in 1..=17u8 {
            let leaves: Vec<_> = (0..n).map(leaf).collect();
            let tree = MerkleTree::from_leaves(leaves.clone()).unwrap();
            for (i, txid) in leaves.iter().enumerate() {
                let branch = tree.branch(i).unwrap();
                assert!(
                    prove(*txid, tree.root(), &branch, i as u64),
                    "leaf {} of {} failed",
                    i,
                    n
                );
            }
        }
    }

    #[test]
    fn test_single_leaf_tree() {
        let tree = MerkleTree::from_leaves(vec![leaf(5)]).unwrap();
        assert_eq!(tree.root(), leaf(5));
        assert_eq!(tree.depth(), 0);
        assert!(tree.branch(0).unwrap().is_empty());
        assert!(MerkleTree::from_leaves(vec![]).is_none());
    }
}

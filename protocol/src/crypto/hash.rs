//! # Hashing Utilities
//!
//! Keccak-256 front door plus the [`Hasher`] used by the accumulator.
//!
//! The choice of hash is not ours to make: the dispute contract recomputes
//! every leaf, every internal node, and every batch commitment with the EVM's
//! `keccak256`, so this library uses the same digest everywhere. A challenger
//! and the contract must arrive at identical roots from identical inputs —
//! there is no room for an "almost compatible" hash.
//!
//! ## Zero subtrees
//!
//! A sparse tree never materializes its empty regions. Instead, [`Hasher::zeros`]
//! precomputes one hash per level: the value of an entirely empty subtree
//! rooted at that level. The empty leaf is pinned to the all-zero word, which
//! is also the defined hash of the empty-account sentinel — an unoccupied
//! slot and a slot explicitly proven empty commit to the same node.

use sha3::{Digest, Keccak256};

use crate::tree::Node;

/// Compute the Keccak-256 hash of the input data.
///
/// Returns a 32-byte digest as a fixed-size array. This is the digest the
/// EVM's `keccak256` opcode produces; Solidity's
/// `keccak256(abi.encodePacked(..))` over the same bytes agrees byte for byte.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash multiple byte slices together without concatenation overhead.
///
/// Feeding the parts sequentially into the hasher produces the same digest
/// as hashing their concatenation, minus the temporary buffer. Used for
/// `hash2(left, right)` and the packed tuple hashes.
pub fn keccak256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Leaf and internal-node hash primitive for the accumulator.
///
/// Pure functions only; a `Hasher` carries no state. It exists as a value
/// (rather than free functions) so the tree owns its hashing seam explicitly
/// and tests can talk about "the tree's hasher" without reaching for globals.
#[derive(Clone, Copy, Debug, Default)]
pub struct Hasher;

impl Hasher {
    /// Create a new hasher.
    pub fn new() -> Self {
        Hasher
    }

    /// Hash raw byte data into a leaf node.
    pub fn hash(&self, data: &[u8]) -> Node {
        Node(keccak256(data))
    }

    /// Combine two sibling nodes into their parent: `keccak256(left ‖ right)`.
    pub fn hash2(&self, left: Node, right: Node) -> Node {
        Node(keccak256_multi(&[&left.0, &right.0]))
    }

    /// Build the zero-subtree table for a tree of the given depth.
    ///
    /// Returns `depth + 1` nodes, root level first: `zeros[depth]` is the
    /// empty leaf (the all-zero word), and `zeros[l] = hash2(zeros[l+1],
    /// zeros[l+1])` all the way up. `zeros[0]` is the root of a tree nothing
    /// has ever been written to.
    pub fn zeros(&self, depth: usize) -> Vec<Node> {
        let mut zeros = vec![Node::ZERO; depth + 1];
        for level in (0..depth).rev() {
            zeros[level] = self.hash2(zeros[level + 1], zeros[level + 1]);
        }
        zeros
    }
}

//! # Fixed-Depth Sparse Merkle Accumulator
//!
//! A tree of `2^depth` leaf slots where only written nodes are stored.
//! Absent entries implicitly equal the zero-subtree value of their level, so
//! a tree with capacity `2^32` costs memory proportional to what was actually
//! touched, not to its capacity.
//!
//! ## The ascend pass
//!
//! All updates funnel into one ancestor-recomputation routine. For a modified
//! contiguous run `[offset, offset + len)` at some level, the run is widened
//! to sibling-pair boundaries (one step left if it starts on an odd index,
//! one step right if its length ends up odd), every pair in the widened run
//! is rehashed, and then `offset` and `len` are halved for the next level up.
//! Sibling pairs are always recomputed together, and a batch of `n` leaves
//! costs `O(n + depth)` hashes instead of `O(n · depth)`.

use std::collections::HashMap;

use thiserror::Error;

use crate::crypto::Hasher;
use crate::tree::Node;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors and verdicts
// ---------------------------------------------------------------------------

/// Structural failures of tree operations.
///
/// These are programmer/caller errors — out-of-range indices, degenerate
/// batches — and are kept strictly apart from the semantic safety verdicts
/// the ledger produces. A `TreeError` aborts whatever was being built; it is
/// never something a fraud proof argues about.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// A leaf index at or beyond the tree's capacity.
    #[error("leaf index {index} out of range for set size {set_size}")]
    IndexOutOfRange {
        /// The offending index.
        index: u64,
        /// Number of leaf slots in the tree.
        set_size: u64,
    },

    /// An update or root computation over zero leaves.
    #[error("empty batch")]
    EmptyBatch,

    /// A contiguous run that does not fit in the tree.
    #[error("batch of {len} leaves at offset {offset} exceeds set size {set_size}")]
    BatchOutOfRange {
        /// First leaf index of the run.
        offset: u64,
        /// Number of leaves in the run.
        len: u64,
        /// Number of leaf slots in the tree.
        set_size: u64,
    },

    /// A subtree witness request whose leaf group straddles a subtree
    /// boundary.
    #[error("bad merge alignment")]
    BadMergeAlignment,

    /// A subtree witness request deeper than the tree itself.
    #[error("subtree depth {subtree_depth} exceeds tree depth {depth}")]
    SubtreeTooDeep {
        /// Requested subtree depth.
        subtree_depth: usize,
        /// Full depth of the tree.
        depth: usize,
    },
}

/// Outcome of re-verifying a witness against the current root.
///
/// The structural verdicts come first: a malformed witness is rejected for
/// its shape before any hashing happens, and each malformation has its own
/// code so a caller can tell "you handed me garbage" apart from "the root
/// moved". Only [`Included`](InclusionCheck::Included) means the witness
/// binds its leaf to the current root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InclusionCheck {
    /// The folded path reproduces the current root.
    Included,
    /// The fold was well-formed but produced a different root.
    RootMismatch,
    /// The witness carries no sibling nodes at all.
    EmptyWitness,
    /// `nodes` and `path` disagree in length.
    PathLengthMismatch,
    /// The sibling count does not match the declared (or required) depth.
    DepthMismatch,
    /// Raw leaf data was supplied but does not hash to the claimed leaf.
    LeafMismatch,
}

impl InclusionCheck {
    /// `true` only for [`InclusionCheck::Included`].
    pub fn is_included(self) -> bool {
        self == InclusionCheck::Included
    }
}

// ---------------------------------------------------------------------------
// Witness
// ---------------------------------------------------------------------------

/// Ordered sibling path from a leaf (or subtree root) to the tree root.
///
/// `nodes` holds one sibling per level in leaf-to-root order; `path[i]` is
/// `true` when the *sibling* sits on the right of the fold at level `i`
/// (equivalently, the known node is on the left). `depth` is the number of
/// levels the path climbs — shorter than the full tree depth for subtree
/// witnesses. `data`, when present, is the raw preimage of `leaf` so a
/// verifier can re-derive the leaf hash instead of trusting it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    /// Per-level fold direction; `true` ⇒ sibling is the right operand.
    pub path: Vec<bool>,
    /// Sibling hashes, leaf-to-root order.
    pub nodes: Vec<Node>,
    /// The leaf (or subtree root) value the path starts from.
    pub leaf: Node,
    /// Index of the leaf (or subtree) at its level.
    pub index: u64,
    /// Raw preimage of `leaf`, if the caller wants it re-checked.
    pub data: Option<Vec<u8>>,
    /// Number of levels the path climbs; `None` means the full tree depth.
    pub depth: Option<usize>,
}

// ---------------------------------------------------------------------------
// MerkleTree
// ---------------------------------------------------------------------------

/// Fixed-depth sparse Merkle tree over `2^depth` leaf slots.
///
/// Levels are sparse maps from index to node; anything absent equals the
/// zero-subtree value for its level. The zeros table is owned per instance —
/// two trees of the same depth are fully independent.
pub struct MerkleTree {
    depth: usize,
    set_size: u64,
    hasher: Hasher,
    zeros: Vec<Node>,
    levels: Vec<HashMap<u64, Node>>,
}

impl MerkleTree {
    /// Create an empty tree of the given depth (`2^depth` leaf slots).
    ///
    /// Depth 0 is a single leaf. Depths above 63 cannot be indexed by `u64`
    /// and are rejected at construction.
    pub fn new(depth: usize) -> Self {
        assert!(depth < 64, "tree depth must fit u64 leaf indices");
        let hasher = Hasher::new();
        let zeros = hasher.zeros(depth);
        MerkleTree {
            depth,
            set_size: 1u64 << depth,
            hasher,
            zeros,
            levels: vec![HashMap::new(); depth + 1],
        }
    }

    /// The tree depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of leaf slots (`2^depth`).
    pub fn set_size(&self) -> u64 {
        self.set_size
    }

    /// The zero-subtree table, root level first.
    pub fn zeros(&self) -> &[Node] {
        &self.zeros
    }

    /// The current root.
    pub fn root(&self) -> Node {
        self.get_node(0, 0)
    }

    /// Sparse lookup: the node at `(level, index)`, falling back to the
    /// level's zero-subtree value.
    pub fn get_node(&self, level: usize, index: u64) -> Node {
        self.levels[level]
            .get(&index)
            .copied()
            .unwrap_or(self.zeros[level])
    }

    /// `true` iff the node at `(level, index)` equals its level's zero value.
    pub fn is_zero(&self, level: usize, index: u64) -> bool {
        self.get_node(level, index) == self.zeros[level]
    }

    // -- updates ------------------------------------------------------------

    /// Overwrite one leaf and recompute its ancestors up to the root.
    pub fn update_single(&mut self, index: u64, leaf: Node) -> Result<(), TreeError> {
        if index >= self.set_size {
            return Err(TreeError::IndexOutOfRange {
                index,
                set_size: self.set_size,
            });
        }
        self.levels[self.depth].insert(index, leaf);
        self.ascend(index, 1);
        Ok(())
    }

    /// Hash raw data to a leaf, then update as [`update_single`](Self::update_single).
    pub fn insert_single(&mut self, index: u64, data: &[u8]) -> Result<(), TreeError> {
        self.update_single(index, self.hasher.hash(data))
    }

    /// Write a contiguous run of leaves, then recompute ancestors in one
    /// combined pass.
    ///
    /// Produces a root identical to applying [`update_single`](Self::update_single)
    /// once per leaf in order, at a fraction of the hashing cost.
    pub fn update_batch(&mut self, offset: u64, leaves: &[Node]) -> Result<(), TreeError> {
        let len = leaves.len() as u64;
        if len == 0 {
            return Err(TreeError::EmptyBatch);
        }
        if offset + len > self.set_size {
            return Err(TreeError::BatchOutOfRange {
                offset,
                len,
                set_size: self.set_size,
            });
        }
        for (i, leaf) in leaves.iter().enumerate() {
            self.levels[self.depth].insert(offset + i as u64, *leaf);
        }
        self.ascend(offset, len);
        Ok(())
    }

    /// Hash each raw datum to a leaf, then update as
    /// [`update_batch`](Self::update_batch).
    pub fn insert_batch<T: AsRef<[u8]>>(&mut self, offset: u64, data: &[T]) -> Result<(), TreeError> {
        let leaves: Vec<Node> = data.iter().map(|d| self.hasher.hash(d.as_ref())).collect();
        self.update_batch(offset, &leaves)
    }

    /// Recompute all ancestors of the modified run `[offset, offset + len)`.
    ///
    /// At each level the run is widened to pair boundaries: one left if it
    /// starts odd, one right if its length is odd. Every pair in the widened
    /// run is rehashed into its parent, then offset and length halve.
    fn ascend(&mut self, mut offset: u64, mut len: u64) {
        for level in (1..=self.depth).rev() {
            if offset & 1 == 1 {
                offset -= 1;
                len += 1;
            }
            if len & 1 == 1 {
                len += 1;
            }
            let mut node = offset;
            while node < offset + len {
                self.update_couple(level, node);
                node += 2;
            }
            offset >>= 1;
            len >>= 1;
        }
    }

    /// Rehash the sibling pair containing `(level, index)` into its parent.
    fn update_couple(&mut self, level: usize, index: u64) {
        let left = index & !1;
        let parent = self
            .hasher
            .hash2(self.get_node(level, left), self.get_node(level, left + 1));
        self.levels[level - 1].insert(index >> 1, parent);
    }

    // -- witnesses ----------------------------------------------------------

    /// Construct the full-depth witness for a leaf.
    pub fn witness(&self, index: u64) -> Witness {
        self.witness_at_depth(index, self.depth)
    }

    /// Construct a witness starting at `depth` levels below the root.
    ///
    /// At each level the sibling index is the current index with its low bit
    /// flipped; the recorded path bit says whether that sibling is the right
    /// operand of the fold. Nodes come out in leaf-to-root order.
    pub fn witness_at_depth(&self, index: u64, depth: usize) -> Witness {
        let leaf = self.get_node(depth, index);
        let mut path = Vec::with_capacity(depth);
        let mut nodes = Vec::with_capacity(depth);
        let mut node_index = index;
        for i in 0..depth {
            node_index ^= 1;
            nodes.push(self.get_node(depth - i, node_index));
            path.push(node_index & 1 == 1);
            node_index >>= 1;
        }
        Witness {
            path,
            nodes,
            leaf,
            index,
            data: None,
            depth: Some(depth),
        }
    }

    /// Witness for a group of `2^subtree_depth` contiguous leaves.
    ///
    /// The group must sit exactly on a subtree boundary; the returned
    /// witness is for the subtree's root node at `depth - subtree_depth`.
    pub fn witness_for_batch(
        &self,
        merge_offset: u64,
        subtree_depth: usize,
    ) -> Result<Witness, TreeError> {
        if subtree_depth > self.depth {
            return Err(TreeError::SubtreeTooDeep {
                subtree_depth,
                depth: self.depth,
            });
        }
        let merge_size = 1u64 << subtree_depth;
        let upper = merge_offset + merge_size;
        if merge_offset >> subtree_depth != (upper - 1) >> subtree_depth {
            return Err(TreeError::BadMergeAlignment);
        }
        Ok(self.witness_at_depth(merge_offset >> subtree_depth, self.depth - subtree_depth))
    }

    /// Re-verify a witness against the current root.
    ///
    /// Shape checks run before any hashing: sibling/path length agreement,
    /// sibling count against the declared depth, and — when raw data is
    /// supplied — that the data hashes to the claimed leaf. A well-formed
    /// witness is then folded level by level (`path[i]` true ⇒
    /// `hash2(acc, sibling)`, else `hash2(sibling, acc)`) and compared to
    /// the root.
    pub fn check_inclusion(&self, witness: &Witness) -> InclusionCheck {
        if witness.nodes.is_empty() {
            return InclusionCheck::EmptyWitness;
        }
        if witness.nodes.len() != witness.path.len() {
            return InclusionCheck::PathLengthMismatch;
        }
        if let Some(data) = &witness.data {
            if witness.nodes.len() != self.depth {
                return InclusionCheck::DepthMismatch;
            }
            if self.hasher.hash(data) != witness.leaf {
                return InclusionCheck::LeafMismatch;
            }
        }
        let depth = witness.depth.unwrap_or(self.depth);
        if witness.nodes.len() != depth {
            return InclusionCheck::DepthMismatch;
        }
        let mut acc = witness.leaf;
        for (node, on_right) in witness.nodes.iter().zip(&witness.path) {
            acc = if *on_right {
                self.hasher.hash2(acc, *node)
            } else {
                self.hasher.hash2(*node, acc)
            };
        }
        if acc == self.root() {
            InclusionCheck::Included
        } else {
            InclusionCheck::RootMismatch
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! # Sparse Merkle Accumulator
//!
//! The authenticated data structure both sides of a dispute agree on.
//!
//! ```text
//! node.rs   — Node: the 32-byte hash value stored at every tree position
//! merkle.rs — MerkleTree: fixed-depth sparse tree, updates, witnesses,
//!             inclusion re-verification
//! ```
//!
//! The batch producer uses the tree to build new roots and extract the
//! per-transaction witnesses a fraud proof needs; a challenger rebuilds the
//! same tree independently and must land on the same bytes. Everything here
//! is deterministic and single-writer — see the ledger module for how one
//! instance is owned and mutated.

pub mod merkle;
pub mod node;

pub use merkle::{InclusionCheck, MerkleTree, TreeError, Witness};
pub use node::{Node, NodeParseError};

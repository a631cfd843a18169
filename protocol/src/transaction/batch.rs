//! Batch serialization, commitments, and transaction trees.
//!
//! A submitted batch travels as the raw concatenation of its records — no
//! length prefixes, no framing — together with a keccak commitment over the
//! whole byte string. The header the base ledger stores carries that
//! commitment plus the Merkle root of the per-transaction hashes, so a
//! challenger can later bind any single transaction to the batch it came
//! from.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::keccak256;
use crate::transaction::types::{BatchType, DepositNewAccount, Tx};
use crate::tree::{MerkleTree, Node, TreeError};

/// Failures of batch (de)serialization.
///
/// Structural, like [`TreeError`]: a malformed byte string aborts whatever
/// consumed it and is never folded into a safety verdict.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchCodecError {
    /// A batch of zero transactions.
    #[error("empty transaction batch")]
    EmptyBatch,

    /// Serialized bytes that do not divide into whole records.
    #[error("serialized batch has {trailing} trailing bytes beyond the last whole record")]
    ExcessData {
        /// Byte count past the final complete record.
        trailing: usize,
    },
}

/// Serialize a batch: concatenated records plus the keccak commitment over
/// the concatenation.
///
/// The commitment is what the base ledger checks a submitted byte string
/// against before interpreting it.
pub fn serialize_batch<T: Tx>(txs: &[T]) -> Result<(Vec<u8>, Node), BatchCodecError> {
    if txs.is_empty() {
        return Err(BatchCodecError::EmptyBatch);
    }
    let mut bytes = Vec::with_capacity(txs.len() * T::RECORD_BYTES);
    for tx in txs {
        tx.encode_into(&mut bytes);
    }
    let commitment = Node(keccak256(&bytes));
    Ok((bytes, commitment))
}

/// Number of whole records in a serialized batch.
pub fn batch_size<T: Tx>(bytes: &[u8]) -> usize {
    bytes.len() / T::RECORD_BYTES
}

/// `true` if the byte string does not divide into whole records.
pub fn has_excess_data<T: Tx>(bytes: &[u8]) -> bool {
    bytes.len() % T::RECORD_BYTES != 0
}

/// Decode a serialized batch back into records.
///
/// Rejects empty input and any trailing bytes past the last whole record.
pub fn decode_batch<T: Tx>(bytes: &[u8]) -> Result<Vec<T>, BatchCodecError> {
    if bytes.is_empty() {
        return Err(BatchCodecError::EmptyBatch);
    }
    let trailing = bytes.len() % T::RECORD_BYTES;
    if trailing != 0 {
        return Err(BatchCodecError::ExcessData { trailing });
    }
    Ok(bytes
        .chunks_exact(T::RECORD_BYTES)
        .map(T::decode_record)
        .collect())
}

/// Smallest tree depth that fits `n` leaves: `ceil(log2(n))`.
fn batch_depth(n: usize) -> usize {
    if n <= 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as usize
    }
}

/// Build the transaction tree for a batch and return it.
///
/// Depth is the smallest that fits the batch; leaves are the records'
/// hashes in order, and slots past the batch stay at the zero value.
fn batch_tree<T: Tx>(txs: &[T]) -> Result<MerkleTree, TreeError> {
    if txs.is_empty() {
        return Err(TreeError::EmptyBatch);
    }
    let mut tree = MerkleTree::new(batch_depth(txs.len()));
    for (i, tx) in txs.iter().enumerate() {
        tree.update_single(i as u64, tx.hash())?;
    }
    Ok(tree)
}

/// Root of the batch's transaction tree (`txRoot` in the header).
pub fn tx_root<T: Tx>(txs: &[T]) -> Result<Node, TreeError> {
    Ok(batch_tree(txs)?.root())
}

/// Sibling path binding transaction `index` to the batch's `txRoot`.
pub fn tx_witness<T: Tx>(index: u64, txs: &[T]) -> Result<Vec<Node>, TreeError> {
    Ok(batch_tree(txs)?.witness(index).nodes)
}

/// Root of the deposit queue tree: leaves are deposit-queue hashes (slot
/// assignments excluded), written as one contiguous run.
pub fn deposit_root(txs: &[DepositNewAccount]) -> Result<Node, TreeError> {
    if txs.is_empty() {
        return Err(TreeError::EmptyBatch);
    }
    let leaves: Vec<Node> = txs.iter().map(DepositNewAccount::deposit_hash).collect();
    let mut tree = MerkleTree::new(batch_depth(txs.len()));
    tree.update_batch(0, &leaves)?;
    Ok(tree.root())
}

// ---------------------------------------------------------------------------
// BatchHeader
// ---------------------------------------------------------------------------

/// The record the base ledger stores per submitted batch.
///
/// This library only produces and checks headers; sequencing, staking, and
/// the dispute window live in the base-ledger contract. During a dispute the
/// contract re-derives `new_state_root` from `prior_state_root` plus the
/// serialized batch and this engine's proof bundle, and rolls the batch back
/// when they disagree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchHeader {
    /// Which transition function the batch runs through.
    pub batch_type: BatchType,
    /// State root the batch builds on.
    pub prior_state_root: Node,
    /// State root the coordinator claims after applying the batch.
    pub new_state_root: Node,
    /// Registry identity of the submitting coordinator.
    pub coordinator_id: u32,
    /// Position of the batch in the rollup's sequence.
    pub batch_index: u64,
    /// Root of the batch's transaction tree.
    pub tx_root: Node,
    /// Keccak commitment over the serialized batch bytes.
    pub tx_commitment: Node,
}

impl BatchHeader {
    /// Check a serialized byte string against the stored commitment.
    pub fn commitment_matches(&self, serialized: &[u8]) -> bool {
        Node(keccak256(serialized)) == self.tx_commitment
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

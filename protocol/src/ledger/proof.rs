//! Proof bundles emitted by batch application.
//!
//! The dispute contract consumes fixed-shape arrays: one pre-state account
//! word and one witness per touched slot per transaction, plus the overall
//! safety verdict. Shapes are preserved even when a batch short-circuits —
//! slots after the first unsafe transaction carry the placeholder proof so
//! array lengths always equal the batch length.

use serde::{Deserialize, Serialize};

use crate::account::AccountWord;
use crate::tree::Node;

/// Proof material for one two-slot transaction (transfer-shaped).
///
/// Accounts and witnesses are captured *before* the mutation they prove:
/// the sender witness against the pre-transaction tree, the receiver witness
/// after the sender write-back but before the receiver's own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxProof {
    /// Sender's pre-state word (or the empty sentinel).
    pub sender_account: AccountWord,
    /// Receiver's pre-state word (or the empty sentinel).
    pub receiver_account: AccountWord,
    /// Sibling path for the sender slot.
    pub sender_witness: Vec<Node>,
    /// Sibling path for the receiver slot.
    pub receiver_witness: Vec<Node>,
    /// Whether this transaction was a legitimate transition.
    pub safe: bool,
}

/// Column-major proof arrays for a whole transfer-shaped batch.
///
/// The verifier contract reads parallel arrays, not an array of structs,
/// so the batch form stores them that way.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxProofBatch {
    /// Per-transaction sender pre-state words.
    pub sender_accounts: Vec<AccountWord>,
    /// Per-transaction receiver pre-state words.
    pub receiver_accounts: Vec<AccountWord>,
    /// Per-transaction sender witnesses.
    pub sender_witnesses: Vec<Vec<Node>>,
    /// Per-transaction receiver witnesses.
    pub receiver_witnesses: Vec<Vec<Node>>,
    /// Verdict for the batch: `true` iff every applied transaction was safe.
    pub safe: bool,
}

impl TxProofBatch {
    pub(crate) fn with_capacity(n: usize) -> Self {
        TxProofBatch {
            sender_accounts: Vec::with_capacity(n),
            receiver_accounts: Vec::with_capacity(n),
            sender_witnesses: Vec::with_capacity(n),
            receiver_witnesses: Vec::with_capacity(n),
            safe: true,
        }
    }

    pub(crate) fn push(&mut self, proof: TxProof) {
        self.sender_accounts.push(proof.sender_account);
        self.receiver_accounts.push(proof.receiver_account);
        self.sender_witnesses.push(proof.sender_witness);
        self.receiver_witnesses.push(proof.receiver_witness);
    }

    /// Number of transaction slots in the bundle.
    pub fn len(&self) -> usize {
        self.sender_accounts.len()
    }

    /// `true` when the bundle covers no transactions.
    pub fn is_empty(&self) -> bool {
        self.sender_accounts.is_empty()
    }
}

/// Proof material for one single-slot transaction (deposit-shaped).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositProof {
    /// The slot's pre-state word (or the empty sentinel).
    pub account: AccountWord,
    /// Sibling path for the slot, pre-mutation.
    pub witness: Vec<Node>,
    /// Whether this transaction was a legitimate transition.
    pub safe: bool,
}

/// Column-major proof arrays for a whole deposit-shaped batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositProofBatch {
    /// Per-transaction pre-state words.
    pub accounts: Vec<AccountWord>,
    /// Per-transaction witnesses.
    pub witnesses: Vec<Vec<Node>>,
    /// Verdict for the batch.
    pub safe: bool,
}

impl DepositProofBatch {
    pub(crate) fn with_capacity(n: usize) -> Self {
        DepositProofBatch {
            accounts: Vec::with_capacity(n),
            witnesses: Vec::with_capacity(n),
            safe: true,
        }
    }

    pub(crate) fn push(&mut self, proof: DepositProof) {
        self.accounts.push(proof.account);
        self.witnesses.push(proof.witness);
    }

    /// Number of transaction slots in the bundle.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// `true` when the bundle covers no transactions.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

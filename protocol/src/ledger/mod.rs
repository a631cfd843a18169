//! # State Ledger — Batch State-Transition Engine
//!
//! One [`StateLedger`] owns one state tree and one sparse map from slot
//! index to [`Account`]. A batch producer drives it to build the next state
//! root and collect per-transaction witnesses; a challenger constructs an
//! identical ledger from the same history and must land on the same root
//! and the same verdict, bit for bit.
//!
//! ## Two kinds of failure
//!
//! Structural errors (out-of-range slot, zero-length batch) come back as
//! [`LedgerError`] and mean the batch should never have been built. Semantic
//! unsafety (insufficient balance, token mismatch, occupancy conflicts) is a
//! *result*, not an error: the transaction's proof carries `safe = false`
//! plus the witness material a third party needs to confirm the verdict
//! independently.
//!
//! ## Short-circuit, fixed shape
//!
//! Batch application folds over the transactions carrying a `safe` flag.
//! From the first unsafe transaction on, nothing further touches the tree or
//! the account map, but the output arrays keep the batch's full length —
//! remaining slots are filled with the placeholder proof (empty-account
//! sentinel plus an all-zero witness), because the on-chain verifier
//! consumes fixed-shape arrays.
//!
//! A ledger is a single-writer structure: batches are strictly sequential,
//! and later transactions may observe slots mutated by earlier ones in the
//! same batch.

pub mod proof;

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::account::{Account, AccountWord, EMPTY_ACCOUNT_WORD};
use crate::transaction::{CreateAndTransfer, DepositNewAccount, DepositTopUp, Transfer};
use crate::tree::{MerkleTree, Node, TreeError};

pub use proof::{DepositProof, DepositProofBatch, TxProof, TxProofBatch};

/// Structural failures of ledger operations.
///
/// Never produced for semantically unsafe transactions — those come back as
/// `safe = false` inside a proof.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Account creation aimed at an occupied slot.
    #[error("state slot {state_id} is in use")]
    SlotInUse {
        /// The occupied slot.
        state_id: u64,
    },

    /// A batch of zero transactions.
    #[error("empty transaction batch")]
    EmptyBatch,

    /// An underlying tree failure (out-of-range slot index).
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// The account state tree plus the accounts living in it.
///
/// Invariant: every occupied slot's tree leaf equals the hash of its
/// account's canonical encoding; every unoccupied slot sits at the zero
/// value for leaf level.
pub struct StateLedger {
    tree: MerkleTree,
    accounts: HashMap<u64, Account>,
}

impl StateLedger {
    /// Create an empty ledger over a state tree of the given depth.
    pub fn new(depth: usize) -> Self {
        StateLedger {
            tree: MerkleTree::new(depth),
            accounts: HashMap::new(),
        }
    }

    /// The current state root.
    pub fn root(&self) -> Node {
        self.tree.root()
    }

    /// Depth of the underlying state tree.
    pub fn depth(&self) -> usize {
        self.tree.depth()
    }

    /// `true` if an account occupies the slot.
    pub fn contains(&self, state_id: u64) -> bool {
        self.accounts.contains_key(&state_id)
    }

    /// The account at a slot, if any.
    pub fn account(&self, state_id: u64) -> Option<&Account> {
        self.accounts.get(&state_id)
    }

    /// The canonical word of the account at a slot, if any.
    pub fn account_encoded(&self, state_id: u64) -> Option<AccountWord> {
        self.accounts.get(&state_id).map(Account::encode)
    }

    /// Sibling path for a slot against the current root.
    ///
    /// Valid for empty slots too — that is exactly the witness a deposit
    /// proof needs.
    pub fn account_witness(&self, state_id: u64) -> Vec<Node> {
        self.tree.witness(state_id).nodes
    }

    /// Word and witness for an occupied slot in one call.
    pub fn account_proof(&self, state_id: u64) -> Option<(AccountWord, Vec<Node>)> {
        self.account_encoded(state_id)
            .map(|word| (word, self.account_witness(state_id)))
    }

    /// Place an account at an empty slot.
    ///
    /// Fails on an occupied slot or an out-of-range index; accounts are
    /// created exactly once per slot and there is no deletion.
    pub fn create_account(&mut self, state_id: u64, account: Account) -> Result<(), LedgerError> {
        if self.accounts.contains_key(&state_id) {
            return Err(LedgerError::SlotInUse { state_id });
        }
        let account = account.with_state_id(state_id);
        self.tree.update_single(state_id, account.state_leaf())?;
        self.accounts.insert(state_id, account);
        Ok(())
    }

    // -- internals ----------------------------------------------------------

    /// Range-check a transaction's slot index against the tree.
    fn checked_slot(&self, slot: u32) -> Result<u64, TreeError> {
        let index = u64::from(slot);
        if index >= self.tree.set_size() {
            return Err(TreeError::IndexOutOfRange {
                index,
                set_size: self.tree.set_size(),
            });
        }
        Ok(index)
    }

    /// The all-zero witness used for batch slots past the first unsafe
    /// transaction, sized to this ledger's depth.
    fn placeholder_witness(&self) -> Vec<Node> {
        vec![Node::ZERO; self.tree.depth()]
    }

    fn placeholder_tx_proof(&self) -> TxProof {
        TxProof {
            sender_account: EMPTY_ACCOUNT_WORD,
            receiver_account: EMPTY_ACCOUNT_WORD,
            sender_witness: self.placeholder_witness(),
            receiver_witness: self.placeholder_witness(),
            safe: false,
        }
    }

    fn placeholder_deposit_proof(&self) -> DepositProof {
        DepositProof {
            account: EMPTY_ACCOUNT_WORD,
            witness: self.placeholder_witness(),
            safe: false,
        }
    }

    /// Write an account back to its slot, map and tree together.
    fn write_account(&mut self, state_id: u64, account: Account) -> Result<(), TreeError> {
        let leaf = account.state_leaf();
        self.accounts.insert(state_id, account);
        self.tree.update_single(state_id, leaf)
    }

    // -- transfer -----------------------------------------------------------

    /// Apply one transfer.
    ///
    /// Unsafe when either slot is empty, the sender balance is short, or
    /// the token ids differ. On the safe path the sender is debited and
    /// written back before the receiver witness is taken, then the receiver
    /// is credited.
    pub fn apply_transfer(&mut self, tx: &Transfer) -> Result<TxProof, LedgerError> {
        let sender_id = self.checked_slot(tx.sender)?;
        let receiver_id = self.checked_slot(tx.receiver)?;

        let sender_witness = self.tree.witness(sender_id).nodes;
        let Some(mut sender) = self.accounts.get(&sender_id).cloned() else {
            return Ok(TxProof {
                sender_account: EMPTY_ACCOUNT_WORD,
                receiver_account: EMPTY_ACCOUNT_WORD,
                sender_witness,
                receiver_witness: self.placeholder_witness(),
                safe: false,
            });
        };
        let sender_encoded = sender.encode();

        let Some(receiver_before) = self.accounts.get(&receiver_id).cloned() else {
            let receiver_witness = self.tree.witness(receiver_id).nodes;
            return Ok(TxProof {
                sender_account: sender_encoded,
                receiver_account: EMPTY_ACCOUNT_WORD,
                sender_witness,
                receiver_witness,
                safe: false,
            });
        };

        if sender.balance < tx.amount || sender.token_id != receiver_before.token_id {
            return Ok(TxProof {
                sender_account: sender_encoded,
                receiver_account: EMPTY_ACCOUNT_WORD,
                sender_witness,
                receiver_witness: self.placeholder_witness(),
                safe: false,
            });
        }

        sender.balance -= tx.amount;
        sender.nonce += 1;
        self.write_account(sender_id, sender)?;

        let receiver_witness = self.tree.witness(receiver_id).nodes;
        // Re-read after the sender write-back so a self-transfer observes
        // its own debit.
        let mut receiver = self
            .accounts
            .get(&receiver_id)
            .cloned()
            .unwrap_or(receiver_before);
        let receiver_encoded = receiver.encode();
        receiver.balance = receiver.balance.wrapping_add(tx.amount);
        self.write_account(receiver_id, receiver)?;

        Ok(TxProof {
            sender_account: sender_encoded,
            receiver_account: receiver_encoded,
            sender_witness,
            receiver_witness,
            safe: true,
        })
    }

    /// Apply a transfer batch, short-circuiting on the first unsafe
    /// transaction while preserving the output shape.
    pub fn apply_transfer_batch(&mut self, txs: &[Transfer]) -> Result<TxProofBatch, LedgerError> {
        if txs.is_empty() {
            return Err(LedgerError::EmptyBatch);
        }
        for tx in txs {
            self.checked_slot(tx.sender)?;
            self.checked_slot(tx.receiver)?;
        }
        debug!(len = txs.len(), root = %self.root(), "applying transfer batch");

        let mut batch = TxProofBatch::with_capacity(txs.len());
        let mut safe = true;
        for (i, tx) in txs.iter().enumerate() {
            if safe {
                let proof = self.apply_transfer(tx)?;
                safe = proof.safe;
                batch.push(proof);
                if !safe {
                    debug!(index = i, "transfer batch went unsafe");
                }
            } else {
                batch.push(self.placeholder_tx_proof());
            }
        }
        batch.safe = safe;
        Ok(batch)
    }

    // -- deposit: new account ----------------------------------------------

    /// Apply one account-creating deposit.
    ///
    /// Unsafe when the target slot is occupied (the existing occupant's
    /// word and witness come back as the fraud evidence; the tree is left
    /// alone). On the safe path the pre-creation witness proves the slot
    /// was empty.
    pub fn apply_deposit_new(
        &mut self,
        tx: &DepositNewAccount,
    ) -> Result<DepositProof, LedgerError> {
        let state_id = self.checked_slot(tx.state_id)?;
        let witness = self.tree.witness(state_id).nodes;

        if let Some(existing) = self.accounts.get(&state_id) {
            return Ok(DepositProof {
                account: existing.encode(),
                witness,
                safe: false,
            });
        }

        let account = Account::new(tx.account_id, tx.token_id, tx.amount, 0);
        self.write_account(state_id, account.with_state_id(state_id))?;
        Ok(DepositProof {
            account: EMPTY_ACCOUNT_WORD,
            witness,
            safe: true,
        })
    }

    /// Apply an account-creating deposit batch.
    pub fn apply_deposit_new_batch(
        &mut self,
        txs: &[DepositNewAccount],
    ) -> Result<DepositProofBatch, LedgerError> {
        if txs.is_empty() {
            return Err(LedgerError::EmptyBatch);
        }
        for tx in txs {
            self.checked_slot(tx.state_id)?;
        }
        debug!(len = txs.len(), root = %self.root(), "applying deposit batch");

        let mut batch = DepositProofBatch::with_capacity(txs.len());
        let mut safe = true;
        for (i, tx) in txs.iter().enumerate() {
            if safe {
                let proof = self.apply_deposit_new(tx)?;
                safe = proof.safe;
                batch.push(proof);
                if !safe {
                    debug!(index = i, "deposit batch went unsafe");
                }
            } else {
                batch.push(self.placeholder_deposit_proof());
            }
        }
        batch.safe = safe;
        Ok(batch)
    }

    // -- deposit: top-up ----------------------------------------------------

    /// Apply one top-up deposit.
    ///
    /// Unsafe when the slot is empty or the token ids differ. The returned
    /// word and witness are the pre-mutation state either way.
    pub fn apply_top_up(&mut self, tx: &DepositTopUp) -> Result<DepositProof, LedgerError> {
        let state_id = self.checked_slot(tx.state_id)?;
        let witness = self.tree.witness(state_id).nodes;

        let Some(mut account) = self.accounts.get(&state_id).cloned() else {
            return Ok(DepositProof {
                account: EMPTY_ACCOUNT_WORD,
                witness,
                safe: false,
            });
        };
        let encoded = account.encode();

        if tx.token_id != account.token_id {
            return Ok(DepositProof {
                account: encoded,
                witness,
                safe: false,
            });
        }

        // TODO: treat balance overflow as its own fraud vector once the
        // verifier checks it; until then the credit wraps and the committed
        // word stays well-formed.
        account.balance = account.balance.wrapping_add(tx.amount);
        self.write_account(state_id, account)?;
        Ok(DepositProof {
            account: encoded,
            witness,
            safe: true,
        })
    }

    /// Apply a top-up batch.
    pub fn apply_top_up_batch(
        &mut self,
        txs: &[DepositTopUp],
    ) -> Result<DepositProofBatch, LedgerError> {
        if txs.is_empty() {
            return Err(LedgerError::EmptyBatch);
        }
        for tx in txs {
            self.checked_slot(tx.state_id)?;
        }
        debug!(len = txs.len(), root = %self.root(), "applying top-up batch");

        let mut batch = DepositProofBatch::with_capacity(txs.len());
        let mut safe = true;
        for (i, tx) in txs.iter().enumerate() {
            if safe {
                let proof = self.apply_top_up(tx)?;
                safe = proof.safe;
                batch.push(proof);
                if !safe {
                    debug!(index = i, "top-up batch went unsafe");
                }
            } else {
                batch.push(self.placeholder_deposit_proof());
            }
        }
        batch.safe = safe;
        Ok(batch)
    }

    // -- create-and-transfer ------------------------------------------------

    /// Apply one create-and-transfer.
    ///
    /// Unsafe when the sender slot is empty or the balance is short. When
    /// the receiver slot is already occupied, the sender debit is still
    /// committed to the tree before `safe = false` comes back — the
    /// receiver-occupied fraud proof is argued against the post-debit
    /// sender, unlike every other unsafe path. That branch performs no
    /// balance check, so the debit wraps.
    pub fn apply_create_and_transfer(
        &mut self,
        tx: &CreateAndTransfer,
    ) -> Result<TxProof, LedgerError> {
        let sender_id = self.checked_slot(tx.sender)?;
        let receiver_id = self.checked_slot(tx.receiver)?;

        let sender_witness = self.tree.witness(sender_id).nodes;
        let Some(mut sender) = self.accounts.get(&sender_id).cloned() else {
            return Ok(TxProof {
                sender_account: EMPTY_ACCOUNT_WORD,
                receiver_account: EMPTY_ACCOUNT_WORD,
                sender_witness,
                receiver_witness: self.placeholder_witness(),
                safe: false,
            });
        };
        let sender_encoded = sender.encode();
        let token_id = sender.token_id;

        if self.accounts.contains_key(&receiver_id) {
            sender.balance = sender.balance.wrapping_sub(tx.amount);
            sender.nonce += 1;
            self.write_account(sender_id, sender)?;

            let receiver_witness = self.tree.witness(receiver_id).nodes;
            let receiver_encoded = self
                .accounts
                .get(&receiver_id)
                .map(Account::encode)
                .unwrap_or(EMPTY_ACCOUNT_WORD);
            return Ok(TxProof {
                sender_account: sender_encoded,
                receiver_account: receiver_encoded,
                sender_witness,
                receiver_witness,
                safe: false,
            });
        }

        if sender.balance < tx.amount {
            return Ok(TxProof {
                sender_account: sender_encoded,
                receiver_account: EMPTY_ACCOUNT_WORD,
                sender_witness,
                receiver_witness: self.placeholder_witness(),
                safe: false,
            });
        }

        sender.balance -= tx.amount;
        sender.nonce += 1;
        self.write_account(sender_id, sender)?;

        // Witness for the still-empty receiver slot.
        let receiver_witness = self.tree.witness(receiver_id).nodes;
        let receiver = Account::new(tx.account_id, token_id, tx.amount, 0);
        self.write_account(receiver_id, receiver.with_state_id(receiver_id))?;

        Ok(TxProof {
            sender_account: sender_encoded,
            receiver_account: EMPTY_ACCOUNT_WORD,
            sender_witness,
            receiver_witness,
            safe: true,
        })
    }

    /// Apply a create-and-transfer batch.
    pub fn apply_create_and_transfer_batch(
        &mut self,
        txs: &[CreateAndTransfer],
    ) -> Result<TxProofBatch, LedgerError> {
        if txs.is_empty() {
            return Err(LedgerError::EmptyBatch);
        }
        for tx in txs {
            self.checked_slot(tx.sender)?;
            self.checked_slot(tx.receiver)?;
        }
        debug!(len = txs.len(), root = %self.root(), "applying create-and-transfer batch");

        let mut batch = TxProofBatch::with_capacity(txs.len());
        let mut safe = true;
        for (i, tx) in txs.iter().enumerate() {
            if safe {
                let proof = self.apply_create_and_transfer(tx)?;
                safe = proof.safe;
                batch.push(proof);
                if !safe {
                    debug!(index = i, "create-and-transfer batch went unsafe");
                }
            } else {
                batch.push(self.placeholder_tx_proof());
            }
        }
        batch.safe = safe;
        Ok(batch)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Hasher;

    const DEPTH: usize = 6;

    fn funded_ledger() -> StateLedger {
        let mut ledger = StateLedger::new(DEPTH);
        ledger
            .create_account(0, Account::new(10, 1, 100, 0))
            .unwrap();
        ledger
            .create_account(1, Account::new(11, 1, 100, 0))
            .unwrap();
        ledger.create_account(2, Account::new(12, 2, 50, 0)).unwrap();
        ledger
    }

    /// Recompute a root from a slot index, its leaf, and a sibling path —
    /// the fold the verifier contract runs.
    fn fold_root(index: u64, leaf: Node, nodes: &[Node]) -> Node {
        let hasher = Hasher::new();
        let mut acc = leaf;
        for (i, sibling) in nodes.iter().enumerate() {
            acc = if (index >> i) & 1 == 0 {
                hasher.hash2(acc, *sibling)
            } else {
                hasher.hash2(*sibling, acc)
            };
        }
        acc
    }

    #[test]
    fn create_account_occupies_slot() {
        let mut ledger = StateLedger::new(DEPTH);
        let before = ledger.root();
        ledger.create_account(5, Account::new(1, 1, 10, 0)).unwrap();
        assert_ne!(ledger.root(), before);
        assert!(ledger.contains(5));
        assert_eq!(ledger.account(5).unwrap().state_id, Some(5));
        assert_eq!(
            ledger.create_account(5, Account::new(2, 1, 10, 0)),
            Err(LedgerError::SlotInUse { state_id: 5 })
        );
    }

    #[test]
    fn create_account_out_of_range() {
        let mut ledger = StateLedger::new(3);
        let result = ledger.create_account(8, Account::new(1, 1, 10, 0));
        assert!(matches!(result, Err(LedgerError::Tree(_))));
        assert!(!ledger.contains(8));
    }

    #[test]
    fn transfer_moves_balance_and_bumps_nonce() {
        let mut ledger = funded_ledger();
        let prior_root = ledger.root();
        let proof = ledger
            .apply_transfer(&Transfer { sender: 0, receiver: 1, amount: 20 })
            .unwrap();

        assert!(proof.safe);
        let sender = ledger.account(0).unwrap();
        let receiver = ledger.account(1).unwrap();
        assert_eq!(sender.balance, 80);
        assert_eq!(sender.nonce, 1);
        assert_eq!(receiver.balance, 120);
        assert_eq!(receiver.nonce, 0);
        // Conservation.
        assert_eq!(sender.balance + receiver.balance, 200);

        // The sender witness folds the pre-state leaf to the prior root —
        // this is exactly what a challenger recomputes.
        let pre_sender = Account::decode(&proof.sender_account).unwrap();
        assert_eq!(pre_sender.balance, 100);
        assert_eq!(
            fold_root(0, pre_sender.state_leaf(), &proof.sender_witness),
            prior_root
        );
    }

    #[test]
    fn transfer_unsafe_paths_leave_state_alone() {
        let mut ledger = funded_ledger();
        let root = ledger.root();

        // Unknown sender.
        let proof = ledger
            .apply_transfer(&Transfer { sender: 9, receiver: 1, amount: 5 })
            .unwrap();
        assert!(!proof.safe);
        assert_eq!(proof.sender_account, EMPTY_ACCOUNT_WORD);
        assert_eq!(ledger.root(), root);

        // Unknown receiver: the empty slot's witness is part of the proof.
        let proof = ledger
            .apply_transfer(&Transfer { sender: 0, receiver: 9, amount: 5 })
            .unwrap();
        assert!(!proof.safe);
        assert_eq!(proof.receiver_account, EMPTY_ACCOUNT_WORD);
        assert_eq!(fold_root(9, Node::ZERO, &proof.receiver_witness), root);
        assert_eq!(ledger.root(), root);

        // Insufficient balance.
        let proof = ledger
            .apply_transfer(&Transfer { sender: 0, receiver: 1, amount: 1000 })
            .unwrap();
        assert!(!proof.safe);
        assert_eq!(ledger.root(), root);

        // Token mismatch (slot 2 holds token 2).
        let proof = ledger
            .apply_transfer(&Transfer { sender: 0, receiver: 2, amount: 5 })
            .unwrap();
        assert!(!proof.safe);
        assert_eq!(ledger.root(), root);
    }

    #[test]
    fn second_overdraft_transfer_is_unsafe() {
        // 20 moves fine, then 1000 from the same sender fails and the tree
        // stays where the first transfer left it.
        let mut ledger = funded_ledger();
        let first = ledger
            .apply_transfer(&Transfer { sender: 0, receiver: 1, amount: 20 })
            .unwrap();
        assert!(first.safe);
        let root_after_first = ledger.root();

        let second = ledger
            .apply_transfer(&Transfer { sender: 0, receiver: 1, amount: 1000 })
            .unwrap();
        assert!(!second.safe);
        assert_eq!(ledger.root(), root_after_first);
        assert_eq!(ledger.account(0).unwrap().balance, 80);
        assert_eq!(ledger.account(1).unwrap().balance, 120);
    }

    #[test]
    fn transfer_batch_short_circuit_shape() {
        let mut ledger = funded_ledger();
        let txs = [
            Transfer { sender: 0, receiver: 1, amount: 10 },
            Transfer { sender: 1, receiver: 0, amount: 5 },
            Transfer { sender: 0, receiver: 1, amount: 9999 }, // first unsafe
            Transfer { sender: 1, receiver: 0, amount: 1 },    // never applied
        ];
        let batch = ledger.apply_transfer_batch(&txs).unwrap();

        assert!(!batch.safe);
        assert_eq!(batch.len(), 4);
        // Slots 0..3 are real proofs, slot 3 is the placeholder.
        assert_ne!(batch.sender_accounts[2], EMPTY_ACCOUNT_WORD);
        assert_eq!(batch.sender_accounts[3], EMPTY_ACCOUNT_WORD);
        assert_eq!(batch.sender_witnesses[3], vec![Node::ZERO; DEPTH]);
        assert_eq!(batch.receiver_witnesses[3], vec![Node::ZERO; DEPTH]);

        // State reflects only the two applied transfers.
        assert_eq!(ledger.account(0).unwrap().balance, 95);
        assert_eq!(ledger.account(1).unwrap().balance, 105);
        assert_eq!(ledger.account(0).unwrap().nonce, 1);
        assert_eq!(ledger.account(1).unwrap().nonce, 1);
    }

    #[test]
    fn batch_structural_errors_abort_before_any_mutation() {
        let mut ledger = funded_ledger();
        let root = ledger.root();

        assert_eq!(
            ledger.apply_transfer_batch(&[]),
            Err(LedgerError::EmptyBatch)
        );

        // Second transaction is out of range; the first must not run.
        let txs = [
            Transfer { sender: 0, receiver: 1, amount: 10 },
            Transfer { sender: 0, receiver: 64, amount: 10 },
        ];
        assert!(matches!(
            ledger.apply_transfer_batch(&txs),
            Err(LedgerError::Tree(TreeError::IndexOutOfRange { .. }))
        ));
        assert_eq!(ledger.root(), root);
        assert_eq!(ledger.account(0).unwrap().balance, 100);
    }

    #[test]
    fn self_transfer_conserves_balance() {
        let mut ledger = funded_ledger();
        let proof = ledger
            .apply_transfer(&Transfer { sender: 0, receiver: 0, amount: 30 })
            .unwrap();
        assert!(proof.safe);
        let account = ledger.account(0).unwrap();
        assert_eq!(account.balance, 100);
        assert_eq!(account.nonce, 1);
    }

    #[test]
    fn deposit_new_fills_empty_slot() {
        let mut ledger = StateLedger::new(DEPTH);
        let prior_root = ledger.root();
        let tx = DepositNewAccount { account_id: 42, token_id: 3, amount: 500, state_id: 7 };
        let proof = ledger.apply_deposit_new(&tx).unwrap();

        assert!(proof.safe);
        assert_eq!(proof.account, EMPTY_ACCOUNT_WORD);
        // Pre-creation witness proves the slot was empty.
        assert_eq!(fold_root(7, Node::ZERO, &proof.witness), prior_root);

        let account = ledger.account(7).unwrap();
        assert_eq!(account.account_id, 42);
        assert_eq!(account.token_id, 3);
        assert_eq!(account.balance, 500);
        assert_eq!(account.nonce, 0);
    }

    #[test]
    fn deposit_new_to_occupied_slot_is_unsafe() {
        let mut ledger = funded_ledger();
        let root = ledger.root();
        let tx = DepositNewAccount { account_id: 42, token_id: 3, amount: 500, state_id: 0 };
        let proof = ledger.apply_deposit_new(&tx).unwrap();

        assert!(!proof.safe);
        // The occupant's own word and witness are the fraud evidence.
        assert_eq!(proof.account, ledger.account_encoded(0).unwrap());
        let occupant = ledger.account(0).unwrap();
        assert_eq!(fold_root(0, occupant.state_leaf(), &proof.witness), root);
        assert_eq!(ledger.root(), root);
    }

    #[test]
    fn deposit_batch_stops_at_occupied_slot() {
        let mut ledger = funded_ledger();
        let txs = [
            DepositNewAccount { account_id: 40, token_id: 1, amount: 10, state_id: 10 },
            DepositNewAccount { account_id: 41, token_id: 1, amount: 10, state_id: 1 }, // occupied
            DepositNewAccount { account_id: 42, token_id: 1, amount: 10, state_id: 11 },
        ];
        let batch = ledger.apply_deposit_new_batch(&txs).unwrap();

        assert!(!batch.safe);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.accounts[2], EMPTY_ACCOUNT_WORD);
        assert_eq!(batch.witnesses[2], vec![Node::ZERO; DEPTH]);
        assert!(ledger.contains(10));
        assert!(!ledger.contains(11));
    }

    #[test]
    fn top_up_credits_existing_account() {
        let mut ledger = funded_ledger();
        let proof = ledger
            .apply_top_up(&DepositTopUp { state_id: 0, token_id: 1, amount: 25 })
            .unwrap();

        assert!(proof.safe);
        // The returned word is the pre-mutation state.
        assert_eq!(Account::decode(&proof.account).unwrap().balance, 100);
        assert_eq!(ledger.account(0).unwrap().balance, 125);
        assert_eq!(ledger.account(0).unwrap().nonce, 0);
    }

    #[test]
    fn top_up_empty_slot_is_unsafe_and_root_unchanged() {
        let mut ledger = funded_ledger();
        let root = ledger.root();
        let proof = ledger
            .apply_top_up(&DepositTopUp { state_id: 20, token_id: 1, amount: 25 })
            .unwrap();

        assert!(!proof.safe);
        assert_eq!(proof.account, EMPTY_ACCOUNT_WORD);
        assert_eq!(ledger.root(), root);
    }

    #[test]
    fn top_up_token_mismatch_is_unsafe() {
        let mut ledger = funded_ledger();
        let root = ledger.root();
        let proof = ledger
            .apply_top_up(&DepositTopUp { state_id: 0, token_id: 9, amount: 25 })
            .unwrap();

        assert!(!proof.safe);
        assert_eq!(Account::decode(&proof.account).unwrap().token_id, 1);
        assert_eq!(ledger.root(), root);
        assert_eq!(ledger.account(0).unwrap().balance, 100);
    }

    #[test]
    fn create_and_transfer_creates_receiver() {
        let mut ledger = funded_ledger();
        let prior_root = ledger.root();
        let tx = CreateAndTransfer { sender: 0, receiver: 30, amount: 40, account_id: 77 };
        let proof = ledger.apply_create_and_transfer(&tx).unwrap();

        assert!(proof.safe);
        assert_eq!(proof.receiver_account, EMPTY_ACCOUNT_WORD);
        assert_eq!(
            fold_root(0, Account::decode(&proof.sender_account).unwrap().state_leaf(), &proof.sender_witness),
            prior_root
        );

        let sender = ledger.account(0).unwrap();
        assert_eq!(sender.balance, 60);
        assert_eq!(sender.nonce, 1);

        let receiver = ledger.account(30).unwrap();
        assert_eq!(receiver.account_id, 77);
        // The receiver inherits the sender's token.
        assert_eq!(receiver.token_id, sender.token_id);
        assert_eq!(receiver.balance, 40);
        assert_eq!(receiver.nonce, 0);
    }

    #[test]
    fn create_and_transfer_unknown_sender_is_unsafe() {
        let mut ledger = funded_ledger();
        let root = ledger.root();
        let tx = CreateAndTransfer { sender: 40, receiver: 30, amount: 10, account_id: 77 };
        let proof = ledger.apply_create_and_transfer(&tx).unwrap();

        assert!(!proof.safe);
        assert_eq!(proof.sender_account, EMPTY_ACCOUNT_WORD);
        assert_eq!(ledger.root(), root);
    }

    #[test]
    fn create_and_transfer_overdraft_is_unsafe() {
        let mut ledger = funded_ledger();
        let root = ledger.root();
        let tx = CreateAndTransfer { sender: 0, receiver: 30, amount: 1000, account_id: 77 };
        let proof = ledger.apply_create_and_transfer(&tx).unwrap();

        assert!(!proof.safe);
        assert_eq!(ledger.root(), root);
        assert!(!ledger.contains(30));
    }

    #[test]
    fn create_and_transfer_occupied_receiver_commits_the_debit() {
        // The one unsafe path that mutates state: the sender debit lands
        // before safe=false comes back.
        let mut ledger = funded_ledger();
        let root = ledger.root();
        let tx = CreateAndTransfer { sender: 0, receiver: 1, amount: 10, account_id: 77 };
        let proof = ledger.apply_create_and_transfer(&tx).unwrap();

        assert!(!proof.safe);
        assert_ne!(ledger.root(), root);
        let sender = ledger.account(0).unwrap();
        assert_eq!(sender.balance, 90);
        assert_eq!(sender.nonce, 1);
        // The receiver is untouched and its pre-state is the evidence.
        assert_eq!(ledger.account(1).unwrap().balance, 100);
        assert_eq!(proof.receiver_account, ledger.account_encoded(1).unwrap());
    }

    #[test]
    fn create_and_transfer_batch_keeps_shape() {
        let mut ledger = funded_ledger();
        let txs = [
            CreateAndTransfer { sender: 0, receiver: 31, amount: 10, account_id: 70 },
            CreateAndTransfer { sender: 0, receiver: 1, amount: 10, account_id: 71 }, // occupied
            CreateAndTransfer { sender: 0, receiver: 32, amount: 10, account_id: 72 },
        ];
        let batch = ledger.apply_create_and_transfer_batch(&txs).unwrap();

        assert!(!batch.safe);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.sender_accounts[2], EMPTY_ACCOUNT_WORD);
        assert!(ledger.contains(31));
        assert!(!ledger.contains(32));
        // Two debits landed: the safe one and the occupied-receiver one.
        assert_eq!(ledger.account(0).unwrap().balance, 80);
        assert_eq!(ledger.account(0).unwrap().nonce, 2);
    }

    #[test]
    fn occupied_slot_leaf_matches_account_encoding_invariant() {
        let mut ledger = funded_ledger();
        ledger
            .apply_transfer(&Transfer { sender: 0, receiver: 1, amount: 20 })
            .unwrap();
        for state_id in [0u64, 1, 2] {
            let account = ledger.account(state_id).unwrap();
            let witness = ledger.account_witness(state_id);
            assert_eq!(
                fold_root(state_id, account.state_leaf(), &witness),
                ledger.root()
            );
        }
    }
}

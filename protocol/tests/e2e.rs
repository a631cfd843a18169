//! End-to-end integration tests for the ORBIT engine.
//!
//! These tests exercise the full coordinator/challenger lifecycle: build a
//! batch, serialize it and commit its header, apply it against a state
//! ledger, then replay the proof bundle the way a dispute contract would and
//! confirm every witness folds to the right root.
//!
//! Each test stands alone with its own ledger. No shared state, no test
//! ordering dependencies.

use orbit_protocol::account::{Account, EMPTY_ACCOUNT_WORD};
use orbit_protocol::crypto::Hasher;
use orbit_protocol::ledger::StateLedger;
use orbit_protocol::transaction::{
    decode_batch, deposit_root, serialize_batch, tx_root, tx_witness, BatchHeader, BatchType,
    CreateAndTransfer, DepositNewAccount, Transfer, Tx,
};
use orbit_protocol::tree::Node;

const DEPTH: usize = 8;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// Recompute a root from a slot index, its leaf, and a sibling path — the
/// fold the dispute contract runs against a submitted witness.
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

/// Leaf for a pre-state word as the contract derives it: the empty sentinel
/// maps to the zero node, anything else hashes its decoded packing.
fn word_leaf(word: &[u8; 32]) -> Node {
    if word == &EMPTY_ACCOUNT_WORD {
        Node::ZERO
    } else {
        Account::decode(word).expect("well-formed word").state_leaf()
    }
}

/// A ledger with `n` funded accounts in slots `0..n`, all on token 1.
fn funded_ledger(n: u64) -> StateLedger {
    let mut ledger = StateLedger::new(DEPTH);
    for slot in 0..n {
        ledger
            .create_account(slot, Account::new(slot as u32 + 100, 1, 1_000, 0))
            .expect("seed account");
    }
    ledger
}

// ---------------------------------------------------------------------------
// Transfer lifecycle
// ---------------------------------------------------------------------------

#[test]
fn transfer_batch_full_lifecycle() {
    let mut ledger = funded_ledger(4);
    let prior_root = ledger.root();

    let txs = vec![
        Transfer { sender: 0, receiver: 1, amount: 250 },
        Transfer { sender: 1, receiver: 2, amount: 100 },
        Transfer { sender: 2, receiver: 3, amount: 50 },
        Transfer { sender: 3, receiver: 0, amount: 25 },
    ];

    // Coordinator side: serialize, commit, apply.
    let (bytes, commitment) = serialize_batch(&txs).expect("serialize");
    let proofs = ledger.apply_transfer_batch(&txs).expect("apply");
    assert!(proofs.safe);

    let header = BatchHeader {
        batch_type: BatchType::Transfer,
        prior_state_root: prior_root,
        new_state_root: ledger.root(),
        coordinator_id: 7,
        batch_index: 0,
        tx_root: tx_root(&txs).expect("tx root"),
        tx_commitment: commitment,
    };

    // Challenger side: the calldata bytes reproduce the batch and match the
    // stored commitment.
    assert!(header.commitment_matches(&bytes));
    let decoded: Vec<Transfer> = decode_batch(&bytes).expect("decode");
    assert_eq!(decoded, txs);

    // Replaying the decoded batch on a fresh copy of the prior state lands
    // on the claimed root.
    let mut replay = funded_ledger(4);
    let replay_proofs = replay.apply_transfer_batch(&decoded).expect("replay");
    assert_eq!(replay.root(), header.new_state_root);
    assert_eq!(replay_proofs, proofs);

    // Every sender witness folds its pre-state leaf to the root as it stood
    // when that transaction ran. The first transaction's folds to the
    // header's prior root.
    let first_leaf = word_leaf(&proofs.sender_accounts[0]);
    assert_eq!(fold_root(0, first_leaf, &proofs.sender_witnesses[0]), prior_root);

    // Balances moved as claimed.
    assert_eq!(ledger.account(0).expect("slot 0").balance, 775);
    assert_eq!(ledger.account(1).expect("slot 1").balance, 1_150);
    assert_eq!(ledger.account(2).expect("slot 2").balance, 1_050);
    assert_eq!(ledger.account(3).expect("slot 3").balance, 1_025);
}

#[test]
fn tx_witness_binds_a_transaction_to_the_header() {
    let txs = vec![
        Transfer { sender: 0, receiver: 1, amount: 10 },
        Transfer { sender: 1, receiver: 2, amount: 20 },
        Transfer { sender: 2, receiver: 0, amount: 30 },
    ];
    let root = tx_root(&txs).expect("tx root");

    for (i, tx) in txs.iter().enumerate() {
        let nodes = tx_witness(i as u64, &txs).expect("witness");
        assert_eq!(fold_root(i as u64, tx.hash(), &nodes), root);
    }
}

#[test]
fn fraudulent_batch_is_caught_by_replay() {
    let txs = vec![
        Transfer { sender: 0, receiver: 1, amount: 250 },
        Transfer { sender: 1, receiver: 0, amount: 9_999 }, // overdraft
    ];

    let mut ledger = funded_ledger(2);
    let prior_root = ledger.root();
    let proofs = ledger.apply_transfer_batch(&txs).expect("apply");

    // The engine's verdict is unsafe; a coordinator claiming otherwise is
    // claiming a root this replay will not produce.
    assert!(!proofs.safe);
    assert_eq!(proofs.len(), 2);

    // Only the first transfer moved state.
    let post = ledger.root();
    assert_ne!(post, prior_root);
    assert_eq!(ledger.account(0).expect("slot 0").balance, 750);
    assert_eq!(ledger.account(1).expect("slot 1").balance, 1_250);

    // The unsafe slot still carries real evidence: the sender's pre-state
    // word decodes to the balance that could not cover the amount.
    let overdrafter = Account::decode(&proofs.sender_accounts[1]).expect("decode");
    assert!(u64::from(overdrafter.balance) < 9_999);
}

// ---------------------------------------------------------------------------
// Deposit lifecycle
// ---------------------------------------------------------------------------

#[test]
fn deposit_batch_full_lifecycle() {
    let mut ledger = StateLedger::new(DEPTH);
    let prior_root = ledger.root();

    let deposits = vec![
        DepositNewAccount { account_id: 500, token_id: 2, amount: 40, state_id: 3 },
        DepositNewAccount { account_id: 501, token_id: 2, amount: 60, state_id: 4 },
        DepositNewAccount { account_id: 502, token_id: 2, amount: 80, state_id: 5 },
    ];

    // The queue root commits amounts and identities but not slot
    // assignments; the coordinator picks slots later.
    let queue_root = deposit_root(&deposits).expect("deposit root");
    let reassigned: Vec<DepositNewAccount> = deposits
        .iter()
        .map(|d| DepositNewAccount { state_id: d.state_id + 32, ..*d })
        .collect();
    assert_eq!(deposit_root(&reassigned).expect("deposit root"), queue_root);

    let proofs = ledger.apply_deposit_new_batch(&deposits).expect("apply");
    assert!(proofs.safe);

    // Every pre-creation witness proves its slot was empty at the time the
    // deposit ran; the first folds to the genesis root.
    assert_eq!(proofs.accounts[0], EMPTY_ACCOUNT_WORD);
    assert_eq!(fold_root(3, Node::ZERO, &proofs.witnesses[0]), prior_root);

    for d in &deposits {
        let account = ledger.account(u64::from(d.state_id)).expect("created");
        assert_eq!(account.account_id, d.account_id);
        assert_eq!(account.balance, d.amount);
        assert_eq!(account.nonce, 0);
    }
}

// ---------------------------------------------------------------------------
// Create-and-transfer lifecycle
// ---------------------------------------------------------------------------

#[test]
fn create_and_transfer_batch_full_lifecycle() {
    let mut ledger = funded_ledger(2);
    let prior_root = ledger.root();

    let txs = vec![
        CreateAndTransfer { sender: 0, receiver: 10, amount: 300, account_id: 900 },
        CreateAndTransfer { sender: 1, receiver: 11, amount: 200, account_id: 901 },
    ];

    let (bytes, commitment) = serialize_batch(&txs).expect("serialize");
    let proofs = ledger.apply_create_and_transfer_batch(&txs).expect("apply");
    assert!(proofs.safe);

    let header = BatchHeader {
        batch_type: BatchType::CreateAndTransfer,
        prior_state_root: prior_root,
        new_state_root: ledger.root(),
        coordinator_id: 7,
        batch_index: 1,
        tx_root: tx_root(&txs).expect("tx root"),
        tx_commitment: commitment,
    };
    assert!(header.commitment_matches(&bytes));

    // New accounts inherit the sender's token and start at nonce zero.
    let created = ledger.account(10).expect("created");
    assert_eq!(created.account_id, 900);
    assert_eq!(created.token_id, 1);
    assert_eq!(created.balance, 300);
    assert_eq!(created.nonce, 0);

    // Receiver slots were empty when their witnesses were taken.
    assert_eq!(proofs.receiver_accounts[0], EMPTY_ACCOUNT_WORD);
    assert_eq!(proofs.receiver_accounts[1], EMPTY_ACCOUNT_WORD);

    // Replay reproduces the claimed root.
    let mut replay = funded_ledger(2);
    replay
        .apply_create_and_transfer_batch(&decode_batch(&bytes).expect("decode"))
        .expect("replay");
    assert_eq!(replay.root(), header.new_state_root);
}

#[test]
fn occupied_receiver_still_moves_the_root() {
    // The one unsafe branch that mutates state: the sender debit commits
    // before the verdict comes back.
    let mut ledger = funded_ledger(2);
    let prior_root = ledger.root();

    let txs = vec![CreateAndTransfer { sender: 0, receiver: 1, amount: 100, account_id: 902 }];
    let proofs = ledger.apply_create_and_transfer_batch(&txs).expect("apply");

    assert!(!proofs.safe);
    assert_ne!(ledger.root(), prior_root);
    assert_eq!(ledger.account(0).expect("sender").balance, 900);
    assert_eq!(ledger.account(1).expect("receiver").balance, 1_000);

    // The receiver evidence is the occupant's pre-state word, and its
    // witness folds to the post-debit root.
    let occupant_leaf = word_leaf(&proofs.receiver_accounts[0]);
    assert_eq!(
        fold_root(1, occupant_leaf, &proofs.receiver_witnesses[0]),
        ledger.root()
    );
}

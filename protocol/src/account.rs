//! # Account Records & Codec
//!
//! One rollup account and its two canonical byte forms.
//!
//! An account is committed to the state tree in two steps. First it is
//! packed into a fixed 32-byte big-endian word — fields in the order
//! `accountID ‖ tokenId ‖ balance ‖ nonce`, right-aligned — which is what
//! travels to the verifier as "the account before this transaction".
//! Second, its *leaf* is the keccak hash of the tightly packed field tuple
//! (14 bytes, no padding), which is what actually sits in the tree. The
//! verifier re-derives the leaf from the word, so the two encodings must
//! stay in lockstep.
//!
//! ## The empty-account sentinel
//!
//! Proofs about unoccupied slots still need an "account" to present. The
//! reserved word `0x8000…0000` plays that role: its high bit can never
//! appear in a real encoding (the top 18 bytes of a valid word are zero),
//! and its hash is defined to be the all-zero node — exactly the value an
//! untouched leaf already has.
//!
//! The keypair an account may carry is authorization material for the outer
//! signature-aggregation layer. It never participates in encoding, hashing,
//! or state transitions.

use std::fmt;

use ed25519_dalek::{Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{
    ACCOUNT_ID_BYTES, BALANCE_BYTES, NONCE_BYTES, TOKEN_ID_BYTES, WORD_BYTES,
};
use crate::crypto::{self, keccak256};
use crate::transaction::Tx;
use crate::tree::Node;

/// A 32-byte account word as consumed by the verifier contract.
pub type AccountWord = [u8; WORD_BYTES];

/// The reserved sentinel standing in for "no account at this slot".
///
/// High bit set, everything else zero. Its leaf hash is [`Node::ZERO`].
pub const EMPTY_ACCOUNT_WORD: AccountWord = {
    let mut word = [0u8; WORD_BYTES];
    word[0] = 0x80;
    word
};

/// Failures of the account codec.
#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    /// Input was not exactly one word long.
    #[error("expected a {expected}-byte word, got {got} bytes")]
    BadLength {
        /// Required byte count.
        expected: usize,
        /// What was supplied.
        got: usize,
    },

    /// Input was not valid hex.
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Input was the empty-account sentinel, which decodes to no account.
    #[error("cannot decode the empty account sentinel")]
    EmptyAccount,
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// One rollup account: registry identity, token, balance, nonce.
///
/// `state_id` is the tree slot the account occupies; it is bookkeeping for
/// the ledger and never part of the encoding. The optional keypair signs
/// transactions for the aggregation layer and is skipped by serde and by
/// equality — two accounts with the same consensus fields are the same
/// account.
#[derive(Clone, Serialize, Deserialize)]
pub struct Account {
    /// Registry identifier, assigned once at registration.
    pub account_id: u32,
    /// The token this account holds a balance of.
    pub token_id: u16,
    /// Current balance, in the token's base unit.
    pub balance: u32,
    /// Transactions sent from this account so far.
    pub nonce: u32,
    /// Tree slot this account occupies, once placed.
    pub state_id: Option<u64>,
    /// Authorization keypair; opaque to the state engine.
    #[serde(skip)]
    keypair: Option<SigningKey>,
}

impl Account {
    /// Create an account that has not been placed in a tree slot yet.
    pub fn new(account_id: u32, token_id: u16, balance: u32, nonce: u32) -> Self {
        Account {
            account_id,
            token_id,
            balance,
            nonce,
            state_id: None,
            keypair: None,
        }
    }

    /// Builder-style slot assignment.
    pub fn with_state_id(mut self, state_id: u64) -> Self {
        self.state_id = Some(state_id);
        self
    }

    /// Attach a freshly generated authorization keypair.
    pub fn generate_keys(&mut self) {
        self.keypair = Some(crypto::generate_keypair());
    }

    /// The verifying half of the authorization keypair, if one is attached.
    pub fn public_key(&self) -> Option<VerifyingKey> {
        self.keypair.as_ref().map(|k| k.verifying_key())
    }

    /// Sign a transaction's canonical encoding for the aggregation layer.
    ///
    /// Returns `None` when no keypair is attached.
    pub fn sign<T: Tx>(&self, tx: &T) -> Option<Signature> {
        self.keypair
            .as_ref()
            .map(|key| crypto::sign(key, &tx.encode()))
    }

    // -- codec --------------------------------------------------------------

    /// Pack into the canonical 32-byte word.
    ///
    /// Big-endian fields `accountID(4) ‖ tokenId(2) ‖ balance(4) ‖ nonce(4)`,
    /// right-aligned; the leading 18 bytes are zero.
    pub fn encode(&self) -> AccountWord {
        let mut word = [0u8; WORD_BYTES];
        let mut at = WORD_BYTES - NONCE_BYTES;
        word[at..].copy_from_slice(&self.nonce.to_be_bytes());
        at -= BALANCE_BYTES;
        word[at..at + BALANCE_BYTES].copy_from_slice(&self.balance.to_be_bytes());
        at -= TOKEN_ID_BYTES;
        word[at..at + TOKEN_ID_BYTES].copy_from_slice(&self.token_id.to_be_bytes());
        at -= ACCOUNT_ID_BYTES;
        word[at..at + ACCOUNT_ID_BYTES].copy_from_slice(&self.account_id.to_be_bytes());
        word
    }

    /// Decode the canonical word back into an account.
    ///
    /// Exact inverse of [`encode`](Self::encode). Rejects input that is not
    /// exactly one word and the empty-account sentinel. The decoded account
    /// carries no slot assignment and no keypair.
    pub fn decode(word: &[u8]) -> Result<Account, CodecError> {
        if word.len() != WORD_BYTES {
            return Err(CodecError::BadLength {
                expected: WORD_BYTES,
                got: word.len(),
            });
        }
        if word == EMPTY_ACCOUNT_WORD {
            return Err(CodecError::EmptyAccount);
        }
        let nonce = u32::from_be_bytes([word[28], word[29], word[30], word[31]]);
        let balance = u32::from_be_bytes([word[24], word[25], word[26], word[27]]);
        let token_id = u16::from_be_bytes([word[22], word[23]]);
        let account_id = u32::from_be_bytes([word[18], word[19], word[20], word[21]]);
        Ok(Account::new(account_id, token_id, balance, nonce))
    }

    /// The word as a `0x`-prefixed hex string.
    pub fn encode_hex(&self) -> String {
        format!("0x{}", hex::encode(self.encode()))
    }

    /// Decode from a hex string, with or without the `0x` prefix.
    pub fn decode_hex(encoded: &str) -> Result<Account, CodecError> {
        let stripped = encoded.strip_prefix("0x").unwrap_or(encoded);
        let bytes = hex::decode(stripped)?;
        Account::decode(&bytes)
    }

    /// The leaf committed to the state tree for this account.
    ///
    /// Keccak over the tightly packed tuple
    /// `(accountID: u32, tokenId: u16, balance: u32, nonce: u32)` —
    /// 14 bytes, no padding. Note this is *not* the hash of the padded word.
    pub fn state_leaf(&self) -> Node {
        let mut packed = [0u8; ACCOUNT_ID_BYTES + TOKEN_ID_BYTES + BALANCE_BYTES + NONCE_BYTES];
        packed[..4].copy_from_slice(&self.account_id.to_be_bytes());
        packed[4..6].copy_from_slice(&self.token_id.to_be_bytes());
        packed[6..10].copy_from_slice(&self.balance.to_be_bytes());
        packed[10..].copy_from_slice(&self.nonce.to_be_bytes());
        Node(keccak256(&packed))
    }
}

/// The leaf a given account word commits to.
///
/// The sentinel maps to the all-zero node; every real word maps to the leaf
/// of its decoded account. This is the function the verifier applies to the
/// "previous account" words inside a proof bundle.
pub fn leaf_of_word(word: &AccountWord) -> Result<Node, CodecError> {
    if *word == EMPTY_ACCOUNT_WORD {
        return Ok(Node::ZERO);
    }
    Ok(Account::decode(word)?.state_leaf())
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.account_id == other.account_id
            && self.token_id == other.token_id
            && self.balance == other.balance
            && self.nonce == other.nonce
            && self.state_id == other.state_id
    }
}

impl Eq for Account {}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("account_id", &self.account_id)
            .field("token_id", &self.token_id)
            .field("balance", &self.balance)
            .field("nonce", &self.nonce)
            .field("state_id", &self.state_id)
            .field("has_keys", &self.keypair.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

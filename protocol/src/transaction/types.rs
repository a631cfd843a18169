//! Core type definitions for rollup transactions.
//!
//! Four mutually exclusive record shapes, one per batch type. Each record
//! has a fixed byte width, a canonical big-endian encoding, and a keccak
//! hash over exactly those bytes — the on-chain calldata readers slice the
//! same offsets, so the encodings here are consensus-critical.
//!
//! The shapes are deliberately `Copy`: a batch is a plain slice of small
//! value types, and the apply loop never allocates per transaction.

use serde::{Deserialize, Serialize};

use crate::config::{
    CREATE_TRANSFER_RECORD_BYTES, DEPOSIT_NEW_RECORD_BYTES, TOP_UP_RECORD_BYTES,
    TRANSFER_RECORD_BYTES,
};
use crate::crypto::keccak256;
use crate::tree::Node;

/// Common surface of the four transaction records.
///
/// A record's hash is the keccak of its canonical encoding; the default
/// method pins that relationship so variants cannot drift.
pub trait Tx {
    /// Fixed width of one serialized record.
    const RECORD_BYTES: usize;

    /// Append the canonical encoding to `buf`.
    fn encode_into(&self, buf: &mut Vec<u8>);

    /// Rebuild a record from exactly [`Self::RECORD_BYTES`] bytes.
    ///
    /// Callers slice records out of a validated batch; the batch decoder is
    /// the only public entry point and enforces the width.
    fn decode_record(record: &[u8]) -> Self
    where
        Self: Sized;

    /// The canonical encoding of this record.
    fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::RECORD_BYTES);
        self.encode_into(&mut buf);
        buf
    }

    /// The record's tree leaf: keccak over its canonical encoding.
    fn hash(&self) -> Node {
        Node(keccak256(&self.encode()))
    }
}

/// Which of the four transition functions a batch runs through.
///
/// The discriminants are the wire values carried in batch headers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BatchType {
    /// Value transfer between two existing accounts.
    Transfer = 0,
    /// Deposit creating a fresh account at an empty slot.
    DepositNewAccount = 1,
    /// Deposit crediting an existing account.
    DepositTopUp = 2,
    /// Transfer that creates the receiver account on the fly.
    CreateAndTransfer = 3,
}

// ---------------------------------------------------------------------------
// Transfer
// ---------------------------------------------------------------------------

/// Value transfer between two occupied slots.
///
/// Wire layout: `sender(4) ‖ receiver(4) ‖ amount(4)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Sender's state slot.
    pub sender: u32,
    /// Receiver's state slot.
    pub receiver: u32,
    /// Amount moved, in the sender token's base unit.
    pub amount: u32,
}

impl Tx for Transfer {
    const RECORD_BYTES: usize = TRANSFER_RECORD_BYTES;

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.sender.to_be_bytes());
        buf.extend_from_slice(&self.receiver.to_be_bytes());
        buf.extend_from_slice(&self.amount.to_be_bytes());
    }

    fn decode_record(r: &[u8]) -> Self {
        Transfer {
            sender: u32::from_be_bytes([r[0], r[1], r[2], r[3]]),
            receiver: u32::from_be_bytes([r[4], r[5], r[6], r[7]]),
            amount: u32::from_be_bytes([r[8], r[9], r[10], r[11]]),
        }
    }
}

// ---------------------------------------------------------------------------
// DepositNewAccount
// ---------------------------------------------------------------------------

/// Deposit that creates a fresh account at an assigned slot.
///
/// Wire layout: `accountID(4) ‖ tokenID(2) ‖ amount(4) ‖ targetSlot(4)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositNewAccount {
    /// Registry identity the new account belongs to.
    pub account_id: u32,
    /// Token the deposit is denominated in.
    pub token_id: u16,
    /// Deposited amount; becomes the opening balance.
    pub amount: u32,
    /// Slot the account will occupy.
    pub state_id: u32,
}

impl DepositNewAccount {
    /// The deposit-queue hash: everything except the target slot.
    ///
    /// Deposits are queued on chain before any slot is assigned, so the
    /// queue commits only to `(accountID, tokenID, amount)`.
    pub fn deposit_hash(&self) -> Node {
        deposit_queue_hash(self.account_id, self.token_id, self.amount)
    }
}

impl Tx for DepositNewAccount {
    const RECORD_BYTES: usize = DEPOSIT_NEW_RECORD_BYTES;

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.account_id.to_be_bytes());
        buf.extend_from_slice(&self.token_id.to_be_bytes());
        buf.extend_from_slice(&self.amount.to_be_bytes());
        buf.extend_from_slice(&self.state_id.to_be_bytes());
    }

    fn decode_record(r: &[u8]) -> Self {
        DepositNewAccount {
            account_id: u32::from_be_bytes([r[0], r[1], r[2], r[3]]),
            token_id: u16::from_be_bytes([r[4], r[5]]),
            amount: u32::from_be_bytes([r[6], r[7], r[8], r[9]]),
            state_id: u32::from_be_bytes([r[10], r[11], r[12], r[13]]),
        }
    }
}

// ---------------------------------------------------------------------------
// DepositTopUp
// ---------------------------------------------------------------------------

/// Deposit crediting an account that already occupies a slot.
///
/// Wire layout: `targetSlot(4) ‖ tokenID(2) ‖ amount(4)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositTopUp {
    /// Slot of the account being credited.
    pub state_id: u32,
    /// Token the deposit is denominated in; must match the account's.
    pub token_id: u16,
    /// Amount credited.
    pub amount: u32,
}

impl DepositTopUp {
    /// The deposit-queue hash for a top-up.
    ///
    /// The record itself carries no account id (the slot identifies the
    /// account), but the queue entry was made before slot assignment and
    /// committed to the registry identity, so the caller supplies it.
    pub fn deposit_hash(account_id: u32, token_id: u16, amount: u32) -> Node {
        deposit_queue_hash(account_id, token_id, amount)
    }
}

impl Tx for DepositTopUp {
    const RECORD_BYTES: usize = TOP_UP_RECORD_BYTES;

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.state_id.to_be_bytes());
        buf.extend_from_slice(&self.token_id.to_be_bytes());
        buf.extend_from_slice(&self.amount.to_be_bytes());
    }

    fn decode_record(r: &[u8]) -> Self {
        DepositTopUp {
            state_id: u32::from_be_bytes([r[0], r[1], r[2], r[3]]),
            token_id: u16::from_be_bytes([r[4], r[5]]),
            amount: u32::from_be_bytes([r[6], r[7], r[8], r[9]]),
        }
    }
}

// ---------------------------------------------------------------------------
// CreateAndTransfer
// ---------------------------------------------------------------------------

/// Transfer whose receiver account is created by the same transaction.
///
/// Wire layout: `sender(4) ‖ receiver(4) ‖ amount(4) ‖ newAccountID(4)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAndTransfer {
    /// Sender's state slot.
    pub sender: u32,
    /// Slot the receiver account will be created at.
    pub receiver: u32,
    /// Amount moved; becomes the receiver's opening balance.
    pub amount: u32,
    /// Registry identity for the new receiver account.
    pub account_id: u32,
}

impl Tx for CreateAndTransfer {
    const RECORD_BYTES: usize = CREATE_TRANSFER_RECORD_BYTES;

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.sender.to_be_bytes());
        buf.extend_from_slice(&self.receiver.to_be_bytes());
        buf.extend_from_slice(&self.amount.to_be_bytes());
        buf.extend_from_slice(&self.account_id.to_be_bytes());
    }

    fn decode_record(r: &[u8]) -> Self {
        CreateAndTransfer {
            sender: u32::from_be_bytes([r[0], r[1], r[2], r[3]]),
            receiver: u32::from_be_bytes([r[4], r[5], r[6], r[7]]),
            amount: u32::from_be_bytes([r[8], r[9], r[10], r[11]]),
            account_id: u32::from_be_bytes([r[12], r[13], r[14], r[15]]),
        }
    }
}

/// Hash binding a queued deposit before a slot is assigned:
/// `keccak(accountID(4) ‖ tokenID(2) ‖ amount(4))`.
pub fn deposit_queue_hash(account_id: u32, token_id: u16, amount: u32) -> Node {
    let mut packed = [0u8; 10];
    packed[..4].copy_from_slice(&account_id.to_be_bytes());
    packed[4..6].copy_from_slice(&token_id.to_be_bytes());
    packed[6..].copy_from_slice(&amount.to_be_bytes());
    Node(keccak256(&packed))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

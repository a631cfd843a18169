//! # Protocol Constants
//!
//! Every magic number in ORBIT lives here or next to the codec that owns it.
//! These values are consensus-bearing: the dispute contract hardcodes the
//! same ones, so changing any of them after deployment means a migration,
//! not a patch.

// ---------------------------------------------------------------------------
// State Tree Geometry
// ---------------------------------------------------------------------------

/// Depth of the production account state tree: 2^32 slots.
///
/// Test ledgers use shallower trees; anything headed for the contract uses
/// this.
pub const DEFAULT_STATE_DEPTH: usize = 32;

/// Hard cap on tree depth. Slot indices are `u64`, so depth 64 would
/// overflow the set size.
pub const MAX_TREE_DEPTH: usize = 63;

// ---------------------------------------------------------------------------
// Account Codec
// ---------------------------------------------------------------------------

/// Width of the canonical account encoding: one base-ledger storage word.
pub const WORD_BYTES: usize = 32;

/// Registry identifier field width.
pub const ACCOUNT_ID_BYTES: usize = 4;

/// Token identifier field width.
pub const TOKEN_ID_BYTES: usize = 2;

/// Balance field width.
pub const BALANCE_BYTES: usize = 4;

/// Nonce field width.
pub const NONCE_BYTES: usize = 4;

// ---------------------------------------------------------------------------
// Transaction Record Widths
// ---------------------------------------------------------------------------

// Calldata readers on the contract side slice batches at these offsets;
// records carry no framing of their own.

/// `sender(4) ‖ receiver(4) ‖ amount(4)`.
pub const TRANSFER_RECORD_BYTES: usize = 12;

/// `accountID(4) ‖ tokenID(2) ‖ amount(4) ‖ targetSlot(4)`.
pub const DEPOSIT_NEW_RECORD_BYTES: usize = 14;

/// `targetSlot(4) ‖ tokenID(2) ‖ amount(4)`.
pub const TOP_UP_RECORD_BYTES: usize = 10;

/// `sender(4) ‖ receiver(4) ‖ amount(4) ‖ newAccountID(4)`.
pub const CREATE_TRANSFER_RECORD_BYTES: usize = 16;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Bumped on any change to an encoding, a hash preimage, or a transition
/// rule. Coordinators and challengers on different majors will compute
/// different roots from the same history — that is the point.
pub const PROTOCOL_VERSION_MAJOR: u16 = 0;

/// Bumped on backward-compatible additions.
pub const PROTOCOL_VERSION_MINOR: u16 = 1;

/// The full version string, assembled at compile time.
pub const PROTOCOL_VERSION: &str = "0.1.0";

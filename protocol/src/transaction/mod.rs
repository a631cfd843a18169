//! # Transaction Records & Batches
//!
//! Canonical encodings for the four transaction kinds and the batch plumbing
//! around them.
//!
//! ```text
//! types.rs — Transfer, DepositNewAccount, DepositTopUp, CreateAndTransfer;
//!            the Tx trait tying each record to its hash
//! batch.rs — batch serialization + commitment, transaction trees
//!            (txRoot, per-tx witnesses, deposit queue root), BatchHeader
//! ```
//!
//! ## Lifecycle
//!
//! 1. **Build** — a coordinator assembles records of one kind.
//! 2. **Serialize** — [`serialize_batch`] produces the calldata bytes and
//!    their commitment.
//! 3. **Commit** — [`tx_root`] goes into the [`BatchHeader`] next to the
//!    commitment.
//! 4. **Apply** — the ledger module runs the batch against the state tree
//!    and emits the proof bundle a challenger would need.
//!
//! Amounts and identifiers arrive here pre-verified; nothing in this module
//! checks a signature.

pub mod batch;
pub mod types;

pub use batch::{
    batch_size, decode_batch, deposit_root, has_excess_data, serialize_batch, tx_root, tx_witness,
    BatchCodecError, BatchHeader,
};
pub use types::{
    deposit_queue_hash, BatchType, CreateAndTransfer, DepositNewAccount, DepositTopUp, Transfer, Tx,
};

//! # Cryptographic Primitives for ORBIT
//!
//! Everything hash- and signature-shaped flows through here.
//!
//! - **Keccak-256** for all commitments — the verifier contract computes the
//!   same digests with the EVM's native opcode, and the whole point of this
//!   library is to agree with it bit for bit.
//! - **Ed25519** for transaction authorization — thin wrappers around
//!   `ed25519-dalek`, kept entirely outside the state-transition path.
//!
//! Nothing in this module is hand-rolled; these are type-safe fronts over
//! audited implementations.

pub mod hash;
pub mod signatures;

// Re-export the things people actually need so they don't have to memorize
// the module hierarchy.
pub use hash::{keccak256, keccak256_multi, Hasher};
pub use signatures::{generate_keypair, sign, verify};

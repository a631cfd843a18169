//! # Transaction Authorization Signatures
//!
//! Ed25519 signing and verification for transaction authorization material.
//!
//! The state engine itself never checks a signature: batches arrive with
//! their amounts and slot indices already authenticated by the aggregation
//! layer, and the safety verdicts this library produces are about balances
//! and occupancy, not keys. These wrappers exist so an account can carry an
//! opaque keypair and produce the authorization bytes the outer layers
//! expect, without every caller touching `ed25519-dalek` directly.
//!
//! We use strict verification. Lenient Ed25519 implementations accept some
//! malleable edge-case signatures; strict rejects them, and we have no
//! legacy peers to stay compatible with.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

/// Generate a fresh Ed25519 keypair from the OS entropy source.
pub fn generate_keypair() -> SigningKey {
    SigningKey::generate(&mut OsRng)
}

/// Sign a message with the given key.
///
/// Ed25519 is deterministic (RFC 8032): the same key and message always
/// produce the same 64-byte signature.
pub fn sign(key: &SigningKey, message: &[u8]) -> Signature {
    key.sign(message)
}

/// Verify an Ed25519 signature against a public key and message.
///
/// Returns `true` only for strictly valid signatures. We intentionally do
/// not distinguish between "bad signature" and "wrong key" — both are no.
pub fn verify(public_key: &VerifyingKey, message: &[u8], signature: &Signature) -> bool {
    public_key.verify_strict(message, signature).is_ok()
}

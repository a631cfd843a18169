// Copyright (c) 2026 ORBIT Contributors. MIT License.
// See LICENSE for details.

//! # ORBIT Protocol — Off-Chain Verification Engine
//!
//! ORBIT is the off-chain half of an optimistic rollup: coordinators batch
//! payment transactions, commit a claimed state root on the base ledger, and
//! anyone running this engine can replay the batch and catch them lying.
//! Optimistic means nobody checks until somebody disputes — this crate is
//! what the somebody runs.
//!
//! ## Architecture
//!
//! The engine is split into modules that mirror the actual artifacts of a
//! rollup dispute:
//!
//! - **crypto** — Keccak hashing and signing primitives. Don't roll your own.
//! - **tree** — The sparse Merkle accumulator every root in the system
//!   hangs off of.
//! - **account** — The 32-byte account word codec and its state leaf.
//! - **transaction** — Record encodings, batch commitments, transaction
//!   trees, and the header the base ledger stores.
//! - **ledger** — The state-transition engine: apply a batch, collect the
//!   witnesses, render the verdict.
//! - **config** — Protocol constants. One place, no exceptions.
//!
//! ## Design Philosophy
//!
//! 1. Determinism over everything — a challenger must reproduce the
//!    coordinator's bytes exactly, or fraud proofs are theater.
//! 2. Structural failures are errors; dishonest transactions are verdicts.
//!    The two never mix.
//! 3. If it feeds a root, it has tests. Plural.

pub mod account;
pub mod config;
pub mod crypto;
pub mod ledger;
pub mod transaction;
pub mod tree;

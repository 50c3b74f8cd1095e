#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `signature` holds the in-memory description of a basis stream: one
//! [`BlockSig`] per fixed-size block (weak rolling sum plus truncated strong
//! sum) and, once [`Signature::build_hash_table`] has run, a tag-bucketed
//! index that answers "which basis block, if any, matches this window" in
//! O(1) average time.
//!
//! # Lifecycle
//!
//! A signature is populated block by block (by the streaming jobs) or in one
//! call from an in-memory basis via [`Signature::from_buffer`]. It must be
//! indexed exactly once before matching; re-indexing is a no-op. Afterwards
//! it is immutable and safe to share read-only across any number of delta
//! jobs.
//!
//! # Invariants
//!
//! - Blocks are numbered from 0 in basis order; all are `block_len` bytes
//!   except possibly the last.
//! - Matching prefers the lowest block index when several blocks carry the
//!   same weak and strong sums, which keeps delta output deterministic.
//! - Strong sums are compared over the first `strong_sum_len` bytes only,
//!   mirroring the truncation applied when the signature was produced.

mod block;
mod index;
mod sumset;

pub use block::BlockSig;
pub use sumset::{
    MatchOutcome, Signature, SignatureError, hash_kind, resolved_strong_len,
};

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `checksums` provides the rolling and strong checksum primitives used by
//! the streaming delta codec. The weak checksum is byte-for-byte compatible
//! with the rsync family's offset-adjusted Adler variant, so signatures
//! produced here interoperate with existing tooling.
//!
//! # Design
//!
//! The crate offers two modules:
//!
//! - [`rolling`] implements the weak checksum: two 16-bit components, a
//!   per-byte character offset of 31, and an O(1) window rotation.
//! - [`strong`] exposes the MD4 and BLAKE2b/256 digests together with the
//!   [`strong::StrongDigest`] trait and the [`strong::StrongHash`]
//!   runtime-dispatch wrapper higher layers select from the signature magic.
//!
//! # Invariants
//!
//! - Both rolling components are truncated to 16 bits on every store; bulk
//!   updates may accumulate with 32-bit wrapping arithmetic because 2^16
//!   divides 2^32.
//! - Rotating a window by one byte yields exactly the checksum a from-scratch
//!   computation over the shifted window would produce.
//! - Strong digests are computed over exactly the bytes supplied, never more.

mod rolling;
pub mod strong;

pub use rolling::{CHAR_OFFSET, RollingChecksum, RollingError};

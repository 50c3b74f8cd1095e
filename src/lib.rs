#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `oc-rdiff` computes and applies binary deltas between two byte streams
//! using the rsync rolling-checksum algorithm. Given an old ("basis")
//! stream it produces a compact **signature**; given the signature and a new
//! stream it produces a **delta** of COPY and LITERAL commands; given the
//! basis and the delta it reconstructs the new stream bit-exactly.
//!
//! The core is streaming throughout: each operation is a [`Job`] state
//! machine that consumes caller-owned input buffers and fills caller-owned
//! output buffers in bounded chunks, never holding a whole stream in
//! memory. The whole-stream helpers at the crate root ([`signature`],
//! [`load_signature`], [`delta`], [`patch`]) pump `std::io` readers and
//! writers through those jobs for callers that do not need incremental
//! control.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//!
//! let basis = b"mary had a little lamb".to_vec();
//! let new = b"mary had a little spider".to_vec();
//!
//! // Signature of the basis, with default block length and strong hash.
//! let mut sig_stream = Vec::new();
//! oc_rdiff::signature(
//!     &mut basis.as_slice(),
//!     &mut sig_stream,
//!     oc_rdiff::DEFAULT_BLOCK_LEN,
//!     0,
//!     oc_rdiff::SignatureMagic::default(),
//! )
//! .unwrap();
//!
//! // Load + index it, then delta the new stream against it.
//! let (mut signature, _) = oc_rdiff::load_signature(&mut sig_stream.as_slice()).unwrap();
//! signature.build_hash_table();
//!
//! let mut delta = Vec::new();
//! oc_rdiff::delta(&signature, &mut new.as_slice(), &mut delta).unwrap();
//!
//! // Apply the delta against the basis.
//! let mut rebuilt = Vec::new();
//! let basis_reader = oc_rdiff::BasisReader::new(Cursor::new(basis));
//! oc_rdiff::patch(basis_reader, &mut delta.as_slice(), &mut rebuilt).unwrap();
//! assert_eq!(rebuilt, new);
//! ```
//!
//! # Crate layout
//!
//! The heavy lifting lives in the workspace crates and is re-exported here:
//! `checksums` (weak rolling sum, MD4/BLAKE2b strong sums), `protocol`
//! (magics and the delta command codec), `signature` (the block index),
//! `engine` (the job state machines), and `logging` (the process-wide trace
//! sink).

mod whole;

pub use checksums::{RollingChecksum, strong::StrongHashKind};
pub use engine::{
    BasisReader, Buffers, CopySource, DEFAULT_BLOCK_LEN, DEFAULT_ROLL_PARANOIA, DeltaJob,
    DriveOptions, Job, JobError, LoadSigJob, PatchJob, SigJob, Stats, Status, drive,
};
pub use logging::{TraceLevel, set_level, set_sink};
pub use protocol::{Command, Magic, SignatureMagic};
pub use signature::{BlockSig, Signature, SignatureError};
pub use whole::{delta, load_signature, patch, signature};

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

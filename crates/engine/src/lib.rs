#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `engine` drives the four streaming operations of the delta codec:
//! generating a signature ([`SigJob`]), loading one back into memory
//! ([`LoadSigJob`]), computing a delta against an indexed signature
//! ([`DeltaJob`]), and applying a delta to a basis ([`PatchJob`]).
//!
//! # Design
//!
//! Every job is a cooperative state machine behind the [`Job`] trait. One
//! call to [`Job::iter`] consumes some prefix of the caller's input buffer,
//! appends some prefix to the caller's output buffer, and returns either
//! [`Status::Done`], [`Status::Blocked`] (give me more input or more output
//! room and call again), or a terminal [`JobError`]. The engine never
//! performs I/O itself; [`drive`] is the convenience pump that loops a job
//! against a `Read` source and `Write` sink.
//!
//! States are tagged enum variants with a single dispatch site per job, so
//! the machine remains inspectable in a debugger. Each job owns a small
//! scan buffer that coalesces input until the current state's minimum
//! operand width is available, so states never see truncated headers, and a
//! bounded pending-output queue that is drained before any state runs.
//!
//! # Example
//!
//! ```
//! use engine::{DeltaJob, DriveOptions, PatchJob, SigJob, drive};
//! use protocol::SignatureMagic;
//!
//! let basis = b"the quick brown fox jumps over the lazy dog".to_vec();
//! let new = b"the quick brown cat jumps over the lazy dog".to_vec();
//!
//! // Signature of the basis.
//! let mut sig_stream = Vec::new();
//! let mut job = SigJob::new(8, 0, SignatureMagic::Blake2).unwrap();
//! drive(&mut job, &mut basis.as_slice(), &mut sig_stream, &DriveOptions::default()).unwrap();
//!
//! // Load and index it.
//! let mut load = engine::LoadSigJob::new();
//! drive(&mut load, &mut sig_stream.as_slice(), &mut std::io::sink(), &DriveOptions::default())
//!     .unwrap();
//! let mut signature = load.into_signature().unwrap();
//! signature.build_hash_table();
//!
//! // Delta, then patch.
//! let mut delta = Vec::new();
//! let mut job = DeltaJob::new(&signature).unwrap();
//! drive(&mut job, &mut new.as_slice(), &mut delta, &DriveOptions::default()).unwrap();
//!
//! let mut rebuilt = Vec::new();
//! let mut job = PatchJob::new(basis.as_slice());
//! drive(&mut job, &mut delta.as_slice(), &mut rebuilt, &DriveOptions::default()).unwrap();
//! assert_eq!(rebuilt, new);
//! ```

mod buffers;
mod delta;
mod drive;
mod error;
mod job;
mod loadsig;
mod patch;
mod sig;
mod stats;

pub use buffers::Buffers;
pub use delta::{DEFAULT_ROLL_PARANOIA, DeltaJob};
pub use drive::{DriveOptions, drive};
pub use error::JobError;
pub use job::{Job, Status};
pub use loadsig::LoadSigJob;
pub use patch::{BasisReader, CopySource, PatchJob};
pub use sig::SigJob;
pub use stats::Stats;

/// Block length used when the caller expresses no preference.
pub const DEFAULT_BLOCK_LEN: u32 = 2048;

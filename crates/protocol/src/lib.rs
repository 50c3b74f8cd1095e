#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `protocol` pins down the on-wire representation shared by the streaming
//! jobs: the leading magic numbers that identify a stream, the big-endian
//! integer encodings used everywhere, and the delta command language of
//! LITERAL, COPY and END opcodes.
//!
//! All encoding decisions here are deterministic: the same logical command
//! always produces the same bytes, because the codec always picks the
//! smallest operand width that fits. Delta output being byte-reproducible
//! depends on this.
//!
//! # Modules
//!
//! - [`magic`]: the four-byte stream identifiers.
//! - [`netint`]: big-endian integer serialisation helpers.
//! - [`command`]: the delta command codec.

pub mod command;
pub mod magic;
pub mod netint;

pub use command::{Command, CommandError, MAX_COMMAND_LEN};
pub use magic::{BLAKE2_SIG_MAGIC, DELTA_MAGIC, MD4_SIG_MAGIC, Magic, SignatureMagic};

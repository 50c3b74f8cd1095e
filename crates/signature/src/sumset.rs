use checksums::RollingChecksum;
use checksums::strong::{MAX_STRONG_LEN, StrongHashKind, strong_sum_of};
use protocol::SignatureMagic;
use rayon::prelude::*;
use thiserror::Error;

use crate::block::BlockSig;
use crate::index::TagIndex;

/// Minimum number of blocks at which parallel signature generation becomes
/// beneficial; below it rayon's scheduling overhead dominates.
const PARALLEL_BLOCK_THRESHOLD: usize = 8;

/// Strong hash family selected by a signature magic.
#[must_use]
pub const fn hash_kind(magic: SignatureMagic) -> StrongHashKind {
    match magic {
        SignatureMagic::Md4 => StrongHashKind::Md4,
        SignatureMagic::Blake2 => StrongHashKind::Blake2,
    }
}

/// Resolves a requested strong-sum truncation against the hash family.
///
/// Zero means "full width". Values above the family's native digest width
/// are rejected rather than clamped, since they indicate a caller bug.
///
/// # Errors
///
/// [`SignatureError::StrongLenTooLarge`] when the request exceeds the width.
pub fn resolved_strong_len(
    magic: SignatureMagic,
    requested: u32,
) -> Result<u32, SignatureError> {
    let kind = hash_kind(magic);
    let max = kind.digest_len() as u32;
    match requested {
        0 => Ok(max),
        n if n <= max => Ok(n),
        n => Err(SignatureError::StrongLenTooLarge {
            requested: n,
            max,
            hash: kind.as_str(),
        }),
    }
}

/// Invalid signature parameters.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum SignatureError {
    /// A zero block length can describe no data.
    #[error("block length must be non-zero")]
    ZeroBlockLen,
    /// The requested truncation exceeds the strong hash's digest width.
    #[error("strong sum length {requested} exceeds {hash} digest width {max}")]
    StrongLenTooLarge {
        /// Requested truncated length in bytes.
        requested: u32,
        /// Native width of the selected hash.
        max: u32,
        /// Name of the selected hash family.
        hash: &'static str,
    },
}

/// Result of probing the index with one window.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MatchOutcome {
    /// Index of the matched basis block, if any.
    pub matched: Option<u32>,
    /// Weak-sum hits whose strong sum failed to confirm.
    pub false_matches: u32,
}

/// All checksums generated for one basis stream.
///
/// See the crate-level documentation for the lifecycle; in short: populate,
/// index once, then share immutably.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature {
    flength: Option<u64>,
    block_len: u32,
    strong_sum_len: u32,
    magic: SignatureMagic,
    blocks: Vec<BlockSig>,
    index: Option<TagIndex>,
}

impl Signature {
    /// Creates an empty signature with validated parameters.
    ///
    /// A `strong_sum_len` of zero selects the hash family's full width.
    ///
    /// # Errors
    ///
    /// [`SignatureError::ZeroBlockLen`] or
    /// [`SignatureError::StrongLenTooLarge`].
    pub fn new(
        block_len: u32,
        strong_sum_len: u32,
        magic: SignatureMagic,
    ) -> Result<Self, SignatureError> {
        if block_len == 0 {
            return Err(SignatureError::ZeroBlockLen);
        }
        let strong_sum_len = resolved_strong_len(magic, strong_sum_len)?;
        Ok(Self {
            flength: None,
            block_len,
            strong_sum_len,
            magic,
            blocks: Vec::new(),
            index: None,
        })
    }

    /// Builds a complete signature from an in-memory basis.
    ///
    /// Strong sums for large bases are computed in parallel. The result is
    /// not yet indexed; call [`build_hash_table`](Self::build_hash_table)
    /// before matching.
    ///
    /// # Errors
    ///
    /// Same parameter validation as [`Signature::new`].
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(basis), fields(basis_len = basis.len())))]
    pub fn from_buffer(
        basis: &[u8],
        block_len: u32,
        strong_sum_len: u32,
        magic: SignatureMagic,
    ) -> Result<Self, SignatureError> {
        let mut signature = Self::new(block_len, strong_sum_len, magic)?;
        signature.flength = Some(basis.len() as u64);

        let kind = hash_kind(magic);
        let sum_len = signature.strong_sum_len as usize;
        let make = |(i, block): (usize, &[u8])| {
            let mut strong = strong_sum_of(kind, &[block]);
            strong[sum_len..].fill(0);
            BlockSig::new(i as u32, RollingChecksum::sum_of(block), strong)
        };

        let chunk = block_len as usize;
        signature.blocks = if basis.len() / chunk >= PARALLEL_BLOCK_THRESHOLD {
            basis.par_chunks(chunk).enumerate().map(make).collect()
        } else {
            basis.chunks(chunk).enumerate().map(make).collect()
        };
        Ok(signature)
    }

    /// Appends one block record in basis order.
    ///
    /// Must not be called after [`build_hash_table`](Self::build_hash_table);
    /// the index does not track later additions.
    pub fn push_block(&mut self, weak: u32, strong: [u8; MAX_STRONG_LEN]) {
        debug_assert!(self.index.is_none(), "signature mutated after indexing");
        let index = self.blocks.len() as u32;
        self.blocks.push(BlockSig::new(index, weak, strong));
    }

    /// Basis length in bytes, when known.
    ///
    /// Signatures loaded from a stream do not carry the length; callers that
    /// know it out of band supply it with [`set_flength`](Self::set_flength).
    #[must_use]
    pub const fn flength(&self) -> Option<u64> {
        self.flength
    }

    /// Records the basis length.
    pub fn set_flength(&mut self, flength: u64) {
        self.flength = Some(flength);
    }

    /// Block length the signature was generated with.
    #[must_use]
    pub const fn block_len(&self) -> u32 {
        self.block_len
    }

    /// Number of meaningful leading bytes in each stored strong sum.
    #[must_use]
    pub const fn strong_sum_len(&self) -> u32 {
        self.strong_sum_len
    }

    /// Magic the signature was generated under.
    #[must_use]
    pub const fn magic(&self) -> SignatureMagic {
        self.magic
    }

    /// Strong hash family of the stored sums.
    #[must_use]
    pub const fn hash_kind(&self) -> StrongHashKind {
        hash_kind(self.magic)
    }

    /// The per-block records in basis order.
    #[must_use]
    pub fn blocks(&self) -> &[BlockSig] {
        &self.blocks
    }

    /// Number of blocks described.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` when the signature describes an empty basis.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Builds the tag-bucketed weak-sum index. Idempotent.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all, fields(blocks = self.blocks.len())))]
    pub fn build_hash_table(&mut self) {
        if self.index.is_some() {
            return;
        }
        self.index = Some(TagIndex::build(&self.blocks));
        logging::log_debug!(
            "indexed {} block signatures ({} byte blocks)",
            self.blocks.len(),
            self.block_len
        );
    }

    /// Reports whether [`build_hash_table`](Self::build_hash_table) has run.
    #[must_use]
    pub const fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    /// Probes the index for a block matching `weak`, confirming candidates
    /// with the strong sum produced by `strong`.
    ///
    /// The supplier runs at most once per probe, however many weak-equal
    /// candidates need checking. Among blocks whose weak and strong sums
    /// both match, the lowest index wins. Unconfirmed weak hits are counted
    /// in [`MatchOutcome::false_matches`].
    pub fn find_match<F>(&self, weak: u32, strong: F) -> MatchOutcome
    where
        F: FnOnce() -> [u8; MAX_STRONG_LEN],
    {
        let mut outcome = MatchOutcome::default();
        let Some(index) = &self.index else {
            debug_assert!(false, "find_match called before build_hash_table");
            return outcome;
        };

        let candidates = index.candidates(weak);
        let start = candidates.partition_point(|&i| self.blocks[i as usize].weak() < weak);

        let sum_len = self.strong_sum_len as usize;
        let mut supplier = Some(strong);
        let mut window_strong: Option<[u8; MAX_STRONG_LEN]> = None;

        for &candidate in &candidates[start..] {
            let block = &self.blocks[candidate as usize];
            if block.weak() != weak {
                break;
            }
            let strong_sum = window_strong.get_or_insert_with(|| {
                supplier.take().expect("strong supplier runs once")()
            });
            if strong_sum[..sum_len] == block.strong()[..sum_len] {
                outcome.matched = Some(block.index());
                return outcome;
            }
            outcome.false_matches += 1;
        }
        outcome
    }

    /// Writes the per-block table to the trace sink at `Trace` level.
    pub fn dump(&self) {
        use std::fmt::Write as _;

        if !logging::enabled(logging::TraceLevel::Trace) {
            return;
        }
        logging::log_trace!(
            "sumset: {} blocks, block_len={}, strong_sum_len={} ({})",
            self.blocks.len(),
            self.block_len,
            self.strong_sum_len,
            self.hash_kind().as_str()
        );
        for block in &self.blocks {
            let mut hex = String::with_capacity(self.strong_sum_len as usize * 2);
            for byte in &block.strong()[..self.strong_sum_len as usize] {
                write!(&mut hex, "{byte:02x}").expect("write! to String cannot fail");
            }
            logging::log_trace!(
                "block {}: weak={:#010x} strong={hex}",
                block.index(),
                block.weak()
            );
        }
    }
}

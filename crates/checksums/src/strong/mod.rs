//! Strong checksum implementations backed by well-known hash algorithms.
//!
//! The signature format fixes the strong hash family in its magic number:
//! MD4 for streams compatible with pre-1.0 producers, BLAKE2b/256 for
//! everything newer. This module exposes streaming wrappers for both, the
//! [`StrongDigest`] trait they share, and the [`StrongHash`] enum that lets
//! a job pick the family once at start-up and dispatch per block without
//! further branching on algorithm names.
//!
//! MD4 is kept for interoperability only; it is cryptographically broken and
//! new signatures should use BLAKE2b.

mod blake2;
mod md4;

pub use blake2::Blake2;
pub use md4::Md4;

/// Widest strong digest the codec supports, in bytes.
pub const MAX_STRONG_LEN: usize = 32;

/// Trait implemented by strong checksum algorithms.
///
/// Implementors provide a streaming interface: callers feed data
/// incrementally via [`Self::update`] and obtain the final digest through
/// [`Self::finalize`]. [`DIGEST_LEN`](Self::DIGEST_LEN) exposes the byte
/// width of the resulting hash so higher layers can size buffers without
/// hard-coding algorithm-specific knowledge.
pub trait StrongDigest: Sized {
    /// Type returned when finalising the digest.
    type Digest: AsRef<[u8]> + Copy;

    /// Length of the final digest in bytes.
    const DIGEST_LEN: usize;

    /// Creates a new hasher with an empty state.
    fn new() -> Self;

    /// Feeds additional bytes into the digest state.
    fn update(&mut self, data: &[u8]);

    /// Finalises the digest and returns the resulting hash.
    fn finalize(self) -> Self::Digest;

    /// Convenience helper that hashes `data` in a single call.
    fn digest(data: &[u8]) -> Self::Digest {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

/// Strong hash families distinguishable from a signature magic number.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StrongHashKind {
    /// MD4, 16-byte digest. Deprecated; kept for interoperability.
    Md4,
    /// BLAKE2b with a 32-byte digest.
    Blake2,
}

impl StrongHashKind {
    /// Native digest width of the family, in bytes.
    #[must_use]
    pub const fn digest_len(self) -> usize {
        match self {
            Self::Md4 => Md4::DIGEST_LEN,
            Self::Blake2 => Blake2::DIGEST_LEN,
        }
    }

    /// Name used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Md4 => "md4",
            Self::Blake2 => "blake2",
        }
    }
}

/// Runtime-dispatched strong hasher.
///
/// Jobs resolve the family from the signature magic once, then drive the
/// enum; the match happens per call but never per algorithm-name lookup.
#[derive(Clone, Debug)]
pub enum StrongHash {
    /// MD4 state.
    Md4(Md4),
    /// BLAKE2b/256 state.
    Blake2(Blake2),
}

impl StrongHash {
    /// Creates a hasher of the requested family.
    #[must_use]
    pub fn new(kind: StrongHashKind) -> Self {
        match kind {
            StrongHashKind::Md4 => Self::Md4(Md4::new()),
            StrongHashKind::Blake2 => Self::Blake2(Blake2::new()),
        }
    }

    /// Feeds additional bytes into the digest state.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md4(hasher) => hasher.update(data),
            Self::Blake2(hasher) => hasher.update(data),
        }
    }

    /// Finalises the digest into `out`, returning the family's native width.
    ///
    /// Bytes past the native width are left untouched, so callers reusing a
    /// buffer should zero it first if trailing bytes matter to them.
    pub fn finalize_into(self, out: &mut [u8; MAX_STRONG_LEN]) -> usize {
        match self {
            Self::Md4(hasher) => {
                let digest = hasher.finalize();
                out[..Md4::DIGEST_LEN].copy_from_slice(&digest);
                Md4::DIGEST_LEN
            }
            Self::Blake2(hasher) => {
                let digest = hasher.finalize();
                out[..Blake2::DIGEST_LEN].copy_from_slice(&digest);
                Blake2::DIGEST_LEN
            }
        }
    }
}

/// Computes the strong sum of `parts` concatenated, zero-padding the result
/// buffer past the family's native width.
#[must_use]
pub fn strong_sum_of(kind: StrongHashKind, parts: &[&[u8]]) -> [u8; MAX_STRONG_LEN] {
    let mut hasher = StrongHash::new(kind);
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; MAX_STRONG_LEN];
    hasher.finalize_into(&mut out);
    out
}

use digest::Digest;

use super::StrongDigest;

/// Streaming MD4 hasher, the legacy strong checksum (RFC 1320).
///
/// Kept for interoperability with signature streams produced by older
/// tooling; new signatures should prefer [`Blake2`](super::Blake2).
#[derive(Clone, Debug)]
pub struct Md4 {
    inner: md4::Md4,
}

impl Default for Md4 {
    fn default() -> Self {
        Self::new()
    }
}

impl Md4 {
    /// Creates a hasher with an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: md4::Md4::new(),
        }
    }

    /// Feeds additional bytes into the digest state.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finalises the digest and returns the 128-bit MD4 output.
    #[must_use]
    pub fn finalize(self) -> [u8; 16] {
        self.inner.finalize().into()
    }
}

impl StrongDigest for Md4 {
    type Digest = [u8; 16];
    const DIGEST_LEN: usize = 16;

    fn new() -> Self {
        Self::new()
    }

    fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    fn finalize(self) -> Self::Digest {
        self.inner.finalize().into()
    }
}

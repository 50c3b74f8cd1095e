use blake2::Blake2b;
use digest::Digest;
use digest::consts::U32;

type Blake2b256 = Blake2b<U32>;

/// Streaming BLAKE2b hasher with a 32-byte digest.
///
/// This is the default strong checksum for new signature streams.
#[derive(Clone, Debug)]
pub struct Blake2 {
    inner: Blake2b256,
}

impl Default for Blake2 {
    fn default() -> Self {
        Self::new()
    }
}

impl Blake2 {
    /// Creates a hasher with an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Blake2b256::new(),
        }
    }

    /// Feeds additional bytes into the digest state.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finalises the digest and returns the 256-bit BLAKE2b output.
    #[must_use]
    pub fn finalize(self) -> [u8; 32] {
        self.inner.finalize().into()
    }
}

impl super::StrongDigest for Blake2 {
    type Digest = [u8; 32];
    const DIGEST_LEN: usize = 32;

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strong::StrongDigest;

    fn to_hex(bytes: &[u8]) -> String {
        use std::fmt::Write as _;

        let mut out = String::with_capacity(bytes.len() * 2);
        for byte in bytes {
            write!(&mut out, "{byte:02x}").expect("write! to String cannot fail");
        }
        out
    }

    #[test]
    fn blake2b_256_matches_reference_vectors() {
        let vectors = [
            (
                b"".as_slice(),
                "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8",
            ),
            (
                b"abc".as_slice(),
                "bddd813c634239723171ef3fee98579b94964e3bb1cb3e427262c8c068d52319",
            ),
        ];

        for (input, expected_hex) in vectors {
            let mut hasher = Blake2::new();
            hasher.update(input);
            assert_eq!(to_hex(&hasher.finalize()), expected_hex);
        }
    }

    #[test]
    fn streaming_matches_one_shot() {
        let input = b"incremental hashing must not change the digest";
        let mut hasher = Blake2::new();
        hasher.update(&input[..10]);
        hasher.update(&input[10..]);
        assert_eq!(hasher.finalize(), <Blake2 as StrongDigest>::digest(input));
    }
}

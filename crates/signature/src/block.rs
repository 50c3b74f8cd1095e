use checksums::strong::MAX_STRONG_LEN;

/// Checksums describing one basis block.
///
/// The strong sum is stored at full buffer width; how many of its bytes are
/// meaningful is a property of the owning [`Signature`](crate::Signature)
/// (`strong_sum_len`), so comparisons always slice before comparing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BlockSig {
    index: u32,
    weak: u32,
    strong: [u8; MAX_STRONG_LEN],
}

impl BlockSig {
    /// Creates a block record. Bytes past the truncation length must be zero.
    #[must_use]
    pub const fn new(index: u32, weak: u32, strong: [u8; MAX_STRONG_LEN]) -> Self {
        Self {
            index,
            weak,
            strong,
        }
    }

    /// Position of the block in the basis, counted from zero.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Packed weak rolling checksum of the block.
    #[must_use]
    pub const fn weak(&self) -> u32 {
        self.weak
    }

    /// Strong sum buffer; only the owning signature's `strong_sum_len`
    /// leading bytes are meaningful.
    #[must_use]
    pub const fn strong(&self) -> &[u8; MAX_STRONG_LEN] {
        &self.strong
    }
}

use super::error::RollingError;

/// Offset added to every byte before it enters the checksum.
///
/// Without the offset, a window of zero bytes would checksum to zero no
/// matter its length, making runs of NUL bytes indistinguishable.
pub const CHAR_OFFSET: u32 = 31;

/// Weak rolling checksum over a byte window.
///
/// Two 16-bit components packed into a `u32` digest: `s1` accumulates the
/// offset-adjusted byte sum, `s2` accumulates prefix sums of `s1`. Both are
/// truncated to 16 bits after every operation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RollingChecksum {
    s1: u32,
    s2: u32,
    len: usize,
}

impl RollingChecksum {
    /// Creates a new rolling checksum with zeroed state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            s1: 0,
            s2: 0,
            len: 0,
        }
    }

    /// Resets the checksum back to its initial state.
    pub fn reset(&mut self) {
        self.s1 = 0;
        self.s2 = 0;
        self.len = 0;
    }

    /// Returns the number of bytes currently in the window.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no bytes have been observed yet.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Extends the window with an additional slice of bytes.
    #[inline]
    pub fn update(&mut self, chunk: &[u8]) {
        let (s1, s2) = accumulate_chunk(self.s1, self.s2, chunk);
        self.s1 = s1 & 0xffff;
        self.s2 = s2 & 0xffff;
        self.len = self.len.saturating_add(chunk.len());
    }

    /// Clears the state and computes the checksum of `block` in one step.
    pub fn update_from_block(&mut self, block: &[u8]) {
        self.reset();
        self.update(block);
    }

    /// Computes the packed checksum of `block` without keeping any state.
    #[must_use]
    pub fn sum_of(block: &[u8]) -> u32 {
        let mut checksum = Self::new();
        checksum.update(block);
        checksum.value()
    }

    /// Rotates the window: `outgoing` leaves at the front, `incoming` enters
    /// at the back. The window length is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`RollingError::EmptyWindow`] when no bytes have been observed
    /// and [`RollingError::WindowTooLarge`] when the window length does not
    /// fit in 32 bits.
    #[inline]
    pub fn rotate(&mut self, outgoing: u8, incoming: u8) -> Result<(), RollingError> {
        let window_len = self.window_len_u32()?;

        let out = u32::from(outgoing);
        let inn = u32::from(incoming);

        // The character offsets of the leaving and entering byte cancel in s1.
        let new_s1 = self.s1.wrapping_sub(out).wrapping_add(inn) & 0xffff;
        let new_s2 = self
            .s2
            .wrapping_sub(window_len.wrapping_mul(out.wrapping_add(CHAR_OFFSET)))
            .wrapping_add(new_s1)
            & 0xffff;

        self.s1 = new_s1;
        self.s2 = new_s2;
        Ok(())
    }

    /// Returns the checksum packed as `s1 | (s2 << 16)`.
    #[must_use]
    pub const fn value(&self) -> u32 {
        (self.s2 << 16) | self.s1
    }

    #[inline]
    fn window_len_u32(&self) -> Result<u32, RollingError> {
        if self.len == 0 {
            return Err(RollingError::EmptyWindow);
        }
        u32::try_from(self.len).map_err(|_| RollingError::WindowTooLarge { len: self.len })
    }
}

/// Accumulates `chunk` into `(s1, s2)` with 32-bit wrapping arithmetic.
///
/// Exact modulo 2^32, which the caller truncates to 16 bits; correctness
/// follows from 2^16 dividing 2^32.
#[inline]
fn accumulate_chunk(mut s1: u32, mut s2: u32, chunk: &[u8]) -> (u32, u32) {
    let mut iter = chunk.chunks_exact(4);
    for block in &mut iter {
        s1 = s1.wrapping_add(u32::from(block[0]).wrapping_add(CHAR_OFFSET));
        s2 = s2.wrapping_add(s1);

        s1 = s1.wrapping_add(u32::from(block[1]).wrapping_add(CHAR_OFFSET));
        s2 = s2.wrapping_add(s1);

        s1 = s1.wrapping_add(u32::from(block[2]).wrapping_add(CHAR_OFFSET));
        s2 = s2.wrapping_add(s1);

        s1 = s1.wrapping_add(u32::from(block[3]).wrapping_add(CHAR_OFFSET));
        s2 = s2.wrapping_add(s1);
    }

    for &byte in iter.remainder() {
        s1 = s1.wrapping_add(u32::from(byte).wrapping_add(CHAR_OFFSET));
        s2 = s2.wrapping_add(s1);
    }

    (s1, s2)
}

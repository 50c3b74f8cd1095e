/// Caller-owned I/O buffers for one [`Job::iter`](crate::Job::iter) call.
///
/// The job consumes some prefix of `input` and fills some prefix of
/// `output`; [`consumed`](Self::consumed) and [`produced`](Self::produced)
/// report exactly how much of each. `eof_in` promises that no input will
/// ever follow the current slice; it is what lets a job distinguish
/// "blocked waiting for bytes" from "the stream ended mid-record".
#[derive(Debug)]
pub struct Buffers<'i, 'o> {
    input: &'i [u8],
    consumed: usize,
    eof_in: bool,
    output: &'o mut [u8],
    produced: usize,
}

impl<'i, 'o> Buffers<'i, 'o> {
    /// Wraps the caller's buffers for one iteration.
    pub fn new(input: &'i [u8], eof_in: bool, output: &'o mut [u8]) -> Self {
        Self {
            input,
            consumed: 0,
            eof_in,
            output,
            produced: 0,
        }
    }

    /// Input bytes not yet consumed.
    #[must_use]
    pub fn remaining_input(&self) -> &[u8] {
        &self.input[self.consumed..]
    }

    /// Returns `true` when every supplied input byte has been consumed.
    #[must_use]
    pub fn input_is_empty(&self) -> bool {
        self.consumed == self.input.len()
    }

    /// Whether the caller has promised no further input after this slice.
    #[must_use]
    pub const fn eof_in(&self) -> bool {
        self.eof_in
    }

    /// Marks `n` input bytes as consumed.
    pub fn consume(&mut self, n: usize) {
        debug_assert!(self.consumed + n <= self.input.len());
        self.consumed += n;
    }

    /// Output space not yet filled.
    pub fn free_output(&mut self) -> &mut [u8] {
        &mut self.output[self.produced..]
    }

    /// Returns `true` when no output space remains.
    #[must_use]
    pub fn output_is_full(&self) -> bool {
        self.produced == self.output.len()
    }

    /// Marks `n` output bytes as produced.
    pub fn produce(&mut self, n: usize) {
        debug_assert!(self.produced + n <= self.output.len());
        self.produced += n;
    }

    /// Copies as much of `bytes` as fits into the output, returning the count.
    pub fn push_output(&mut self, bytes: &[u8]) -> usize {
        let space = self.free_output();
        let n = space.len().min(bytes.len());
        space[..n].copy_from_slice(&bytes[..n]);
        self.produced += n;
        n
    }

    /// Streams up to `max` bytes straight from input to output.
    pub fn copy_through(&mut self, max: usize) -> usize {
        let n = max
            .min(self.input.len() - self.consumed)
            .min(self.output.len() - self.produced);
        self.output[self.produced..self.produced + n]
            .copy_from_slice(&self.input[self.consumed..self.consumed + n]);
        self.consumed += n;
        self.produced += n;
        n
    }

    /// Total input bytes consumed so far in this iteration.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.consumed
    }

    /// Total output bytes produced so far in this iteration.
    #[must_use]
    pub const fn produced(&self) -> usize {
        self.produced
    }
}

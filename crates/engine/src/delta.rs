use std::collections::VecDeque;

use checksums::RollingChecksum;
use checksums::strong::{MAX_STRONG_LEN, StrongHash, StrongHashKind};
use protocol::{Command, DELTA_MAGIC, netint};
use signature::Signature;

use crate::buffers::Buffers;
use crate::error::JobError;
use crate::job::{Job, OutQueue, Status};
use crate::stats::Stats;

/// Rotations between full recomputations of the rolling sum. Zero disables
/// the periodic reset.
pub const DEFAULT_ROLL_PARANOIA: usize = 4096;

/// Literal run length at which a pending run is flushed to a command, so
/// buffered state stays bounded on streams with no matches. Flushing depends
/// only on accumulated counts, which keeps the emitted delta independent of
/// how the caller chunks its buffers.
const LITERAL_FLUSH_LEN: usize = 1 << 16;

#[derive(Clone, Copy, Debug)]
enum State {
    Header,
    Scan,
    Drain,
    Done,
}

#[derive(Clone, Copy, Debug)]
struct CopyRun {
    offset: u64,
    len: u64,
}

/// Streaming delta generator.
///
/// Rolls a `block_len` window over the new stream and emits COPY commands
/// for windows confirmed against the signature, literals for everything
/// else. The job borrows the signature read-only for its lifetime; any
/// number of delta jobs may share one indexed signature.
///
/// The matcher commits to the first confirmed match without lookahead and
/// prefers the lowest basis block when several match, so output is
/// deterministic. Adjacent copies that continue one another in the basis
/// are merged into a single command.
#[derive(Debug)]
pub struct DeltaJob<'a> {
    sig: &'a Signature,
    kind: StrongHashKind,
    state: State,
    window: VecDeque<u8>,
    weak: RollingChecksum,
    weak_valid: bool,
    rolls_since_reset: usize,
    roll_paranoia: usize,
    lit: Vec<u8>,
    copy: Option<CopyRun>,
    out: OutQueue,
    stats: Stats,
}

impl<'a> DeltaJob<'a> {
    /// Starts a delta job against an indexed signature.
    ///
    /// # Errors
    ///
    /// [`JobError::Param`] when the signature has not been indexed with
    /// [`Signature::build_hash_table`].
    pub fn new(sig: &'a Signature) -> Result<Self, JobError> {
        if !sig.is_indexed() {
            return Err(JobError::Param(
                "signature must be indexed with build_hash_table before delta".into(),
            ));
        }
        let mut stats = Stats::new("delta");
        stats.block_len = sig.block_len();
        stats.sig_blocks = sig.len() as u64;
        Ok(Self {
            sig,
            kind: sig.hash_kind(),
            state: State::Header,
            window: VecDeque::with_capacity(sig.block_len() as usize),
            weak: RollingChecksum::new(),
            weak_valid: false,
            rolls_since_reset: 0,
            roll_paranoia: DEFAULT_ROLL_PARANOIA,
            lit: Vec::new(),
            copy: None,
            out: OutQueue::new(),
            stats,
        })
    }

    /// Overrides how many rotations may pass between full recomputations of
    /// the rolling sum; zero disables the reset entirely.
    pub fn set_roll_paranoia(&mut self, rolls: usize) {
        self.roll_paranoia = rolls;
    }

    /// Recomputes the weak sum from the window bytes.
    fn reset_weak(&mut self) {
        let (front, back) = self.window.as_slices();
        self.weak.reset();
        self.weak.update(front);
        self.weak.update(back);
        self.weak_valid = true;
        self.rolls_since_reset = 0;
    }

    /// Flushes the pending copy run, if any, as one COPY command.
    fn flush_copy(&mut self) {
        if let Some(run) = self.copy.take() {
            let header = Command::Copy {
                offset: run.offset,
                len: run.len,
            }
            .encode_into(self.out.buf_mut());
            self.stats.copy_cmds += 1;
            self.stats.copy_bytes += run.len;
            self.stats.copy_cmdbytes += header as u64;
            logging::log_trace!("emit copy offset={} len={}", run.offset, run.len);
        }
    }

    /// Flushes the pending literal run as one LITERAL command.
    ///
    /// The pending copy, which precedes these bytes in stream order, is
    /// flushed first.
    fn flush_literal_run(&mut self) {
        if self.lit.is_empty() {
            return;
        }
        self.flush_copy();
        let header = Command::Literal {
            len: self.lit.len() as u64,
        }
        .encode_into(self.out.buf_mut());
        self.out.push_slice(&self.lit);
        self.stats.lit_cmds += 1;
        self.stats.lit_bytes += self.lit.len() as u64;
        self.stats.lit_cmdbytes += header as u64;
        logging::log_trace!("emit literal len={}", self.lit.len());
        self.lit.clear();
    }

    /// Extends the pending copy run when `offset` continues it, otherwise
    /// starts a new run.
    fn push_copy(&mut self, offset: u64, len: u64) {
        match &mut self.copy {
            Some(run) if run.offset + run.len == offset => run.len += len,
            _ => {
                self.flush_copy();
                self.copy = Some(CopyRun { offset, len });
            }
        }
    }

    /// Probes the signature with the current window, updating statistics.
    fn probe(&mut self, weak: u32) -> Option<u32> {
        let kind = self.kind;
        let window = &self.window;
        let outcome = self.sig.find_match(weak, || window_strong(kind, window));
        self.stats.false_matches += u64::from(outcome.false_matches);
        outcome.matched
    }

    /// Emits the end of the delta: a possible short-window match, the final
    /// literal, and the END command.
    fn finish(&mut self) {
        let block_len = self.sig.block_len() as usize;

        // A residual window shorter than a block can only match the trailing
        // short basis block; its sums cover exactly the same byte count.
        if !self.window.is_empty() && self.window.len() < block_len {
            let (front, back) = self.window.as_slices();
            let mut weak = RollingChecksum::new();
            weak.update(front);
            weak.update(back);
            if let Some(index) = self.probe(weak.value()) {
                self.flush_literal_run();
                self.push_copy(
                    u64::from(index) * block_len as u64,
                    self.window.len() as u64,
                );
                self.window.clear();
            }
        }

        if !self.window.is_empty() {
            self.lit.extend(self.window.drain(..));
        }
        self.flush_literal_run();
        self.flush_copy();
        Command::End.encode_into(self.out.buf_mut());
        self.state = State::Drain;
    }

    fn step(&mut self, buffers: &mut Buffers<'_, '_>) -> Result<Status, JobError> {
        loop {
            if !self.out.flush(buffers) {
                return Ok(Status::Blocked);
            }
            match self.state {
                State::Header => {
                    netint::put_u32(self.out.buf_mut(), DELTA_MAGIC);
                    self.state = State::Scan;
                }
                State::Scan => {
                    let block_len = self.sig.block_len() as usize;

                    // Refill the window up to one block.
                    if self.window.len() < block_len {
                        let take = (block_len - self.window.len())
                            .min(buffers.remaining_input().len());
                        if take > 0 {
                            self.window.extend(&buffers.remaining_input()[..take]);
                            buffers.consume(take);
                        }
                        if self.window.len() < block_len {
                            if buffers.eof_in() && buffers.input_is_empty() {
                                self.finish();
                                continue;
                            }
                            return Ok(Status::Blocked);
                        }
                        self.reset_weak();
                    } else if !self.weak_valid {
                        self.reset_weak();
                    }

                    if let Some(index) = self.probe(self.weak.value()) {
                        self.flush_literal_run();
                        self.push_copy(u64::from(index) * block_len as u64, block_len as u64);
                        self.window.clear();
                        self.weak_valid = false;
                        continue;
                    }

                    // Miss: slide the window one byte forward.
                    if buffers.input_is_empty() {
                        if buffers.eof_in() {
                            self.finish();
                            continue;
                        }
                        return Ok(Status::Blocked);
                    }
                    let outgoing = self
                        .window
                        .pop_front()
                        .ok_or(JobError::Internal("scan window empty on miss"))?;
                    let incoming = buffers.remaining_input()[0];
                    buffers.consume(1);
                    self.window.push_back(incoming);
                    self.weak
                        .rotate(outgoing, incoming)
                        .map_err(|_| JobError::Internal("rolling window invariant violated"))?;
                    self.lit.push(outgoing);
                    self.rolls_since_reset += 1;
                    if self.roll_paranoia != 0 && self.rolls_since_reset >= self.roll_paranoia {
                        self.reset_weak();
                    }
                    if self.lit.len() >= LITERAL_FLUSH_LEN {
                        self.flush_literal_run();
                    }
                }
                State::Drain => {
                    // Reached only once the queue is empty.
                    logging::log_debug!("{}", self.stats);
                    self.state = State::Done;
                }
                State::Done => return Ok(Status::Done),
            }
        }
    }
}

/// Strong sum of the current window, for match confirmation.
fn window_strong(kind: StrongHashKind, window: &VecDeque<u8>) -> [u8; MAX_STRONG_LEN] {
    let (front, back) = window.as_slices();
    let mut hasher = StrongHash::new(kind);
    hasher.update(front);
    hasher.update(back);
    let mut out = [0u8; MAX_STRONG_LEN];
    hasher.finalize_into(&mut out);
    out
}

impl Job for DeltaJob<'_> {
    fn iter(&mut self, buffers: &mut Buffers<'_, '_>) -> Result<Status, JobError> {
        let consumed_before = buffers.consumed();
        let produced_before = buffers.produced();
        let result = self.step(buffers);
        self.stats.in_bytes += (buffers.consumed() - consumed_before) as u64;
        self.stats.out_bytes += (buffers.produced() - produced_before) as u64;
        result
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::SignatureMagic;

    fn indexed(basis: &[u8], block_len: u32) -> Signature {
        let mut signature =
            Signature::from_buffer(basis, block_len, 0, SignatureMagic::Blake2).unwrap();
        signature.build_hash_table();
        signature
    }

    fn run_delta(sig: &Signature, new: &[u8], in_chunk: usize, out_chunk: usize) -> Vec<u8> {
        let mut job = DeltaJob::new(sig).unwrap();
        let mut delta = Vec::new();
        let mut offset: usize = 0;
        let mut scratch = vec![0u8; out_chunk];
        loop {
            let end = offset.saturating_add(in_chunk).min(new.len());
            let eof = end == new.len();
            let mut buffers = Buffers::new(&new[offset..end], eof, &mut scratch);
            let status = job.iter(&mut buffers).expect("delta job must not fail");
            offset += buffers.consumed();
            let produced_len = buffers.produced();
            delta.extend_from_slice(&scratch[..produced_len]);
            if status == Status::Done {
                return delta;
            }
        }
    }

    #[test]
    fn unindexed_signature_is_rejected() {
        let signature = Signature::from_buffer(b"abcd", 4, 0, SignatureMagic::Blake2).unwrap();
        assert!(matches!(
            DeltaJob::new(&signature),
            Err(JobError::Param(_))
        ));
    }

    #[test]
    fn empty_new_stream_is_magic_plus_end() {
        let signature = indexed(b"", 4);
        let delta = run_delta(&signature, b"", usize::MAX, 64);
        assert_eq!(delta, [0x72, 0x73, 0x02, 0x36, 0x00]);
    }

    #[test]
    fn unmatched_stream_becomes_one_literal() {
        let signature = indexed(b"", 4);
        let delta = run_delta(&signature, b"hello", usize::MAX, 64);
        assert_eq!(delta, [0x72, 0x73, 0x02, 0x36, 0x05, b'h', b'e', b'l', b'l', b'o', 0x00]);
    }

    #[test]
    fn identical_stream_is_all_copies() {
        let basis = b"abcdabcd";
        let signature = indexed(basis, 4);
        let mut job = DeltaJob::new(&signature).unwrap();
        let mut scratch = [0u8; 64];
        let mut buffers = Buffers::new(basis, true, &mut scratch);
        assert_eq!(job.iter(&mut buffers).unwrap(), Status::Done);

        // Both windows match block 0 (lowest index), so the two copies are
        // not contiguous and stay separate commands.
        let produced = buffers.produced();
        assert_eq!(
            &scratch[..produced],
            &[0x72, 0x73, 0x02, 0x36, 0x45, 0x00, 0x04, 0x45, 0x00, 0x04, 0x00]
        );
        assert_eq!(job.stats().lit_bytes, 0);
        assert_eq!(job.stats().copy_bytes, 8);
    }

    #[test]
    fn contiguous_matches_merge_into_one_copy() {
        let basis = b"abcdefgh";
        let signature = indexed(basis, 4);
        let delta = run_delta(&signature, basis, usize::MAX, 64);
        assert_eq!(delta, [0x72, 0x73, 0x02, 0x36, 0x45, 0x00, 0x08, 0x00]);
    }

    #[test]
    fn mixed_stream_interleaves_literals_and_copies() {
        let basis = b"abcdefgh";
        let signature = indexed(basis, 4);
        let mut job = DeltaJob::new(&signature).unwrap();
        let new = b"Zabcdefgh!";
        let mut scratch = [0u8; 64];
        let mut buffers = Buffers::new(new, true, &mut scratch);
        assert_eq!(job.iter(&mut buffers).unwrap(), Status::Done);

        let produced = buffers.produced();
        assert_eq!(
            &scratch[..produced],
            &[
                0x72, 0x73, 0x02, 0x36, // delta magic
                0x01, b'Z', // literal "Z"
                0x45, 0x00, 0x08, // copy offset 0 len 8
                0x01, b'!', // literal "!"
                0x00, // end
            ]
        );
        assert_eq!(job.stats().lit_bytes, 2);
        assert_eq!(job.stats().copy_bytes, 8);
    }

    #[test]
    fn rolling_scan_finds_match_inside_the_new_stream() {
        let signature = indexed(b"abcd", 4);
        let delta = run_delta(&signature, b"XXabcdYY", usize::MAX, 64);
        assert_eq!(
            delta,
            [
                0x72, 0x73, 0x02, 0x36,
                0x02, b'X', b'X',
                0x45, 0x00, 0x04,
                0x02, b'Y', b'Y',
                0x00,
            ]
        );
    }

    #[test]
    fn misaligned_basis_content_stays_literal() {
        // "abcd" spans two basis blocks ("XXab", "cdYY"); block-aligned
        // matching cannot use it.
        let signature = indexed(b"XXabcdYY", 4);
        let delta = run_delta(&signature, b"abcd", usize::MAX, 64);
        assert_eq!(
            delta,
            [0x72, 0x73, 0x02, 0x36, 0x04, b'a', b'b', b'c', b'd', 0x00]
        );
    }

    #[test]
    fn short_tail_matches_the_trailing_short_block() {
        // Basis blocks: "abcd" and "ef"; the new stream is exactly the short
        // trailing block, matchable only at EOF.
        let signature = indexed(b"abcdef", 4);
        let delta = run_delta(&signature, b"ef", usize::MAX, 64);
        assert_eq!(delta, [0x72, 0x73, 0x02, 0x36, 0x45, 0x04, 0x02, 0x00]);
    }

    #[test]
    fn full_tail_merges_with_preceding_copy() {
        // New = basis with a short trailing block; identity delta must be a
        // single copy covering the whole basis, with no literal bytes.
        let basis = b"abcdefgh01";
        let signature = indexed(basis, 4);
        let delta = run_delta(&signature, basis, usize::MAX, 64);
        assert_eq!(delta, [0x72, 0x73, 0x02, 0x36, 0x45, 0x00, 0x0a, 0x00]);
    }

    #[test]
    fn false_match_is_counted_and_scan_continues() {
        // [0, 2, 0] and [1, 0, 1] collide on the weak sum but differ in
        // content, so the probe must reject the candidate and keep scanning.
        let signature = indexed(&[0, 2, 0], 3);
        let mut job = DeltaJob::new(&signature).unwrap();
        let mut scratch = [0u8; 64];
        let mut buffers = Buffers::new(&[1, 0, 1], true, &mut scratch);
        assert_eq!(job.iter(&mut buffers).unwrap(), Status::Done);
        assert_eq!(job.stats().false_matches, 1);
        assert_eq!(job.stats().lit_bytes, 3);
    }

    #[test]
    fn output_is_independent_of_buffer_chunking() {
        let basis: Vec<u8> = (0u32..4096).map(|i| (i * 131 % 251) as u8).collect();
        let mut new = basis.clone();
        new.splice(777..777, [0xAA, 0xBB, 0xCC]);
        new.truncate(3000);
        let signature = indexed(&basis, 64);

        let reference = run_delta(&signature, &new, usize::MAX, 4096);
        for (in_chunk, out_chunk) in [(1, 1), (3, 2), (7, 64), (1024, 5)] {
            assert_eq!(
                run_delta(&signature, &new, in_chunk, out_chunk),
                reference,
                "delta changed with in_chunk={in_chunk} out_chunk={out_chunk}"
            );
        }
    }

    #[test]
    fn paranoia_interval_does_not_change_output() {
        let basis: Vec<u8> = (0u32..8192).map(|i| (i * 197 % 250) as u8).collect();
        let mut new = basis.clone();
        for i in (0..new.len()).step_by(513) {
            new[i] ^= 0x5A;
        }
        let signature = indexed(&basis, 128);

        let mut deltas = Vec::new();
        for paranoia in [0usize, 16, DEFAULT_ROLL_PARANOIA] {
            let mut job = DeltaJob::new(&signature).unwrap();
            job.set_roll_paranoia(paranoia);
            let mut delta = Vec::new();
            let mut scratch = [0u8; 512];
            let mut offset = 0;
            loop {
                let mut buffers = Buffers::new(&new[offset..], true, &mut scratch);
                let status = job.iter(&mut buffers).unwrap();
                offset += buffers.consumed();
                let produced_len = buffers.produced();
                delta.extend_from_slice(&scratch[..produced_len]);
                if status == Status::Done {
                    break;
                }
            }
            deltas.push(delta);
        }
        assert_eq!(deltas[0], deltas[1]);
        assert_eq!(deltas[1], deltas[2]);
    }

    mod proptest_tests {
        use super::*;
        use crate::patch::PatchJob;
        use proptest::prelude::*;

        fn run_patch(basis: &[u8], delta: &[u8]) -> Vec<u8> {
            let mut job = PatchJob::new(basis);
            let mut new = Vec::new();
            let mut scratch = [0u8; 257];
            let mut offset = 0;
            loop {
                let mut buffers = Buffers::new(&delta[offset..], true, &mut scratch);
                let status = job.iter(&mut buffers).expect("patch of own delta");
                offset += buffers.consumed();
                let produced_len = buffers.produced();
                new.extend_from_slice(&scratch[..produced_len]);
                if status == Status::Done {
                    return new;
                }
            }
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(48))]

            /// Patching a generated delta always reproduces the new stream.
            #[test]
            fn delta_then_patch_reproduces_new(
                basis in proptest::collection::vec(any::<u8>(), 0..1024),
                new in proptest::collection::vec(any::<u8>(), 0..1024),
                block_len in 1u32..64,
            ) {
                let signature = indexed(&basis, block_len);
                let delta = run_delta(&signature, &new, 31, 17);
                prop_assert_eq!(run_patch(&basis, &delta), new);
            }

            /// Deltas of correlated streams reproduce them too, and an
            /// identity delta never carries literal bytes.
            #[test]
            fn identity_is_pure_copy(
                basis in proptest::collection::vec(any::<u8>(), 1..2048),
                block_len in 1u32..128,
            ) {
                let signature = indexed(&basis, block_len);
                let mut job = DeltaJob::new(&signature).unwrap();
                let mut delta = Vec::new();
                let mut scratch = [0u8; 509];
                let mut offset = 0;
                loop {
                    let mut buffers = Buffers::new(&basis[offset..], true, &mut scratch);
                    let status = job.iter(&mut buffers).unwrap();
                    offset += buffers.consumed();
                    let produced_len = buffers.produced();
                    delta.extend_from_slice(&scratch[..produced_len]);
                    if status == Status::Done {
                        break;
                    }
                }
                prop_assert_eq!(job.stats().lit_bytes, 0);
                prop_assert_eq!(job.stats().copy_bytes, basis.len() as u64);
                prop_assert_eq!(run_patch(&basis, &delta), basis);
            }
        }
    }

    #[test]
    fn window_bytes_spanning_chunks_still_match() {
        // Feed the new stream byte by byte so the window always straddles
        // iteration boundaries.
        let basis = b"0123456789abcdef";
        let signature = indexed(basis, 8);
        let delta = run_delta(&signature, basis, 1, 1);
        assert_eq!(delta, [0x72, 0x73, 0x02, 0x36, 0x45, 0x00, 0x10, 0x00]);
    }
}

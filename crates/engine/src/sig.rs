use checksums::RollingChecksum;
use checksums::strong::{MAX_STRONG_LEN, StrongHash, StrongHashKind};
use protocol::{SignatureMagic, netint};
use signature::{hash_kind, resolved_strong_len};

use crate::buffers::Buffers;
use crate::error::JobError;
use crate::job::{Job, OutQueue, Status};
use crate::stats::Stats;

#[derive(Clone, Copy, Debug)]
enum State {
    Header,
    Blocks,
    Done,
}

/// Streaming generator of a signature stream.
///
/// Consumes the basis and produces `magic, block_len, strong_sum_len`
/// followed by one `(weak, strong)` record per block. The final block may be
/// short; its sums cover exactly the remainder bytes.
#[derive(Debug)]
pub struct SigJob {
    state: State,
    magic: SignatureMagic,
    kind: StrongHashKind,
    block_len: u32,
    strong_sum_len: u32,
    block: Vec<u8>,
    out: OutQueue,
    stats: Stats,
}

impl SigJob {
    /// Starts a signature job.
    ///
    /// A `strong_sum_len` of zero selects the hash family's full width.
    ///
    /// # Errors
    ///
    /// [`JobError::Param`] when `block_len` is zero or `strong_sum_len`
    /// exceeds the hash's native width.
    pub fn new(
        block_len: u32,
        strong_sum_len: u32,
        magic: SignatureMagic,
    ) -> Result<Self, JobError> {
        if block_len == 0 {
            return Err(JobError::Param("block length must be non-zero".into()));
        }
        let strong_sum_len = resolved_strong_len(magic, strong_sum_len)?;
        let mut stats = Stats::new("signature");
        stats.block_len = block_len;
        Ok(Self {
            state: State::Header,
            magic,
            kind: hash_kind(magic),
            block_len,
            strong_sum_len,
            block: Vec::with_capacity(block_len as usize),
            out: OutQueue::new(),
            stats,
        })
    }

    fn emit_record(&mut self) {
        let weak = RollingChecksum::sum_of(&self.block);
        let mut strong = [0u8; MAX_STRONG_LEN];
        let mut hasher = StrongHash::new(self.kind);
        hasher.update(&self.block);
        hasher.finalize_into(&mut strong);

        netint::put_u32(self.out.buf_mut(), weak);
        self.out.push_slice(&strong[..self.strong_sum_len as usize]);

        self.block.clear();
        self.stats.sig_blocks += 1;
    }

    fn step(&mut self, buffers: &mut Buffers<'_, '_>) -> Result<Status, JobError> {
        loop {
            if !self.out.flush(buffers) {
                return Ok(Status::Blocked);
            }
            match self.state {
                State::Header => {
                    let out = self.out.buf_mut();
                    netint::put_u32(out, self.magic.to_wire());
                    netint::put_u32(out, self.block_len);
                    netint::put_u32(out, self.strong_sum_len);
                    self.state = State::Blocks;
                }
                State::Blocks => {
                    let want = self.block_len as usize - self.block.len();
                    let available = buffers.remaining_input().len();
                    if want > 0 && available > 0 {
                        let take = want.min(available);
                        self.block
                            .extend_from_slice(&buffers.remaining_input()[..take]);
                        buffers.consume(take);
                    }
                    if self.block.len() == self.block_len as usize {
                        self.emit_record();
                        continue;
                    }
                    // A partial block means the input ran dry.
                    if !buffers.eof_in() {
                        return Ok(Status::Blocked);
                    }
                    if !self.block.is_empty() {
                        self.emit_record();
                        continue;
                    }
                    logging::log_debug!(
                        "signature complete: {} blocks of {} bytes",
                        self.stats.sig_blocks,
                        self.block_len
                    );
                    self.state = State::Done;
                }
                State::Done => return Ok(Status::Done),
            }
        }
    }
}

impl Job for SigJob {
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

    fn run_to_completion(job: &mut SigJob, input: &[u8], out_chunk: usize) -> Vec<u8> {
        let mut produced = Vec::new();
        let mut offset = 0;
        let mut scratch = vec![0u8; out_chunk];
        loop {
            let mut buffers = Buffers::new(&input[offset..], true, &mut scratch);
            let status = job.iter(&mut buffers).expect("signature job must not fail");
            offset += buffers.consumed();
            let produced_now = buffers.produced();
            produced.extend_from_slice(&scratch[..produced_now]);
            if status == Status::Done {
                return produced;
            }
        }
    }

    #[test]
    fn empty_input_emits_header_only() {
        let mut job = SigJob::new(2048, 0, SignatureMagic::Blake2).unwrap();
        let stream = run_to_completion(&mut job, b"", 64);
        assert_eq!(&stream[..4], b"rs\x017");
        assert_eq!(stream.len(), 12);
        assert_eq!(&stream[4..8], &2048u32.to_be_bytes());
        assert_eq!(&stream[8..12], &32u32.to_be_bytes());
        assert_eq!(job.stats().sig_blocks, 0);
    }

    #[test]
    fn remainder_block_is_summed_over_its_own_bytes() {
        let mut job = SigJob::new(4, 4, SignatureMagic::Blake2).unwrap();
        let stream = run_to_completion(&mut job, b"abcdef", 1);

        // Header + two records of (4 weak + 4 strong) bytes.
        assert_eq!(stream.len(), 12 + 2 * 8);
        let first_weak = netint::get_u32(&stream[12..]);
        assert_eq!(first_weak, RollingChecksum::sum_of(b"abcd"));
        let second_weak = netint::get_u32(&stream[20..]);
        assert_eq!(second_weak, RollingChecksum::sum_of(b"ef"));
        assert_eq!(job.stats().sig_blocks, 2);
        assert_eq!(job.stats().in_bytes, 6);
        assert_eq!(job.stats().out_bytes, stream.len() as u64);
    }

    #[test]
    fn invalid_parameters_are_rejected_up_front() {
        assert!(matches!(
            SigJob::new(0, 8, SignatureMagic::Blake2),
            Err(JobError::Param(_))
        ));
        assert!(matches!(
            SigJob::new(2048, 33, SignatureMagic::Blake2),
            Err(JobError::Param(_))
        ));
        assert!(matches!(
            SigJob::new(2048, 17, SignatureMagic::Md4),
            Err(JobError::Param(_))
        ));
    }
}

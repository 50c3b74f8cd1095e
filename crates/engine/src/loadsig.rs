use checksums::strong::MAX_STRONG_LEN;
use protocol::{SignatureMagic, netint};
use signature::Signature;

use crate::buffers::Buffers;
use crate::error::JobError;
use crate::job::{Job, ScanBuffer, Status};
use crate::stats::Stats;

#[derive(Clone, Copy, Debug)]
enum State {
    Magic,
    Params,
    Records,
    Done,
}

/// Streaming parser of a signature stream into a [`Signature`].
///
/// The inverse of [`SigJob`](crate::SigJob). The parsed signature does not
/// know the basis length (the stream does not carry it); callers that know
/// it supply it with [`Signature::set_flength`]. The signature must still be
/// indexed with [`Signature::build_hash_table`] before matching.
#[derive(Debug)]
pub struct LoadSigJob {
    state: State,
    scan: ScanBuffer,
    magic: SignatureMagic,
    record_len: usize,
    signature: Option<Signature>,
    stats: Stats,
}

impl Default for LoadSigJob {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadSigJob {
    /// Starts a signature-loading job.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Magic,
            scan: ScanBuffer::new(),
            magic: SignatureMagic::default(),
            record_len: 0,
            signature: None,
            stats: Stats::new("loadsig"),
        }
    }

    /// Takes the parsed signature out of a finished job.
    ///
    /// # Errors
    ///
    /// [`JobError::Param`] when the job has not reached `Done`.
    pub fn into_signature(self) -> Result<Signature, JobError> {
        match (self.state, self.signature) {
            (State::Done, Some(signature)) => Ok(signature),
            _ => Err(JobError::Param(
                "signature load has not finished".into(),
            )),
        }
    }

    fn step(&mut self, buffers: &mut Buffers<'_, '_>) -> Result<Status, JobError> {
        loop {
            match self.state {
                State::Magic => {
                    if !self.scan.fill(4, buffers) {
                        return starved(buffers);
                    }
                    let found = netint::get_u32(self.scan.as_slice());
                    let Some(magic) = SignatureMagic::from_wire(found) else {
                        return Err(JobError::BadMagic { found });
                    };
                    self.scan.consume(4);
                    self.magic = magic;
                    self.state = State::Params;
                }
                State::Params => {
                    if !self.scan.fill(8, buffers) {
                        return starved(buffers);
                    }
                    let block_len = netint::get_u32(self.scan.as_slice());
                    let strong_sum_len = netint::get_u32(&self.scan.as_slice()[4..]);
                    self.scan.consume(8);

                    if block_len == 0 {
                        return Err(JobError::Corrupt(
                            "zero block length in signature header".into(),
                        ));
                    }
                    let width = signature::hash_kind(self.magic).digest_len() as u32;
                    if strong_sum_len == 0 || strong_sum_len > width {
                        return Err(JobError::Corrupt(format!(
                            "impossible strong sum length {strong_sum_len} in signature header"
                        )));
                    }

                    let signature = Signature::new(block_len, strong_sum_len, self.magic)
                        .map_err(|err| JobError::Corrupt(err.to_string()))?;
                    self.stats.block_len = block_len;
                    self.record_len = 4 + strong_sum_len as usize;
                    self.signature = Some(signature);
                    self.state = State::Records;
                }
                State::Records => {
                    if self.scan.fill(self.record_len, buffers) {
                        let record = self.scan.as_slice();
                        let weak = netint::get_u32(record);
                        let mut strong = [0u8; MAX_STRONG_LEN];
                        strong[..self.record_len - 4].copy_from_slice(&record[4..self.record_len]);
                        self.signature
                            .as_mut()
                            .ok_or(JobError::Internal("signature missing in record state"))?
                            .push_block(weak, strong);
                        self.scan.consume(self.record_len);
                        self.stats.sig_blocks += 1;
                        continue;
                    }
                    if !(buffers.eof_in() && buffers.input_is_empty()) {
                        return Ok(Status::Blocked);
                    }
                    if !self.scan.is_empty() {
                        return Err(JobError::Corrupt(
                            "truncated record at end of signature".into(),
                        ));
                    }
                    logging::log_debug!("loaded {} block signatures", self.stats.sig_blocks);
                    self.state = State::Done;
                }
                State::Done => return Ok(Status::Done),
            }
        }
    }
}

/// Header states: starve either as blocked or, at EOF, as a truncated stream.
fn starved(buffers: &Buffers<'_, '_>) -> Result<Status, JobError> {
    if buffers.eof_in() && buffers.input_is_empty() {
        Err(JobError::InputEnded)
    } else {
        Ok(Status::Blocked)
    }
}

impl Job for LoadSigJob {
    fn iter(&mut self, buffers: &mut Buffers<'_, '_>) -> Result<Status, JobError> {
        let consumed_before = buffers.consumed();
        let result = self.step(buffers);
        self.stats.in_bytes += (buffers.consumed() - consumed_before) as u64;
        result
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

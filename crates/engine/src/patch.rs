use std::io::{self, Read, Seek, SeekFrom};

use protocol::{Command, DELTA_MAGIC, netint};

use crate::buffers::Buffers;
use crate::error::JobError;
use crate::job::{Job, ScanBuffer, Status};
use crate::stats::Stats;

/// Random-access view of the basis stream a patch executes against.
///
/// The engine asks for up to `buf.len()` bytes starting at `pos`; the
/// source fills a prefix and returns its length. Short reads are fine (the
/// engine retries for the remainder), but zero bytes means the requested
/// position is past the end of the basis, which makes the delta corrupt.
pub trait CopySource {
    /// Reads up to `buf.len()` bytes of the basis starting at `pos`.
    ///
    /// # Errors
    ///
    /// Any I/O failure; it terminates the patch job.
    fn copy(&mut self, pos: u64, buf: &mut [u8]) -> io::Result<usize>;
}

impl CopySource for &[u8] {
    fn copy(&mut self, pos: u64, buf: &mut [u8]) -> io::Result<usize> {
        let Ok(pos) = usize::try_from(pos) else {
            return Ok(0);
        };
        if pos >= self.len() {
            return Ok(0);
        }
        let n = buf.len().min(self.len() - pos);
        buf[..n].copy_from_slice(&self[pos..pos + n]);
        Ok(n)
    }
}

/// [`CopySource`] over any seekable reader, e.g. a basis file.
#[derive(Debug)]
pub struct BasisReader<T> {
    inner: T,
}

impl<T: Read + Seek> BasisReader<T> {
    /// Wraps a seekable reader as a basis for patching.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Returns the wrapped reader.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Seek> CopySource for BasisReader<T> {
    fn copy(&mut self, pos: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.seek(SeekFrom::Start(pos))?;
        loop {
            match self.inner.read(buf) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum State {
    Magic,
    Command,
    Literal { remaining: u64 },
    Copy { pos: u64, remaining: u64 },
    Done,
}

/// Streaming delta interpreter.
///
/// Consumes a delta stream and produces the new stream, satisfying COPY
/// commands from a caller-supplied [`CopySource`]. Output is produced in
/// strict command order; nothing is reordered.
#[derive(Debug)]
pub struct PatchJob<S> {
    source: S,
    state: State,
    scan: ScanBuffer,
    stats: Stats,
}

impl<S: CopySource> PatchJob<S> {
    /// Starts a patch job reading basis bytes from `source`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: State::Magic,
            scan: ScanBuffer::new(),
            stats: Stats::new("patch"),
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
                    if found != DELTA_MAGIC {
                        return Err(JobError::BadMagic { found });
                    }
                    self.scan.consume(4);
                    self.state = State::Command;
                }
                State::Command => {
                    if !self.scan.fill(1, buffers) {
                        return starved(buffers);
                    }
                    let opcode = self.scan.as_slice()[0];
                    let need = 1 + Command::operand_len(opcode)?;
                    if !self.scan.fill(need, buffers) {
                        return starved(buffers);
                    }
                    let (command, used) = Command::decode(self.scan.as_slice())?
                        .ok_or(JobError::Internal("command decode underflow"))?;
                    self.scan.consume(used);

                    match command {
                        Command::End => {
                            logging::log_debug!("{}", self.stats);
                            self.state = State::Done;
                        }
                        Command::Literal { len } => {
                            logging::log_trace!("exec literal len={len}");
                            self.stats.lit_cmds += 1;
                            self.stats.lit_cmdbytes += used as u64;
                            self.state = State::Literal { remaining: len };
                        }
                        Command::Copy { offset, len } => {
                            logging::log_trace!("exec copy offset={offset} len={len}");
                            self.stats.copy_cmds += 1;
                            self.stats.copy_cmdbytes += used as u64;
                            self.state = State::Copy {
                                pos: offset,
                                remaining: len,
                            };
                        }
                    }
                }
                State::Literal { ref mut remaining } => {
                    let max = usize::try_from(*remaining).unwrap_or(usize::MAX);
                    let copied = buffers.copy_through(max);
                    *remaining -= copied as u64;
                    self.stats.lit_bytes += copied as u64;
                    if *remaining == 0 {
                        self.state = State::Command;
                        continue;
                    }
                    // Out of payload bytes, or out of output room.
                    return starved(buffers);
                }
                State::Copy {
                    ref mut pos,
                    ref mut remaining,
                } => {
                    let space = buffers.free_output();
                    if space.is_empty() {
                        return Ok(Status::Blocked);
                    }
                    let ask = usize::try_from(*remaining)
                        .unwrap_or(usize::MAX)
                        .min(space.len());
                    let read = self.source.copy(*pos, &mut space[..ask])?;
                    if read == 0 {
                        return Err(JobError::Corrupt("copy past end of basis".into()));
                    }
                    if read > ask {
                        return Err(JobError::Internal("copy source overfilled the buffer"));
                    }
                    buffers.produce(read);
                    self.stats.copy_bytes += read as u64;
                    *pos += read as u64;
                    *remaining -= read as u64;
                    if *remaining == 0 {
                        self.state = State::Command;
                    }
                    // A short read loops and asks again for the remainder.
                }
                State::Done => return Ok(Status::Done),
            }
        }
    }
}

/// Input starvation: blocked, unless EOF was promised, which makes the
/// delta truncated.
fn starved(buffers: &Buffers<'_, '_>) -> Result<Status, JobError> {
    if buffers.eof_in() && buffers.input_is_empty() {
        Err(JobError::InputEnded)
    } else {
        Ok(Status::Blocked)
    }
}

impl<S: CopySource> Job for PatchJob<S> {
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

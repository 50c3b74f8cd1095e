use crate::buffers::Buffers;
use crate::error::JobError;
use crate::stats::Stats;

/// Non-terminal outcomes of one [`Job::iter`] call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    /// The operation finished; further iterations are a no-op.
    Done,
    /// The job needs more input bytes or more output room before it can make
    /// progress. Top up the buffers and call [`Job::iter`] again.
    Blocked,
}

/// A reentrant streaming operation.
///
/// Jobs make bounded progress per call and suspend exactly when the current
/// state needs at least one more input byte (and `eof_in` is not set), when
/// there is no room for the next output byte, or, for patching, when the
/// basis read back fewer bytes than asked. Dropping a job at any suspension
/// point is safe; it owns all of its intermediate state.
pub trait Job {
    /// Runs the state machine against the caller's buffers.
    ///
    /// # Errors
    ///
    /// Terminal [`JobError`]s; see the error type for the taxonomy.
    fn iter(&mut self, buffers: &mut Buffers<'_, '_>) -> Result<Status, JobError>;

    /// Statistics accumulated so far; preserved when the job errors.
    fn stats(&self) -> &Stats;
}

/// Input coalescing buffer.
///
/// States that parse fixed-width records ask for their minimum width; the
/// scan buffer copies bytes out of the caller's input until it can hand the
/// state a contiguous, complete record. Records are small (at most a command
/// header or a signature record), so the copy is cheap.
#[derive(Debug, Default)]
pub(crate) struct ScanBuffer {
    buf: Vec<u8>,
}

impl ScanBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Pulls input until at least `need` bytes are buffered; returns whether
    /// the target was reached.
    pub(crate) fn fill(&mut self, need: usize, buffers: &mut Buffers<'_, '_>) -> bool {
        if self.buf.len() < need {
            let take = (need - self.buf.len()).min(buffers.remaining_input().len());
            self.buf.extend_from_slice(&buffers.remaining_input()[..take]);
            buffers.consume(take);
        }
        self.buf.len() >= need
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Discards `n` parsed bytes from the front.
    pub(crate) fn consume(&mut self, n: usize) {
        self.buf.drain(..n);
    }
}

/// Output bytes staged by a state but not yet accepted by the caller.
///
/// Bounded: jobs stage at most one command header plus one literal run, so
/// the queue never grows past the literal flush threshold plus a header.
#[derive(Debug, Default)]
pub(crate) struct OutQueue {
    buf: Vec<u8>,
    head: usize,
}

impl OutQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Direct access for encoders that append header bytes.
    pub(crate) fn buf_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }

    pub(crate) fn push_slice(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head == self.buf.len()
    }

    /// Moves queued bytes into the caller's output; returns whether the
    /// queue drained completely.
    pub(crate) fn flush(&mut self, buffers: &mut Buffers<'_, '_>) -> bool {
        if !self.is_empty() {
            let n = buffers.push_output(&self.buf[self.head..]);
            self.head += n;
        }
        if self.is_empty() {
            self.buf.clear();
            self.head = 0;
            return true;
        }
        false
    }
}

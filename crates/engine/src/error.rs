use protocol::CommandError;
use signature::SignatureError;
use thiserror::Error;

/// Terminal failures of a streaming job.
///
/// `Blocked` is deliberately not here: needing more buffer is a scheduling
/// signal carried by [`Status`](crate::Status), not a failure. Statistics
/// accumulated before the error remain readable on the job.
#[derive(Debug, Error)]
pub enum JobError {
    /// A pump callback failed while filling or draining buffers.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// End of input was declared while the current state still needs bytes.
    #[error("unexpected end of input stream")]
    InputEnded,

    /// The stream does not open with a magic this library understands.
    #[error("bad magic {found:#010x} at start of stream")]
    BadMagic {
        /// The four bytes actually found, read in network order.
        found: u32,
    },

    /// The stream carries an impossible value: a reserved opcode, a
    /// zero-length operand, a truncated record, or a copy past the basis.
    #[error("corrupt stream: {0}")]
    Corrupt(String),

    /// The caller passed an invalid value to the library.
    #[error("invalid parameter: {0}")]
    Param(String),

    /// An internal invariant failed; this indicates a library bug.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl From<CommandError> for JobError {
    fn from(err: CommandError) -> Self {
        Self::Corrupt(err.to_string())
    }
}

impl From<SignatureError> for JobError {
    fn from(err: SignatureError) -> Self {
        Self::Param(err.to_string())
    }
}

use std::fmt;

/// Performance counters accumulated by a job.
///
/// Counters are preserved when a job fails, so diagnostics can report how
/// far it got. [`Display`](fmt::Display) renders the compact one-line
/// summary; [`Stats::log`] emits it at Info level.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    /// Human-readable name of the operation, e.g. `"delta"`.
    pub op: &'static str,
    /// Number of literal commands emitted or executed.
    pub lit_cmds: u64,
    /// Number of literal payload bytes.
    pub lit_bytes: u64,
    /// Bytes spent on literal command headers.
    pub lit_cmdbytes: u64,
    /// Number of copy commands emitted or executed.
    pub copy_cmds: u64,
    /// Number of bytes covered by copy commands.
    pub copy_bytes: u64,
    /// Bytes spent on copy command headers.
    pub copy_cmdbytes: u64,
    /// Number of blocks described by the signature.
    pub sig_blocks: u64,
    /// Block length of the operation, where one applies.
    pub block_len: u32,
    /// Weak-sum hits whose strong sum failed to confirm.
    pub false_matches: u64,
    /// Total bytes consumed from the input stream.
    pub in_bytes: u64,
    /// Total bytes written to the output stream.
    pub out_bytes: u64,
}

impl Stats {
    pub(crate) fn new(op: &'static str) -> Self {
        Self {
            op,
            ..Self::default()
        }
    }

    /// Writes the summary line to the trace sink at Info level.
    pub fn log(&self) {
        logging::log_info!("{self}");
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} statistics:", self.op)?;
        if self.sig_blocks > 0 || self.block_len > 0 {
            write!(
                f,
                " signature[{} blocks, {} byte blocks]",
                self.sig_blocks, self.block_len
            )?;
        }
        if self.lit_cmds > 0 {
            write!(
                f,
                " literal[{} cmds, {} bytes, {} cmdbytes]",
                self.lit_cmds, self.lit_bytes, self.lit_cmdbytes
            )?;
        }
        if self.copy_cmds > 0 {
            write!(
                f,
                " copy[{} cmds, {} bytes, {} cmdbytes, {} false]",
                self.copy_cmds, self.copy_bytes, self.copy_cmdbytes, self.false_matches
            )?;
        }
        write!(f, " in[{} bytes] out[{} bytes]", self.in_bytes, self.out_bytes)
    }
}

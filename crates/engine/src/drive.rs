use std::io::{self, Read, Write};

use crate::buffers::Buffers;
use crate::error::JobError;
use crate::job::{Job, Status};

/// Buffer sizes for the [`drive`] pump.
#[derive(Clone, Copy, Debug)]
pub struct DriveOptions {
    /// Bytes read from the source per refill.
    pub in_buf_len: usize,
    /// Output buffer capacity handed to the job per iteration.
    pub out_buf_len: usize,
}

impl DriveOptions {
    /// Default pump size for both directions.
    pub const DEFAULT_BUF_LEN: usize = 64 * 1024;
}

impl Default for DriveOptions {
    fn default() -> Self {
        Self {
            in_buf_len: Self::DEFAULT_BUF_LEN,
            out_buf_len: Self::DEFAULT_BUF_LEN,
        }
    }
}

/// Runs `job` to completion, filling its input from `input` and draining
/// its output to `output`.
///
/// The job's emitted bytes are identical whatever buffer sizes are used;
/// the options only trade syscalls against memory.
///
/// # Errors
///
/// Whatever the job reports, plus [`JobError::Io`] from the reader or
/// writer, plus [`JobError::InputEnded`] if the source reaches EOF while the
/// job can make no further progress, and [`JobError::Param`] for zero-sized
/// buffers.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
pub fn drive<J, R, W>(
    job: &mut J,
    input: &mut R,
    output: &mut W,
    options: &DriveOptions,
) -> Result<(), JobError>
where
    J: Job + ?Sized,
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    if options.in_buf_len == 0 || options.out_buf_len == 0 {
        return Err(JobError::Param("drive buffer sizes must be non-zero".into()));
    }

    let mut in_buf = vec![0u8; options.in_buf_len];
    let mut out_buf = vec![0u8; options.out_buf_len];
    let mut in_start = 0usize;
    let mut in_end = 0usize;
    let mut eof = false;

    loop {
        if in_start == in_end && !eof {
            in_start = 0;
            in_end = read_uninterrupted(input, &mut in_buf)?;
            if in_end == 0 {
                eof = true;
            }
        }

        let (status, consumed, produced) = {
            let mut buffers = Buffers::new(&in_buf[in_start..in_end], eof, &mut out_buf);
            let status = job.iter(&mut buffers);
            (status, buffers.consumed(), buffers.produced())
        };
        in_start += consumed;

        match status {
            Ok(Status::Done) => {
                output.write_all(&out_buf[..produced])?;
                output.flush()?;
                return Ok(());
            }
            Ok(Status::Blocked) => {
                output.write_all(&out_buf[..produced])?;
                if consumed == 0 && produced == 0 && in_start == in_end {
                    if eof {
                        // The filler is exhausted and the job cannot move.
                        return Err(JobError::InputEnded);
                    }
                    // Otherwise the next loop refills the input buffer.
                } else if consumed == 0 && produced == 0 {
                    // Input and output space were both on offer; a job that
                    // still cannot move will never move.
                    return Err(JobError::Internal("job blocked without progress"));
                }
            }
            Err(err) => return Err(err),
        }
    }
}

fn read_uninterrupted<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
}

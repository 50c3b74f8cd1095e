//! Whole-stream convenience wrappers.
//!
//! Each helper builds the matching job, pumps it to completion with
//! [`drive`] and default buffer sizes, and returns the job's final
//! statistics. Use the jobs directly when you need custom buffer sizes,
//! incremental scheduling, or cancellation.

use std::io::{Read, Write};

use engine::{
    CopySource, DeltaJob, DriveOptions, Job, JobError, LoadSigJob, PatchJob, SigJob, Stats, drive,
};
use protocol::SignatureMagic;
use signature::Signature;

/// Generates the signature of `basis` and writes the signature stream to
/// `sig_out`.
///
/// A `strong_sum_len` of zero selects the strong hash's full width.
///
/// # Errors
///
/// [`JobError::Param`] for invalid parameters, [`JobError::Io`] from either
/// stream.
pub fn signature<R, W>(
    basis: &mut R,
    sig_out: &mut W,
    block_len: u32,
    strong_sum_len: u32,
    magic: SignatureMagic,
) -> Result<Stats, JobError>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut job = SigJob::new(block_len, strong_sum_len, magic)?;
    drive(&mut job, basis, sig_out, &DriveOptions::default())?;
    Ok(job.stats().clone())
}

/// Reads a signature stream into memory.
///
/// The returned signature knows nothing of the basis length (the stream
/// does not carry it) and is not yet indexed; call
/// [`Signature::build_hash_table`] before generating deltas against it.
///
/// # Errors
///
/// [`JobError::BadMagic`], [`JobError::Corrupt`] or [`JobError::InputEnded`]
/// for malformed streams, [`JobError::Io`] from the reader.
pub fn load_signature<R>(sig_in: &mut R) -> Result<(Signature, Stats), JobError>
where
    R: Read + ?Sized,
{
    let mut job = LoadSigJob::new();
    drive(&mut job, sig_in, &mut std::io::sink(), &DriveOptions::default())?;
    let stats = job.stats().clone();
    Ok((job.into_signature()?, stats))
}

/// Computes the delta from the basis described by `sig` to `new`, writing
/// the delta stream to `delta_out`.
///
/// # Errors
///
/// [`JobError::Param`] when `sig` has not been indexed, [`JobError::Io`]
/// from either stream.
pub fn delta<R, W>(sig: &Signature, new: &mut R, delta_out: &mut W) -> Result<Stats, JobError>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut job = DeltaJob::new(sig)?;
    drive(&mut job, new, delta_out, &DriveOptions::default())?;
    Ok(job.stats().clone())
}

/// Applies `delta_in` to the basis served by `basis`, writing the
/// reconstructed stream to `new_out`.
///
/// Wrap a seekable basis file in [`BasisReader`](engine::BasisReader); an
/// in-memory basis slice implements [`CopySource`] directly.
///
/// # Errors
///
/// Structural errors for malformed deltas ([`JobError::BadMagic`],
/// [`JobError::Corrupt`], [`JobError::InputEnded`]), [`JobError::Io`] from
/// the streams or the basis.
pub fn patch<S, R, W>(basis: S, delta_in: &mut R, new_out: &mut W) -> Result<Stats, JobError>
where
    S: CopySource,
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut job = PatchJob::new(basis);
    drive(&mut job, delta_in, new_out, &DriveOptions::default())?;
    Ok(job.stats().clone())
}

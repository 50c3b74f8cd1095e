//! Streaming equivalence: a job's output must not depend on how the caller
//! chunks its buffers, and suspension/resumption must be loss-free at every
//! byte boundary.

use oc_rdiff::{
    Buffers, DeltaJob, DriveOptions, Job, LoadSigJob, PatchJob, SigJob, SignatureMagic, Status,
    drive,
};

fn pseudo_random(len: usize, mut seed: u64) -> Vec<u8> {
    seed |= 1;
    (0..len)
        .map(|_| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed >> 16) as u8
        })
        .collect()
}

/// Drives any job with fixed input/output chunk sizes, collecting output.
fn run_chunked<J: Job>(job: &mut J, input: &[u8], in_chunk: usize, out_chunk: usize) -> Vec<u8> {
    let mut produced = Vec::new();
    let mut offset: usize = 0;
    let mut scratch = vec![0u8; out_chunk];
    loop {
        let end = offset.saturating_add(in_chunk).min(input.len());
        let eof = end == input.len();
        let mut buffers = Buffers::new(&input[offset..end], eof, &mut scratch);
        let status = job.iter(&mut buffers).expect("job must not fail");
        offset += buffers.consumed();
        let produced_len = buffers.produced();
        produced.extend_from_slice(&scratch[..produced_len]);
        if status == Status::Done {
            return produced;
        }
    }
}

#[test]
fn signature_stream_is_chunking_invariant() {
    let basis = pseudo_random(10_000, 3);

    let mut reference_job = SigJob::new(512, 8, SignatureMagic::Blake2).unwrap();
    let reference = run_chunked(&mut reference_job, &basis, usize::MAX, 1 << 16);

    for (in_chunk, out_chunk) in [(1, 1), (2, 5), (13, 64), (4096, 3), (1, 1 << 16)] {
        let mut job = SigJob::new(512, 8, SignatureMagic::Blake2).unwrap();
        assert_eq!(
            run_chunked(&mut job, &basis, in_chunk, out_chunk),
            reference,
            "signature changed with in_chunk={in_chunk} out_chunk={out_chunk}"
        );
    }
}

#[test]
fn delta_and_patch_are_chunking_invariant() {
    let basis = pseudo_random(6_000, 11);
    let mut new = basis.clone();
    new.splice(100..100, pseudo_random(37, 77));
    new.drain(3_000..3_200);

    let mut signature =
        oc_rdiff::Signature::from_buffer(&basis, 128, 0, SignatureMagic::Blake2).unwrap();
    signature.build_hash_table();

    let reference_delta = {
        let mut job = DeltaJob::new(&signature).unwrap();
        run_chunked(&mut job, &new, usize::MAX, 1 << 16)
    };
    let reference_new = {
        let mut job = PatchJob::new(basis.as_slice());
        run_chunked(&mut job, &reference_delta, usize::MAX, 1 << 16)
    };
    assert_eq!(reference_new, new);

    for (in_chunk, out_chunk) in [(1, 1), (3, 7), (251, 16), (1 << 12, 2)] {
        let mut job = DeltaJob::new(&signature).unwrap();
        let delta = run_chunked(&mut job, &new, in_chunk, out_chunk);
        assert_eq!(delta, reference_delta);

        let mut job = PatchJob::new(basis.as_slice());
        let rebuilt = run_chunked(&mut job, &delta, in_chunk, out_chunk);
        assert_eq!(rebuilt, new);
    }
}

#[test]
fn loadsig_accepts_any_input_partitioning() {
    let basis = pseudo_random(5_000, 23);
    let mut sig_stream = Vec::new();
    oc_rdiff::signature(&mut basis.as_slice(), &mut sig_stream, 64, 16, SignatureMagic::Md4)
        .unwrap();

    let reference = {
        let mut job = LoadSigJob::new();
        run_chunked(&mut job, &sig_stream, usize::MAX, 1);
        job.into_signature().unwrap()
    };

    for in_chunk in [1usize, 2, 9, 19, 4096] {
        let mut job = LoadSigJob::new();
        run_chunked(&mut job, &sig_stream, in_chunk, 1);
        let loaded = job.into_signature().unwrap();
        assert_eq!(loaded.blocks(), reference.blocks());
        assert_eq!(loaded.strong_sum_len(), 16);
    }
}

#[test]
fn drive_buffer_sizes_do_not_change_output() {
    let basis = pseudo_random(9_000, 31);
    let mut new = basis.clone();
    new.rotate_right(123);

    let mut signature =
        oc_rdiff::Signature::from_buffer(&basis, 256, 0, SignatureMagic::Blake2).unwrap();
    signature.build_hash_table();

    let mut reference = Vec::new();
    let mut job = DeltaJob::new(&signature).unwrap();
    drive(&mut job, &mut new.as_slice(), &mut reference, &DriveOptions::default()).unwrap();

    for buf_len in [1usize, 5, 127, 8192] {
        let options = DriveOptions {
            in_buf_len: buf_len,
            out_buf_len: buf_len,
        };
        let mut delta = Vec::new();
        let mut job = DeltaJob::new(&signature).unwrap();
        drive(&mut job, &mut new.as_slice(), &mut delta, &options).unwrap();
        assert_eq!(delta, reference, "drive output changed with buf_len={buf_len}");
    }
}

#[test]
fn stats_survive_a_failed_patch() {
    // LITERAL(3) "ab" then truncation: the two literal bytes are already
    // accounted for when the job dies.
    let delta = [0x72, 0x73, 0x02, 0x36, 0x03, b'a', b'b'];
    let mut job = PatchJob::new(&b""[..]);
    let mut scratch = [0u8; 16];
    let mut buffers = Buffers::new(&delta, true, &mut scratch);
    let err = job.iter(&mut buffers).unwrap_err();
    assert!(matches!(err, oc_rdiff::JobError::InputEnded));
    assert_eq!(job.stats().lit_cmds, 1);
    assert_eq!(job.stats().lit_bytes, 2);
    assert_eq!(job.stats().in_bytes, delta.len() as u64);
}

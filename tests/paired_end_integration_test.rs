// rapi/tests/paired_end_integration_test.rs
//
// Integration tests for paired-end alignment:
// - Proper pairs with a manual and an inferred insert size distribution
// - Mate rescue
// - Unmapped and half-mapped pairs
// - SAM mate fields

mod common;

use common::{TableAligner, hit, init_logging, reference, seq_for};
use rapi::core::value::Param;
use rapi::paired::insert_size::FR;
use rapi::{AlignerSession, InsertSizeOverride, RapiOpts, ReadBatch, format_sam};

fn fields(line: &str) -> Vec<String> {
    line.split('\t').map(str::to_string).collect()
}

fn sam_pair(r: &rapi::ReferenceIndex, batch: &ReadBatch, fragment: usize) -> [Vec<String>; 2] {
    let pair = batch.fragment(fragment).unwrap();
    let mut l0 = String::new();
    let mut l1 = String::new();
    format_sam(r, &pair[0], Some(&pair[1]), &mut l0).unwrap();
    format_sam(r, &pair[1], Some(&pair[0]), &mut l1).unwrap();
    [fields(&l0), fields(&l1)]
}

fn fr_override() -> RapiOpts {
    let mut opts = RapiOpts::default();
    opts.aligner.insert_size_override = Some(InsertSizeOverride {
        mean: 300.0,
        stddev: 30.0,
        max: 500,
        min: 100,
    });
    opts
}

#[test]
fn test_proper_pair_300bp_apart() {
    init_logging();
    let r = reference();
    let s1 = seq_for(b'C', 1, 50);
    let s2 = seq_for(b'G', 1, 50);
    let aligner = TableAligner::new()
        .with_hits(&s1, vec![hit(0, 1000, false, 50, "50M")])
        .with_hits(&s2, vec![hit(0, 1250, true, 50, "50M")]);
    let mut session = AlignerSession::new(aligner);

    let mut batch = ReadBatch::new(2, 1).unwrap();
    batch.set_read(0, 0, "frag/1", &s1, None, 33).unwrap();
    batch.set_read(0, 1, "frag/2", &s2, None, 33).unwrap();
    session.align_reads(&r, &mut batch, &fr_override()).unwrap();

    let [f0, f1] = sam_pair(&r, &batch, 0);
    assert_eq!(f0[0], "frag");
    assert_eq!(f0[1], "35"); // paired, proper, mate reverse
    assert_eq!(f1[1], "19"); // paired, proper, reverse
    assert_eq!((f0[2].as_str(), f0[3].as_str()), ("chr1", "1001"));
    assert_eq!((f1[2].as_str(), f1[3].as_str()), ("chr1", "1251"));
    assert_eq!((f0[6].as_str(), f0[7].as_str()), ("=", "1251"));
    assert_eq!((f1[6].as_str(), f1[7].as_str()), ("=", "1001"));
    assert_eq!(f0[8], "300");
    assert_eq!(f1[8], "-300");
    assert_eq!(f0[4], "60");

    let stats = session.state().insert_stats.as_ref().unwrap();
    assert!(!stats[FR].failed);
    assert_eq!((stats[FR].low, stats[FR].high), (100, 500));
}

#[test]
fn test_both_mates_unmapped() {
    let r = reference();
    let mut session = AlignerSession::new(TableAligner::new());
    let mut batch = ReadBatch::new(2, 1).unwrap();
    batch.set_read(0, 0, "lost/1", b"ACGTACGTAC", None, 33).unwrap();
    batch.set_read(0, 1, "lost/2", b"TTGGCCAATT", None, 33).unwrap();
    session.align_reads(&r, &mut batch, &fr_override()).unwrap();

    for f in sam_pair(&r, &batch, 0) {
        assert_eq!(f[1], "13");
        assert_eq!(&f[2..9], ["*", "0", "0", "*", "*", "0", "0"]);
    }
}

#[test]
fn test_half_mapped_pair_backfill() {
    let r = reference();
    let s1 = seq_for(b'C', 2, 40);
    let aligner = TableAligner::new().with_hits(&s1, vec![hit(1, 700, false, 40, "40M")]);
    let mut session = AlignerSession::new(aligner);
    let mut opts = fr_override();
    opts.push_param(Param::new("skip_mate_rescue", 1i64));

    let mut batch = ReadBatch::new(2, 1).unwrap();
    batch.set_read(0, 0, "half/1", &s1, None, 33).unwrap();
    batch.set_read(0, 1, "half/2", b"ACACACACAC", None, 33).unwrap();
    session.align_reads(&r, &mut batch, &opts).unwrap();

    let [f0, f1] = sam_pair(&r, &batch, 0);
    assert_eq!(f0[1], "9"); // paired, mate unmapped
    assert_eq!(f1[1], "5"); // paired, unmapped
    assert_eq!((f1[2].as_str(), f1[3].as_str()), ("chr2", "701"));
    assert_eq!(f1[5], "*");
    assert_eq!((f0[6].as_str(), f0[7].as_str(), f0[8].as_str()), ("=", "701", "0"));

    // Display only: the stored alignment stays unmapped
    assert!(batch.read(0, 1).unwrap().alignments[0].contig.is_none());
}

#[test]
fn test_mate_rescue_recovers_pair() {
    init_logging();
    let r = reference();
    let s1 = seq_for(b'C', 3, 50);
    let s2 = seq_for(b'G', 3, 50);
    let aligner = TableAligner::new()
        .with_hits(&s1, vec![hit(0, 20_000, false, 50, "50M")])
        .with_rescue(&s2, hit(0, 20_240, true, 45, "2S48M"));
    let mut session = AlignerSession::new(aligner);

    let mut batch = ReadBatch::new(2, 1).unwrap();
    batch.set_read(0, 0, "resc/1", &s1, None, 33).unwrap();
    batch.set_read(0, 1, "resc/2", &s2, None, 33).unwrap();
    session.align_reads(&r, &mut batch, &fr_override()).unwrap();

    assert_eq!(session.service().rescue_calls(), 1);
    let mate = batch.read(0, 1).unwrap().primary().unwrap();
    assert!(mate.is_mapped() && mate.flags.reverse_strand);
    assert!(mate.flags.properly_paired);
    assert_eq!(mate.pos, 20_241);
    assert!(batch.read(0, 0).unwrap().primary().unwrap().flags.properly_paired);
}

#[test]
fn test_rescue_disabled() {
    let r = reference();
    let s1 = seq_for(b'C', 4, 50);
    let s2 = seq_for(b'G', 4, 50);
    let aligner = TableAligner::new()
        .with_hits(&s1, vec![hit(0, 20_000, false, 50, "50M")])
        .with_rescue(&s2, hit(0, 20_240, true, 45, "2S48M"));
    let mut session = AlignerSession::new(aligner);
    let mut opts = fr_override();
    opts.push_param(Param::new("skip_mate_rescue", 1i64));

    let mut batch = ReadBatch::new(2, 1).unwrap();
    batch.set_read(0, 0, "nr/1", &s1, None, 33).unwrap();
    batch.set_read(0, 1, "nr/2", &s2, None, 33).unwrap();
    session.align_reads(&r, &mut batch, &opts).unwrap();

    assert_eq!(session.service().rescue_calls(), 0);
    assert!(!batch.read(0, 1).unwrap().primary().unwrap().is_mapped());
}

#[test]
fn test_inferred_insert_size_distribution() {
    init_logging();
    let r = reference();
    let n = 40;
    let mut aligner = TableAligner::new();
    let mut batch = ReadBatch::new(2, n).unwrap();
    for i in 0..n {
        let s1 = seq_for(b'C', i, 50);
        let s2 = seq_for(b'G', i, 50);
        let start = 10_000 * i as u64;
        let insert = 280 + (i as u64 % 5) * 10;
        aligner = aligner
            .with_hits(&s1, vec![hit(0, start, false, 50, "50M")])
            .with_hits(&s2, vec![hit(0, start + insert - 50, true, 50, "50M")]);
        batch.set_read(i, 0, &format!("p{i}/1"), &s1, None, 33).unwrap();
        batch.set_read(i, 1, &format!("p{i}/2"), &s2, None, 33).unwrap();
    }
    let mut session = AlignerSession::new(aligner);
    session.align_reads(&r, &mut batch, &RapiOpts::default()).unwrap();

    let stats = session.state().insert_stats.clone().unwrap();
    assert!(!stats[FR].failed);
    assert!((stats[FR].avg - 299.0).abs() < 1e-9);
    assert!(stats[0].failed && stats[2].failed && stats[3].failed);

    for f in 0..n {
        let [f0, f1] = sam_pair(&r, &batch, f);
        assert_eq!(f0[1], "35");
        assert_eq!(f1[1], "19");
        let t0: i64 = f0[8].parse().unwrap();
        let t1: i64 = f1[8].parse().unwrap();
        assert_eq!(t0, -t1);
        assert!(t0 > 0);
    }
    assert_eq!(session.state().n_reads_processed, 2 * n as u64);
}

#[test]
fn test_pair_on_different_contigs_not_proper() {
    let r = reference();
    let s1 = seq_for(b'C', 5, 50);
    let s2 = seq_for(b'G', 5, 50);
    let aligner = TableAligner::new()
        .with_hits(&s1, vec![hit(0, 1000, false, 50, "50M")])
        .with_hits(&s2, vec![hit(1, 1250, true, 50, "50M")]);
    let mut session = AlignerSession::new(aligner);

    let mut batch = ReadBatch::new(2, 1).unwrap();
    batch.set_read(0, 0, "x/1", &s1, None, 33).unwrap();
    batch.set_read(0, 1, "x/2", &s2, None, 33).unwrap();
    session.align_reads(&r, &mut batch, &fr_override()).unwrap();

    let [f0, f1] = sam_pair(&r, &batch, 0);
    assert_eq!(f0[1], "33"); // paired, mate reverse
    assert_eq!(f1[1], "17"); // paired, reverse
    assert_eq!((f0[6].as_str(), f0[8].as_str()), ("chr2", "0"));
    assert_eq!(f1[6], "chr1");
}

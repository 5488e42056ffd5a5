// Shared fixtures for the integration tests: a table-driven search service
// and helpers to build references and reads.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use rapi::core::cigar::parse_cigar;
use rapi::{Candidate, Contig, ContigId, ReferenceIndex, RescueWindow, SearchService};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn reference() -> ReferenceIndex {
    ReferenceIndex::new(
        "test/ref.fa",
        vec![Contig::new("chr1", 1_000_000), Contig::new("chr2", 500_000)],
    )
    .unwrap()
}

pub fn hit(contig: usize, pos: u64, reverse: bool, score: i32, cigar: &str) -> Candidate {
    Candidate::new(ContigId(contig), pos, reverse, score, parse_cigar(cigar).unwrap())
}

/// Deterministic, distinct sequence for read `i` of length `len`; `lead`
/// keeps mates apart.
pub fn seq_for(lead: u8, i: usize, len: usize) -> Vec<u8> {
    let mut seq = vec![lead];
    let mut x = i;
    while seq.len() < len {
        seq.push(b"ACGT"[x % 4]);
        x /= 4;
    }
    seq
}

/// Search answers looked up by exact sequence; rescue answers looked up by
/// mate sequence and returned only when they fall inside the window.
#[derive(Default)]
pub struct TableAligner {
    hits: HashMap<Vec<u8>, Vec<Candidate>>,
    rescues: HashMap<Vec<u8>, Candidate>,
    pub rescue_calls: AtomicUsize,
}

impl TableAligner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hits(mut self, seq: &[u8], hits: Vec<Candidate>) -> Self {
        self.hits.insert(seq.to_vec(), hits);
        self
    }

    pub fn with_rescue(mut self, mate_seq: &[u8], c: Candidate) -> Self {
        self.rescues.insert(mate_seq.to_vec(), c);
        self
    }

    pub fn rescue_calls(&self) -> usize {
        self.rescue_calls.load(Ordering::Relaxed)
    }
}

impl SearchService for TableAligner {
    fn name(&self) -> &str {
        "table-aligner"
    }

    fn version(&self) -> &str {
        "0.1"
    }

    fn search(&self, _reference: &ReferenceIndex, sequence: &[u8]) -> anyhow::Result<Vec<Candidate>> {
        if sequence.contains(&b'X') {
            anyhow::bail!("unsearchable sequence");
        }
        Ok(self.hits.get(sequence).cloned().unwrap_or_default())
    }

    fn mate_rescue(
        &self,
        _reference: &ReferenceIndex,
        _anchor: &Candidate,
        mate_sequence: &[u8],
        window: &RescueWindow,
    ) -> anyhow::Result<Vec<Candidate>> {
        self.rescue_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .rescues
            .get(mate_sequence)
            .filter(|c| {
                c.contig == window.contig
                    && c.reverse == window.mate_reverse
                    && c.pos >= window.start
                    && c.ref_last() < window.end
            })
            .cloned()
            .into_iter()
            .collect())
    }
}

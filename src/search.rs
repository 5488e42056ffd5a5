//! The seam between the core and an aligner's search engine.
//!
//! A [`SearchService`] turns a sequence into scored [`Candidate`] regions.
//! Everything after that (primary marking, pairing, mapping quality and
//! record encoding) is done by this crate, with default implementations of
//! the hooks an aligner may want to replace.

use crate::core::cigar::{self, CigarKind, CigarOp};
use crate::core::reference::{ContigId, ReferenceIndex};
use crate::finalization::mark_primary_se;
use crate::mem_opt::MemOpt;
use crate::paired::insert_size::{self, InsertSizeStats};

/// One scored placement of a read, as produced by the search (BWA's mem_alnreg_t).
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub contig: ContigId,
    /// 0-based leftmost reference position.
    pub pos: u64,
    pub reverse: bool,
    pub score: i32,
    /// Best score among placements overlapping this one on the query.
    pub sub: i32,
    /// Suboptimal score within the same region (tandem repeats).
    pub csub: i32,
    /// Number of near-tied suboptimal placements.
    pub sub_n: i32,
    /// Query interval `[query_begin, query_end)` on the read's own strand.
    pub query_begin: u32,
    pub query_end: u32,
    pub cigar: Vec<CigarOp>,
    pub n_mismatches: u32,
    pub n_gap_opens: u32,
    pub n_gap_extensions: u32,
    /// Index of the primary this candidate shadows, after primary marking.
    pub secondary: Option<usize>,
    pub hash: u64,
}

impl Candidate {
    /// A candidate with no suboptimal information; the query interval is
    /// taken from the CIGAR with clips excluded, on the read's own strand.
    pub fn new(contig: ContigId, pos: u64, reverse: bool, score: i32, cigar: Vec<CigarOp>) -> Self {
        let clip = |op: &&CigarOp| op.kind.is_clip();
        let leading = if reverse {
            cigar.iter().rev().take_while(clip).map(|op| op.len).sum::<u32>()
        } else {
            cigar.iter().take_while(clip).map(|op| op.len).sum::<u32>()
        };
        let aligned = cigar
            .iter()
            .filter(|op| matches!(op.kind, CigarKind::Match | CigarKind::Ins))
            .map(|op| op.len)
            .sum::<u32>();
        Self {
            contig,
            pos,
            reverse,
            score,
            sub: 0,
            csub: 0,
            sub_n: 0,
            query_begin: leading,
            query_end: leading + aligned,
            cigar,
            n_mismatches: 0,
            n_gap_opens: 0,
            n_gap_extensions: 0,
            secondary: None,
            hash: 0,
        }
    }

    /// Reference bases covered; the query span when there is no CIGAR.
    pub fn ref_len(&self) -> u64 {
        if self.cigar.is_empty() {
            (self.query_end - self.query_begin) as u64
        } else {
            cigar::reference_length(&self.cigar)
        }
    }

    /// 0-based rightmost reference base.
    pub fn ref_last(&self) -> u64 {
        (self.pos + self.ref_len()).saturating_sub(1)
    }

    pub fn query_len(&self) -> u32 {
        self.query_end - self.query_begin
    }

    pub fn is_secondary(&self) -> bool {
        self.secondary.is_some()
    }
}

/// Reference interval in which to look for a missing mate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescueWindow {
    /// Pair orientation (0=FF, 1=FR, 2=RF, 3=RR) the window was derived for.
    pub orientation: usize,
    pub contig: ContigId,
    /// 0-based half-open `[start, end)`.
    pub start: u64,
    pub end: u64,
    /// Strand the mate is expected on.
    pub mate_reverse: bool,
}

/// External alignment search.
///
/// Implementations must be shareable across the session's worker threads.
pub trait SearchService: Sync {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    /// Scored candidate placements of `sequence` (upper-case bases).
    fn search(
        &self,
        reference: &ReferenceIndex,
        sequence: &[u8],
    ) -> anyhow::Result<Vec<Candidate>>;

    /// Flag secondaries within one read's candidates, sorting them best first.
    fn mark_primary(&self, opt: &MemOpt, candidates: &mut [Candidate], id: u64) {
        mark_primary_se(opt, candidates, id);
    }

    /// Local re-alignment of `mate_sequence` inside `window`.
    fn mate_rescue(
        &self,
        _reference: &ReferenceIndex,
        _anchor: &Candidate,
        _mate_sequence: &[u8],
        _window: &RescueWindow,
    ) -> anyhow::Result<Vec<Candidate>> {
        Ok(Vec::new())
    }

    /// Insert size distribution for FF, FR, RF and RR from a batch of pairs
    /// whose candidates are sorted best first.
    fn infer_insert_stats(&self, opt: &MemOpt, pairs: &[[&[Candidate]; 2]]) -> [InsertSizeStats; 4] {
        insert_size::infer_insert_stats(opt, pairs)
    }
}

/// Sort best first and drop duplicate placements (same contig, strand,
/// position and span), keeping the higher scoring copy.
pub fn sort_dedup_candidates(candidates: &mut Vec<Candidate>) {
    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.contig.cmp(&b.contig))
            .then(a.pos.cmp(&b.pos))
            .then(a.reverse.cmp(&b.reverse))
            .then(a.query_begin.cmp(&b.query_begin))
    });
    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for c in candidates.drain(..) {
        let dup = kept.iter().any(|k| {
            k.contig == c.contig
                && k.reverse == c.reverse
                && k.pos == c.pos
                && k.ref_len() == c.ref_len()
        });
        if !dup {
            kept.push(c);
        }
    }
    *candidates = kept;
}

// Mate rescue module
//
// This module drives mate rescue for a read pair:
// - Anchor selection (near-best candidates of each read)
// - Region calculation based on insert size distribution (uses full [low, high] range)
// - Local re-alignment through SearchService::mate_rescue
// - Score-ordered insertion of rescued candidates
//
// Mirrors BWA-MEM's mem_matesw() with contig-local coordinates in place of
// the bidirectional [0, 2*l_pac) space.

use crate::core::reference::ReferenceIndex;
use crate::mem_opt::MemOpt;
use crate::paired::insert_size::{InsertSizeStats, infer_orientation};
use crate::search::{Candidate, RescueWindow, SearchService, sort_dedup_candidates};

/// Orientations still worth a rescue attempt for `anchor`: usable statistics
/// and no existing mate candidate at a consistent distance.
fn rescue_orientations(
    stats: &[InsertSizeStats; 4],
    anchor: &Candidate,
    mate_cands: &[Candidate],
) -> [bool; 4] {
    let mut skip = [false; 4];
    for (r, s) in stats.iter().enumerate() {
        skip[r] = s.failed;
    }
    for m in mate_cands.iter().filter(|m| m.contig == anchor.contig) {
        let (dir, dist) = infer_orientation(anchor, m);
        if dist >= stats[dir].low as i64 && dist <= stats[dir].high as i64 {
            skip[dir] = true;
        }
    }
    skip.map(|s| !s)
}

/// Reference window in which the mate of `anchor` would sit for orientation `r`.
///
/// Returns `None` when the anchor's contig is unknown or the clamped window
/// is empty.
pub fn rescue_window(
    reference: &ReferenceIndex,
    stats: &InsertSizeStats,
    r: usize,
    anchor: &Candidate,
    mate_len: usize,
) -> Option<RescueWindow> {
    let contig_len = reference.contig(anchor.contig)?.len as i64;
    let l_ms = mate_len as i64;
    let (low, high) = (stats.low as i64, stats.high as i64);

    // whether the mate is on the opposite strand / at a larger coordinate
    let is_rev = (r >> 1) != (r & 1);
    let is_larger = r >> 1 == 0;

    // offsets relative to the anchor, along the anchor's strand
    let (rb_off, re_off) = match (is_rev, is_larger) {
        (false, true) => (low, high + l_ms),
        (false, false) => (-high, -low + l_ms),
        (true, true) => (low - l_ms, high),
        (true, false) => (-high - l_ms, -low),
    };

    let (start, end) = if anchor.reverse {
        let anchor_end = anchor.ref_last() as i64 + 1;
        (anchor_end - re_off, anchor_end - rb_off)
    } else {
        let anchor_start = anchor.pos as i64;
        (anchor_start + rb_off, anchor_start + re_off)
    };
    let start = start.max(0);
    let end = end.min(contig_len);
    if start >= end {
        return None;
    }

    Some(RescueWindow {
        orientation: r,
        contig: anchor.contig,
        start: start as u64,
        end: end as u64,
        mate_reverse: anchor.reverse != is_rev,
    })
}

/// Insert `c` keeping `list` sorted by descending score.
fn insert_by_score(list: &mut Vec<Candidate>, c: Candidate) {
    let at = list
        .iter()
        .position(|x| x.score < c.score)
        .unwrap_or(list.len());
    list.insert(at, c);
}

/// Try to rescue the mate of one anchor (C++ mem_matesw equivalent).
///
/// Rescued candidates scoring at least `min_seed_len * a` are added to
/// `mate_cands`. Returns the number of re-alignments performed.
pub fn mem_matesw<S: SearchService + ?Sized>(
    service: &S,
    reference: &ReferenceIndex,
    opt: &MemOpt,
    stats: &[InsertSizeStats; 4],
    anchor: &Candidate,
    mate_seq: &[u8],
    mate_cands: &mut Vec<Candidate>,
) -> anyhow::Result<usize> {
    let todo = rescue_orientations(stats, anchor, mate_cands);
    if !todo.iter().any(|&t| t) {
        return Ok(0);
    }

    let min_score = opt.min_seed_len * opt.a;
    let mut n = 0;
    for r in (0..4).filter(|&r| todo[r]) {
        let Some(window) = rescue_window(reference, &stats[r], r, anchor, mate_seq.len()) else {
            continue;
        };
        if ((window.end - window.start) as i64) < opt.min_seed_len as i64 {
            continue;
        }
        let found = service.mate_rescue(reference, anchor, mate_seq, &window)?;
        for c in found.into_iter().filter(|c| c.score >= min_score) {
            log::trace!(
                "mate_rescue: {} window {}:{}-{} -> pos={} score={}",
                crate::paired::insert_size::ORIENTATION_NAMES[r],
                window.contig.0,
                window.start,
                window.end,
                c.pos,
                c.score
            );
            insert_by_score(mate_cands, c);
            n += 1;
        }
    }
    Ok(n)
}

/// Rescue both directions of a read pair.
///
/// Anchors are each read's candidates within `pen_unpaired` of its best,
/// at most `max_matesw` of them, taken before any rescue. Both lists are
/// re-sorted and deduplicated afterwards.
pub fn rescue_pair<S: SearchService + ?Sized>(
    service: &S,
    reference: &ReferenceIndex,
    opt: &MemOpt,
    stats: &[InsertSizeStats; 4],
    seqs: [&[u8]; 2],
    cands: &mut [Vec<Candidate>; 2],
) -> anyhow::Result<usize> {
    let max_anchors = opt.max_matesw.max(0) as usize;
    let anchors: [Vec<Candidate>; 2] = std::array::from_fn(|i| match cands[i].first() {
        Some(best) => {
            let threshold = best.score - opt.pen_unpaired;
            cands[i]
                .iter()
                .filter(|c| c.score >= threshold)
                .take(max_anchors)
                .cloned()
                .collect()
        }
        None => Vec::new(),
    });

    let mut n = 0;
    for (i, list) in anchors.iter().enumerate() {
        let mate = i ^ 1;
        for anchor in list {
            n += mem_matesw(service, reference, opt, stats, anchor, seqs[mate], &mut cands[mate])?;
        }
    }
    if n > 0 {
        sort_dedup_candidates(&mut cands[0]);
        sort_dedup_candidates(&mut cands[1]);
    }
    Ok(n)
}

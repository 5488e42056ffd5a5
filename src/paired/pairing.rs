// Paired-end alignment scoring module
//
// This module handles paired-end alignment scoring based on insert size distribution:
// - Position-based sorting and mate finding
// - Normal distribution scoring
// - Best pair selection with tie-breaking

use crate::finalization::near_tie_gap;
use crate::mem_opt::MemOpt;
use crate::paired::insert_size::{InsertSizeStats, erfc};
use crate::search::Candidate;
use crate::utils::hash_64;

/// Best pairing of two reads' candidates (C++ mem_pair result)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairHit {
    /// Index of the chosen candidate in each read's list.
    pub z: [usize; 2],
    pub score: i32,
    /// Second best pair score, 0 when there is none.
    pub sub: i32,
    /// Number of other pairs scoring within the near-tie gap of `sub`.
    pub n_sub: i32,
}

// Sorted hit entry (equivalent to C++ pair64_t v array)
#[derive(Debug, Clone, Copy)]
struct HitKey {
    contig: usize,
    fwd_pos: u64, // leftmost base if forward, rightmost if reverse
    score: i32,
    index: usize,
    reverse: bool,
    read: usize,
}

impl HitKey {
    /// Read/strand class: (strand << 1) | read.
    fn class(&self) -> usize {
        (self.reverse as usize) << 1 | self.read
    }
}

// Scored pair (equivalent to C++ u array)
#[derive(Debug, Clone, Copy)]
struct PairScore {
    score: i32,
    hash: u32,
    i: usize, // later hit in v
    k: usize, // earlier hit in v
}

/// Pair score contribution of an insert of `dist` under `stats`:
/// .721 * ln(2 * erfc(|ns| / sqrt 2)) * a, with .721 = 1/ln 4.
fn insert_log_prob(stats: &InsertSizeStats, dist: i64, a: i32) -> f64 {
    let ns = if stats.std > 0.0 {
        (dist as f64 - stats.avg) / stats.std
    } else {
        0.0
    };
    0.721 * (2.0 * erfc(ns.abs() / std::f64::consts::SQRT_2)).ln() * a as f64
}

/// Both reads' candidates ordered by (contig, pos), ties by score, index,
/// strand and read.
fn sorted_hits(cands: [&[Candidate]; 2]) -> Vec<HitKey> {
    let mut v: Vec<HitKey> = Vec::with_capacity(cands[0].len() + cands[1].len());
    for (read, list) in cands.iter().enumerate() {
        for (index, c) in list.iter().enumerate() {
            v.push(HitKey {
                contig: c.contig.0,
                fwd_pos: if c.reverse { c.ref_last() } else { c.pos },
                score: c.score,
                index,
                reverse: c.reverse,
                read,
            });
        }
    }
    v.sort_by_key(|h| (h.contig, h.fwd_pos, h.score, h.index, h.reverse, h.read));
    v
}

/// Score paired-end candidates based on the insert size distribution (C++ mem_pair equivalent)
pub fn mem_pair(
    opt: &MemOpt,
    stats: &[InsertSizeStats; 4],
    cands: [&[Candidate]; 2],
    pair_id: u64,
) -> Option<PairHit> {
    if cands[0].is_empty() || cands[1].is_empty() {
        return None;
    }

    let v = sorted_hits(cands);

    // Last hit seen for each read/strand class
    let mut y: [Option<usize>; 4] = [None; 4];
    let mut u: Vec<PairScore> = Vec::new();

    for i in 0..v.len() {
        for r in 0..2usize {
            let dir = r << 1 | v[i].reverse as usize;
            if stats[dir].failed {
                continue;
            }
            let which = r << 1 | (v[i].read ^ 1);
            let Some(last) = y[which] else {
                continue;
            };
            for k in (0..=last).rev() {
                if v[k].class() != which {
                    continue;
                }
                if v[k].contig != v[i].contig {
                    break;
                }
                let dist = (v[i].fwd_pos - v[k].fwd_pos) as i64;
                if dist > stats[dir].high as i64 {
                    break;
                }
                if dist < stats[dir].low as i64 {
                    continue;
                }
                let log_prob = insert_log_prob(&stats[dir], dist, opt.a);
                let q = (((v[i].score + v[k].score) as f64 + log_prob + 0.499) as i32).max(0);
                let hash = (hash_64(((k as u64) << 32 | i as u64) ^ (pair_id << 8)) & 0xffff_ffff) as u32;
                log::trace!(
                    "mem_pair: id={} dir={} dist={} q={} (i={}, k={})",
                    pair_id,
                    dir,
                    dist,
                    q,
                    i,
                    k
                );
                u.push(PairScore { score: q, hash, i, k });
            }
        }
        y[v[i].class()] = Some(i);
    }

    if u.is_empty() {
        return None;
    }

    // Ascending by (score, hash): best pair last
    u.sort_by_key(|p| (p.score, p.hash));
    let (best, rest) = u.split_last()?;
    let sub = rest.last().map_or(0, |p| p.score);
    let tmp = near_tie_gap(opt);
    let n_sub = rest.iter().filter(|p| sub - p.score <= tmp).count() as i32;

    let mut z = [0usize; 2];
    for h in [v[best.i], v[best.k]] {
        z[h.read] = h.index;
    }

    Some(PairHit {
        z,
        score: best.score,
        sub,
        n_sub,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cigar::parse_cigar;
    use crate::core::reference::ContigId;
    use crate::paired::insert_size::FR;

    fn cand(contig: usize, pos: u64, reverse: bool, score: i32) -> Candidate {
        Candidate::new(ContigId(contig), pos, reverse, score, parse_cigar("50M").unwrap())
    }

    fn fr_stats() -> [InsertSizeStats; 4] {
        let mut s: [InsertSizeStats; 4] = Default::default();
        s[FR] = InsertSizeStats {
            avg: 300.0,
            std: 30.0,
            low: 100,
            high: 500,
            failed: false,
        };
        s
    }

    #[test]
    fn test_no_candidates() {
        let opt = MemOpt::default();
        let one = [cand(0, 100, false, 50)];
        assert_eq!(mem_pair(&opt, &fr_stats(), [&one, &[]], 0), None);
    }

    #[test]
    fn test_single_proper_pair() {
        let opt = MemOpt::default();
        let r1 = [cand(0, 1000, false, 50)];
        // reverse mate's rightmost base at 1299: distance 299
        let r2 = [cand(0, 1250, true, 50)];
        let hit = mem_pair(&opt, &fr_stats(), [&r1, &r2], 7).unwrap();
        assert_eq!(hit.z, [0, 0]);
        // ns ~ 0: log term ~ 0
        assert_eq!(hit.score, 100);
        assert_eq!(hit.sub, 0);
        assert_eq!(hit.n_sub, 0);
    }

    #[test]
    fn test_insert_penalty_applied() {
        let opt = MemOpt::default();
        let r1 = [cand(0, 1000, false, 50)];
        // distance 449, 5 std.dev. from the mean: log term -9.74
        let r2 = [cand(0, 1400, true, 50)];
        let hit = mem_pair(&opt, &fr_stats(), [&r1, &r2], 0).unwrap();
        assert_eq!(hit.score, 90);
    }

    #[test]
    fn test_failed_orientation_and_range() {
        let opt = MemOpt::default();
        let r1 = [cand(0, 1000, false, 50)];
        // FF is failed
        let ff = [cand(0, 1250, false, 50)];
        assert_eq!(mem_pair(&opt, &fr_stats(), [&r1, &ff], 0), None);
        // Too far apart
        let far = [cand(0, 5000, true, 50)];
        assert_eq!(mem_pair(&opt, &fr_stats(), [&r1, &far], 0), None);
        // Different contig
        let other = [cand(1, 1250, true, 50)];
        assert_eq!(mem_pair(&opt, &fr_stats(), [&r1, &other], 0), None);
    }

    #[test]
    fn test_mate_listed_first_in_position() {
        let opt = MemOpt::default();
        // read 2 forward, read 1 reverse downstream
        let r1 = [cand(0, 9000, false, 60), cand(0, 2250, true, 50)];
        let r2 = [cand(0, 2000, false, 50)];
        let hit = mem_pair(&opt, &fr_stats(), [&r1, &r2], 0).unwrap();
        assert_eq!(hit.z, [1, 0]);
    }

    #[test]
    fn test_picks_best_and_counts_near_ties() {
        let opt = MemOpt::default();
        let r1 = [cand(0, 1000, false, 60), cand(0, 50_000, false, 58)];
        let r2 = [cand(0, 1250, true, 60), cand(0, 50_250, true, 58)];
        let hit = mem_pair(&opt, &fr_stats(), [&r1, &r2], 3).unwrap();
        assert_eq!(hit.z, [0, 0]);
        assert_eq!(hit.score, 120);
        assert_eq!(hit.sub, 116);
        assert_eq!(hit.n_sub, 1);
    }

    #[test]
    fn test_tied_positions_order_by_score() {
        // read 2 reverse ends at 1049, level with read 1's second hit
        let r1 = [
            cand(0, 2000, false, 30),
            cand(0, 1049, false, 55),
            cand(0, 1049, false, 40),
        ];
        let r2 = [cand(0, 1000, true, 45)];
        let order: Vec<(usize, usize)> = sorted_hits([&r1, &r2])
            .iter()
            .map(|h| (h.read, h.index))
            .collect();
        assert_eq!(order, vec![(0, 2), (1, 0), (0, 1), (0, 0)]);
    }
}

// Paired-end decision engine
//
// Turns the candidate sets of one read pair into the reported alignments of
// both mates (BWA-MEM's mem_sam_pe):
// 1. mate rescue around near-best anchors
// 2. primary marking of each mate
// 3. pair scoring against the insert size distribution
// 4. paired vs. unpaired decision and mapping quality

use crate::core::alignment::Alignment;
use crate::core::read::Read;
use crate::core::reference::ReferenceIndex;
use crate::defaults::MAPQ_PAIR_BONUS;
use crate::error::Result;
use crate::finalization::mapq::{clamp_mapq, sub_n_penalty};
use crate::finalization::{approx_mapq_se, candidate_to_alignment, finalize_single_end, raw_mapq};
use crate::mem_opt::MemOpt;
use crate::paired::insert_size::{InsertSizeStats, infer_orientation};
use crate::paired::mate_rescue::rescue_pair;
use crate::paired::pairing::{PairHit, mem_pair};
use crate::search::{Candidate, SearchService};
use crate::utils::err_fatal;

/// Per-batch pairing context shared read-only by all worker tasks.
pub struct PairingEngine<'a, S: SearchService + ?Sized> {
    service: &'a S,
    reference: &'a ReferenceIndex,
    opt: &'a MemOpt,
    stats: &'a [InsertSizeStats; 4],
}

impl<'a, S: SearchService + ?Sized> PairingEngine<'a, S> {
    pub fn new(
        service: &'a S,
        reference: &'a ReferenceIndex,
        opt: &'a MemOpt,
        stats: &'a [InsertSizeStats; 4],
    ) -> Self {
        Self {
            service,
            reference,
            opt,
            stats,
        }
    }

    /// Alignments of both mates of pair `id`.
    ///
    /// `cands` are the raw search results of each mate, sorted best first.
    pub fn pair_end(
        &self,
        id: u64,
        reads: [&Read; 2],
        mut cands: [Vec<Candidate>; 2],
    ) -> Result<[Vec<Alignment>; 2]> {
        if reads[0].id != reads[1].id {
            err_fatal(
                "pair_end",
                &format!("paired reads have different names: \"{}\", \"{}\"", reads[0].id, reads[1].id),
            );
        }
        let opt = self.opt;

        if !opt.no_rescue {
            let seqs = [reads[0].seq.as_bytes(), reads[1].seq.as_bytes()];
            let n = rescue_pair(self.service, self.reference, opt, self.stats, seqs, &mut cands)?;
            if n > 0 {
                log::debug!("[PE] pair {} ({}): {} mate rescue alignments", id, reads[0].id, n);
            }
        }
        for (i, list) in cands.iter_mut().enumerate() {
            self.service.mark_primary(opt, list, id * 2 + i as u64);
        }

        if !opt.no_pairing {
            if let Some(hit) = mem_pair(opt, self.stats, [&cands[0][..], &cands[1][..]], id) {
                if hit.score > 0 && !self.is_multi(&cands) {
                    return self.report_pair(id, &mut cands, hit);
                }
            }
        }
        self.report_unpaired(id, &cands)
    }

    /// Either mate still has another reportable primary hit.
    fn is_multi(&self, cands: &[Vec<Candidate>; 2]) -> bool {
        cands.iter().any(|list| {
            list.iter()
                .skip(1)
                .any(|c| !c.is_secondary() && c.score >= self.opt.t)
        })
    }

    fn report_pair(
        &self,
        id: u64,
        cands: &mut [Vec<Candidate>; 2],
        hit: PairHit,
    ) -> Result<[Vec<Alignment>; 2]> {
        let opt = self.opt;
        let score_un = cands[0][0].score + cands[1][0].score - opt.pen_unpaired;
        let subo = hit.sub.max(score_un);
        let q_pe = clamp_mapq(raw_mapq(hit.score - subo, opt.a) - sub_n_penalty(hit.n_sub));

        let (z, q, proper) = if hit.score > score_un {
            let mut q = [0i32; 2];
            for i in 0..2 {
                let list = &mut cands[i];
                let zi = hit.z[i];
                if let Some(p) = list[zi].secondary {
                    list[zi].sub = list[p].score;
                    list[zi].secondary = None;
                }
                let c = &list[zi];
                let q_se = approx_mapq_se(opt, c);
                q[i] = if q_se > q_pe {
                    q_se
                } else {
                    q_pe.min(q_se + MAPQ_PAIR_BONUS)
                };
                q[i] = q[i].min(raw_mapq(c.score - c.csub, opt.a));
            }
            (hit.z, q, true)
        } else {
            let q = [approx_mapq_se(opt, &cands[0][0]), approx_mapq_se(opt, &cands[1][0])];
            ([0, 0], q, false)
        };
        log::debug!(
            "[PE] pair {}: paired score {} (sub {}, unpaired {}), proper={} mapq=({}, {})",
            id,
            hit.score,
            hit.sub,
            score_un,
            proper,
            q[0],
            q[1]
        );

        let mut out: [Vec<Alignment>; 2] = Default::default();
        for i in 0..2 {
            let c = &cands[i][z[i]];
            let mut aln = candidate_to_alignment(self.reference, c, clamp_mapq(q[i]), Some(c.sub.max(c.csub)))?;
            aln.flags.paired = true;
            aln.flags.properly_paired = proper;
            out[i].push(aln);
        }
        Ok(out)
    }

    fn report_unpaired(&self, id: u64, cands: &[Vec<Candidate>; 2]) -> Result<[Vec<Alignment>; 2]> {
        let proper = !self.opt.no_pairing && self.best_hits_proper(cands);
        log::debug!("[PE] pair {}: reported unpaired, proper={}", id, proper);

        let mut out: [Vec<Alignment>; 2] = Default::default();
        for (i, list) in cands.iter().enumerate() {
            let mut alns = finalize_single_end(self.opt, self.reference, list)?;
            for aln in alns.iter_mut() {
                aln.flags.paired = true;
                aln.flags.properly_paired = proper;
            }
            out[i] = alns;
        }
        Ok(out)
    }

    /// The top hits of both mates are reportable, share a contig and sit at a
    /// distance consistent with a usable orientation.
    fn best_hits_proper(&self, cands: &[Vec<Candidate>; 2]) -> bool {
        let (Some(b0), Some(b1)) = (cands[0].first(), cands[1].first()) else {
            return false;
        };
        if b0.score < self.opt.t || b1.score < self.opt.t || b0.contig != b1.contig {
            return false;
        }
        let (dir, dist) = infer_orientation(b0, b1);
        self.stats[dir].accepts(dist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cigar::parse_cigar;
    use crate::core::reference::{Contig, ContigId};
    use crate::paired::insert_size::FR;

    struct NoRescue;

    impl SearchService for NoRescue {
        fn name(&self) -> &str {
            "none"
        }

        fn version(&self) -> &str {
            "0"
        }

        fn search(&self, _: &ReferenceIndex, _: &[u8]) -> anyhow::Result<Vec<Candidate>> {
            Ok(Vec::new())
        }
    }

    fn cand(contig: usize, pos: u64, reverse: bool, score: i32) -> Candidate {
        Candidate::new(ContigId(contig), pos, reverse, score, parse_cigar("50M").unwrap())
    }

    fn reference() -> ReferenceIndex {
        ReferenceIndex::new(
            "ref.fa",
            vec![Contig::new("chr1", 100_000), Contig::new("chr2", 100_000)],
        )
        .unwrap()
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

    fn reads() -> [Read; 2] {
        let seq = [b'A'; 50];
        [
            Read::new("frag/1", &seq, None, 33).unwrap(),
            Read::new("frag/2", &seq, None, 33).unwrap(),
        ]
    }

    #[test]
    fn test_proper_pair_wins() {
        let (r, opt, stats) = (reference(), MemOpt::default(), fr_stats());
        let engine = PairingEngine::new(&NoRescue, &r, &opt, &stats);
        let [r1, r2] = reads();
        let out = engine
            .pair_end(0, [&r1, &r2], [vec![cand(0, 1000, false, 50)], vec![cand(0, 1250, true, 50)]])
            .unwrap();
        for alns in &out {
            assert_eq!(alns.len(), 1);
            assert!(alns[0].flags.paired && alns[0].flags.properly_paired);
            assert_eq!(alns[0].mapq, 60);
        }
        assert_eq!(out[0][0].pos, 1001);
        assert!(out[1][0].flags.reverse_strand);
    }

    #[test]
    fn test_pair_resolves_repeat() {
        let (r, opt, stats) = (reference(), MemOpt::default(), fr_stats());
        let engine = PairingEngine::new(&NoRescue, &r, &opt, &stats);
        let [r1, r2] = reads();
        // read 2 has an equally good hit elsewhere; pairing picks the one near read 1
        let out = engine
            .pair_end(
                0,
                [&r1, &r2],
                [
                    vec![cand(0, 1000, false, 50)],
                    vec![cand(1, 70_000, true, 50), cand(0, 1250, true, 50)],
                ],
            )
            .unwrap();
        assert_eq!(out[1][0].contig, Some(ContigId(0)));
        assert_eq!(out[1][0].pos, 1251);
        assert!(out[1][0].flags.properly_paired);
        assert_eq!(out[1][0].tag("XS").unwrap().value().get_int().unwrap(), 50);
        // the promoted mate keeps a low single-end quality
        assert!(out[1][0].mapq < 60);
    }

    #[test]
    fn test_second_primary_forces_unpaired_but_proper() {
        let (r, opt, stats) = (reference(), MemOpt::default(), fr_stats());
        let engine = PairingEngine::new(&NoRescue, &r, &opt, &stats);
        let [r1, r2] = reads();
        // read 1 maps in two pieces that do not overlap on the read
        let mut head = cand(0, 1000, false, 50);
        head.query_end = 25;
        let mut tail = cand(1, 40_000, false, 45);
        tail.query_begin = 25;
        let out = engine
            .pair_end(2, [&r1, &r2], [vec![head, tail], vec![cand(0, 1250, true, 50)]])
            .unwrap();

        assert_eq!(out[0].len(), 2);
        assert_eq!(out[0][0].contig, Some(ContigId(0)));
        assert!(!out[0][0].flags.secondary);
        assert!(out[0][1].flags.secondary);
        assert_eq!(out[0][1].contig, Some(ContigId(1)));
        assert_eq!(out[1].len(), 1);
        // best hits are still consistent with the insert size distribution
        for alns in &out {
            assert!(alns[0].flags.paired && alns[0].flags.properly_paired);
        }
    }

    #[test]
    fn test_unpaired_fallback_different_contigs() {
        let (r, opt, stats) = (reference(), MemOpt::default(), fr_stats());
        let engine = PairingEngine::new(&NoRescue, &r, &opt, &stats);
        let [r1, r2] = reads();
        let out = engine
            .pair_end(5, [&r1, &r2], [vec![cand(0, 1000, false, 50)], vec![cand(1, 1250, true, 50)]])
            .unwrap();
        for alns in &out {
            assert!(alns[0].is_mapped());
            assert!(alns[0].flags.paired);
            assert!(!alns[0].flags.properly_paired);
        }
    }

    #[test]
    fn test_both_unmapped() {
        let (r, opt, stats) = (reference(), MemOpt::default(), fr_stats());
        let engine = PairingEngine::new(&NoRescue, &r, &opt, &stats);
        let [r1, r2] = reads();
        let out = engine.pair_end(1, [&r1, &r2], [Vec::new(), Vec::new()]).unwrap();
        for alns in &out {
            assert_eq!(alns.len(), 1);
            assert!(!alns[0].is_mapped());
            assert!(alns[0].flags.paired);
        }
    }

    #[test]
    fn test_no_pairing_flag() {
        let r = reference();
        let opt = MemOpt {
            no_pairing: true,
            ..MemOpt::default()
        };
        let stats = fr_stats();
        let engine = PairingEngine::new(&NoRescue, &r, &opt, &stats);
        let [r1, r2] = reads();
        let out = engine
            .pair_end(0, [&r1, &r2], [vec![cand(0, 1000, false, 50)], vec![cand(0, 1250, true, 50)]])
            .unwrap();
        assert!(!out[0][0].flags.properly_paired);
        assert!(out[0][0].flags.paired);
    }

    #[test]
    fn test_failed_stats_fallback_not_proper() {
        let r = reference();
        let opt = MemOpt::default();
        let stats: [InsertSizeStats; 4] = Default::default();
        let engine = PairingEngine::new(&NoRescue, &r, &opt, &stats);
        let [r1, r2] = reads();
        let out = engine
            .pair_end(0, [&r1, &r2], [vec![cand(0, 1000, false, 50)], vec![cand(0, 1250, true, 50)]])
            .unwrap();
        assert!(out.iter().all(|a| a[0].is_mapped() && !a[0].flags.properly_paired));
    }

    #[test]
    #[should_panic(expected = "different names")]
    fn test_mismatched_mates_fatal() {
        let (r, opt, stats) = (reference(), MemOpt::default(), fr_stats());
        let engine = PairingEngine::new(&NoRescue, &r, &opt, &stats);
        let seq = [b'A'; 10];
        let r1 = Read::new("a/1", &seq, None, 33).unwrap();
        let r2 = Read::new("b/2", &seq, None, 33).unwrap();
        let _ = engine.pair_end(0, [&r1, &r2], [Vec::new(), Vec::new()]);
    }
}

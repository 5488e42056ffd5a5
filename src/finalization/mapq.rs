// Mapping quality (BWA-MEM mem_approx_mapq_se and the pairing adjustments)

use crate::defaults::MAX_MAPQ;
use crate::mem_opt::MemOpt;
use crate::search::Candidate;
use crate::utils::round_bwa;

/// Phred-scaled quality of a score gap: round(6.02 * diff / a).
#[inline]
pub fn raw_mapq(diff: i32, a: i32) -> i32 {
    round_bwa(6.02 * diff as f64 / a as f64)
}

/// Penalty for `n` near-tied alternatives: round(4.343 * ln(n + 1)).
#[inline]
pub(crate) fn sub_n_penalty(n: i32) -> i32 {
    if n > 0 {
        round_bwa(4.343 * ((n + 1) as f64).ln())
    } else {
        0
    }
}

#[inline]
pub(crate) fn clamp_mapq(q: i32) -> i32 {
    q.clamp(0, MAX_MAPQ)
}

/// Single-end mapping quality of one candidate.
pub fn approx_mapq_se(opt: &MemOpt, c: &Candidate) -> i32 {
    let mut sub = if c.sub != 0 {
        c.sub
    } else {
        opt.min_seed_len * opt.a
    };
    sub = sub.max(c.csub);
    if sub >= c.score || c.score == 0 {
        return 0;
    }

    let l = (c.query_len() as i64).max(c.ref_len() as i64).max(1);
    let identity = 1.0
        - (l * opt.a as i64 - c.score as i64) as f64 / (opt.a + opt.b) as f64 / l as f64;

    let mut tmp = if opt.mapq_coef_len > 0.0 && (l as f64) >= opt.mapq_coef_len as f64 {
        opt.mapq_coef_fac as f64 / (l as f64).ln()
    } else {
        1.0
    };
    tmp *= identity * identity;

    let mut mapq = round_bwa(6.02 * (c.score - sub) as f64 / opt.a as f64 * tmp * tmp);
    mapq -= sub_n_penalty(c.sub_n);
    clamp_mapq(mapq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cigar::parse_cigar;
    use crate::core::reference::ContigId;

    fn cand(score: i32, len: u32) -> Candidate {
        Candidate::new(
            ContigId(0),
            0,
            false,
            score,
            parse_cigar(&format!("{len}M")).unwrap(),
        )
    }

    #[test]
    fn test_raw_mapq() {
        assert_eq!(raw_mapq(0, 1), 0);
        assert_eq!(raw_mapq(10, 1), 60);
        assert_eq!(raw_mapq(17, 1), 102);
        assert_eq!(raw_mapq(10, 2), 30);
        assert!(raw_mapq(-5, 1) <= 0);
    }

    #[test]
    fn test_sub_n_penalty() {
        assert_eq!(sub_n_penalty(0), 0);
        // 4.343 * ln 2 = 3.01
        assert_eq!(sub_n_penalty(1), 3);
        // 4.343 * ln 4 = 6.02
        assert_eq!(sub_n_penalty(3), 6);
    }

    #[test]
    fn test_unique_perfect_hit_gets_max() {
        let opt = MemOpt::default();
        let c = cand(100, 100);
        assert_eq!(approx_mapq_se(&opt, &c), 60);
    }

    #[test]
    fn test_short_perfect_hit() {
        let opt = MemOpt::default();
        // l = 8 < 50, identity 1, sub = 19 > score
        assert_eq!(approx_mapq_se(&opt, &cand(8, 8)), 0);
        // l = 30, sub = 19: 6.02 * 11 = 66.2 -> 60
        assert_eq!(approx_mapq_se(&opt, &cand(30, 30)), 60);
    }

    #[test]
    fn test_close_suboptimal_lowers_mapq() {
        let opt = MemOpt::default();
        let mut c = cand(100, 100);
        c.sub = 98;
        // l = 100: tmp = 3 / ln 100 = 0.651; 6.02 * 2 * 0.424 = 5.1
        assert_eq!(approx_mapq_se(&opt, &c), 5);
        c.sub_n = 1;
        assert_eq!(approx_mapq_se(&opt, &c), 2);
        c.sub = 100;
        assert_eq!(approx_mapq_se(&opt, &c), 0);
    }

    #[test]
    fn test_csub_raises_sub() {
        let opt = MemOpt::default();
        let mut c = cand(100, 100);
        c.csub = 99;
        assert_eq!(approx_mapq_se(&opt, &c), 3);
    }
}

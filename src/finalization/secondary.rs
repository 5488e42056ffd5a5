use crate::mem_opt::MemOpt;
use crate::search::Candidate;
use crate::utils::hash_64;

/// Largest score gap still counted as a near tie:
/// max(a + b, o_del + e_del, o_ins + e_ins).
pub fn near_tie_gap(opt: &MemOpt) -> i32 {
    (opt.a + opt.b)
        .max(opt.o_del + opt.e_del)
        .max(opt.o_ins + opt.e_ins)
}

/// True when the two candidates overlap on the query by at least
/// `mask_level` of the shorter one.
fn significant_overlap(a: &Candidate, b: &Candidate, mask_level: f32) -> bool {
    let b_max = a.query_begin.max(b.query_begin);
    let e_min = a.query_end.min(b.query_end);
    if e_min <= b_max {
        return false;
    }
    let min_l = a.query_len().min(b.query_len());
    (e_min - b_max) as f64 >= min_l as f64 * mask_level as f64
}

/// Mark secondary candidates of one read (BWA mem_mark_primary_se).
///
/// Candidates are sorted by score, ties broken by `hash_64(id + i)`. Each
/// candidate overlapping an earlier primary significantly becomes that
/// primary's secondary; the primary records the first such score as `sub`
/// and counts near ties in `sub_n`.
pub fn mark_primary_se(opt: &MemOpt, a: &mut [Candidate], id: u64) {
    if a.is_empty() {
        return;
    }
    for (i, c) in a.iter_mut().enumerate() {
        c.sub = 0;
        c.sub_n = 0;
        c.secondary = None;
        c.hash = hash_64(id.wrapping_add(i as u64));
    }
    a.sort_by(|x, y| y.score.cmp(&x.score).then(x.hash.cmp(&y.hash)));

    let tmp = near_tie_gap(opt);
    let mut primaries: Vec<usize> = vec![0];
    for i in 1..a.len() {
        let shadowing = primaries
            .iter()
            .copied()
            .find(|&j| significant_overlap(&a[j], &a[i], opt.mask_level));
        match shadowing {
            Some(j) => {
                let score = a[i].score;
                if a[j].sub == 0 {
                    a[j].sub = score;
                }
                if a[j].score - score <= tmp {
                    a[j].sub_n += 1;
                }
                a[i].secondary = Some(j);
            }
            None => primaries.push(i),
        }
    }
    log::trace!(
        "mark_primary_se: id={} n={} primaries={}",
        id,
        a.len(),
        primaries.len()
    );
}

/// Score of the best candidate overlapping the top one, or
/// `min_seed_len * a` when there is none (BWA cal_sub).
pub fn cal_sub(opt: &MemOpt, a: &[Candidate]) -> i32 {
    a.iter()
        .skip(1)
        .find(|c| significant_overlap(c, &a[0], opt.mask_level))
        .map_or(opt.min_seed_len * opt.a, |c| c.score)
}

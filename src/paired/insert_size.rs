// Insert size statistics module
//
// This module handles paired-end insert size distribution analysis:
// - Orientation detection (FF, FR, RF, RR) in contig-local coordinates
// - Statistical analysis (mean, std, outlier removal)
// - Proper pair bounds calculation
// - Manual override of the FR distribution

use crate::defaults::{
    MAPPING_BOUND, MAX_STDDEV, MIN_DIR_RATIO, MIN_PAIR_SAMPLES, OUTLIER_BOUND, UNIQUE_HIT_RATIO,
};
use crate::finalization::cal_sub;
use crate::mem_opt::{InsertSizeOverride, MemOpt};
use crate::search::Candidate;
use crate::utils::round_bwa;

pub const ORIENTATION_NAMES: [&str; 4] = ["FF", "FR", "RF", "RR"];

/// Orientation index of a forward read followed by a reverse mate.
pub const FR: usize = 1;

// Insert size statistics for one orientation
#[derive(Debug, Clone, PartialEq)]
pub struct InsertSizeStats {
    pub avg: f64,     // Mean insert size
    pub std: f64,     // Standard deviation
    pub low: i32,     // Lower bound for proper pairs
    pub high: i32,    // Upper bound for proper pairs
    pub failed: bool, // Orientation unusable (too few samples)
}

impl Default for InsertSizeStats {
    fn default() -> Self {
        Self {
            avg: 0.0,
            std: 0.0,
            low: 0,
            high: 0,
            failed: true,
        }
    }
}

impl InsertSizeStats {
    /// True when `dist` is inside the proper-pair bounds of a usable orientation.
    pub fn accepts(&self, dist: i64) -> bool {
        !self.failed && dist >= self.low as i64 && dist <= self.high as i64
    }
}

/// All four orientations failed.
pub fn failed_stats() -> [InsertSizeStats; 4] {
    Default::default()
}

/// Infer orientation of a candidate pair (BWA mem_infer_dir).
///
/// Returns (orientation, distance), orientation 0=FF, 1=FR, 2=RF, 3=RR.
/// Reverse-strand placements are measured from their rightmost base. Both
/// candidates are assumed to lie on the same contig.
pub fn infer_orientation(c1: &Candidate, c2: &Candidate) -> (usize, i64) {
    let (l1, r1) = (c1.pos as i64, c1.ref_last() as i64);
    let (l2, r2) = (c2.pos as i64, c2.ref_last() as i64);
    match (c1.reverse, c2.reverse) {
        (false, false) => (if l2 > l1 { 0 } else { 3 }, (l2 - l1).abs()),
        (true, true) => (if r2 < r1 { 0 } else { 3 }, (r1 - r2).abs()),
        (false, true) => (if r2 > l1 { 1 } else { 2 }, (r2 - l1).abs()),
        (true, false) => (if l2 < r1 { 1 } else { 2 }, (r1 - l2).abs()),
    }
}

/// Complementary error function (approximation)
pub(crate) fn erfc(x: f64) -> f64 {
    let t = 1.0 / (1.0 + 0.5 * x.abs());
    let tau = t
        * (-x * x - 1.26551223
            + t * (1.00002368
                + t * (0.37409196
                    + t * (0.09678418
                        + t * (-0.18628806
                            + t * (0.27886807
                                + t * (-1.13520398
                                    + t * (1.48851587 + t * (-0.82215223 + t * 0.17087277)))))))))
            .exp();
    if x >= 0.0 { tau } else { 2.0 - tau }
}

/// Distribution of one orientation from its (unsorted) samples.
fn orientation_stats(name: &str, sizes: &mut [i64]) -> InsertSizeStats {
    sizes.sort_unstable();
    let n = sizes.len();
    let pct = |p: f64| sizes[((p * n as f64 + 0.499) as usize).min(n - 1)];
    let (p25, p50, p75) = (pct(0.25), pct(0.50), pct(0.75));
    let iqr = (p75 - p25) as f64;

    // Outlier bounds for mean/std
    let low = round_bwa(p25 as f64 - OUTLIER_BOUND * iqr).max(1) as i64;
    let high = round_bwa(p75 as f64 + OUTLIER_BOUND * iqr) as i64;
    log::debug!(
        "[PE] ({}) percentiles (25, 50, 75): ({}, {}, {})",
        name,
        p25,
        p50,
        p75
    );
    log::debug!("[PE] ({}) low and high boundaries for computing mean and std.dev: ({}, {})", name, low, high);

    let kept: Vec<f64> = sizes
        .iter()
        .filter(|&&s| s >= low && s <= high)
        .map(|&s| s as f64)
        .collect();
    if kept.is_empty() {
        log::warn!("[PE] ({}) no samples within outlier bounds", name);
        return InsertSizeStats::default();
    }
    let avg = kept.iter().sum::<f64>() / kept.len() as f64;
    let std = (kept.iter().map(|s| (s - avg) * (s - avg)).sum::<f64>() / kept.len() as f64).sqrt();
    log::info!("[PE] ({}) mean and std.dev: ({:.2}, {:.2})", name, avg, std);

    // Proper pair bounds
    let mut low = round_bwa(p25 as f64 - MAPPING_BOUND * iqr);
    let mut high = round_bwa(p75 as f64 + MAPPING_BOUND * iqr);
    low = low.min(round_bwa(avg - MAX_STDDEV * std));
    high = high.max(round_bwa(avg + MAX_STDDEV * std));
    low = low.max(1);
    log::info!("[PE] ({}) low and high boundaries for proper pairs: ({}, {})", name, low, high);

    InsertSizeStats {
        avg,
        std,
        low,
        high,
        failed: false,
    }
}

/// Infer the insert size distribution of a batch (BWA mem_pestat).
///
/// Only pairs whose best hits are unique and on the same contig contribute.
/// Sample distances must lie in `[max(opt.min_ins, 1), opt.max_ins]`.
pub fn infer_insert_stats(opt: &MemOpt, pairs: &[[&[Candidate]; 2]]) -> [InsertSizeStats; 4] {
    let min_dist = opt.min_ins.max(1) as i64;
    let mut insert_sizes: [Vec<i64>; 4] = Default::default();

    for [r0, r1] in pairs {
        let (Some(b0), Some(b1)) = (r0.first(), r1.first()) else {
            continue;
        };
        if cal_sub(opt, r0) as f64 > UNIQUE_HIT_RATIO * b0.score as f64 {
            continue;
        }
        if cal_sub(opt, r1) as f64 > UNIQUE_HIT_RATIO * b1.score as f64 {
            continue;
        }
        if b0.contig != b1.contig {
            continue;
        }
        let (dir, dist) = infer_orientation(b0, b1);
        if dist >= min_dist && dist <= opt.max_ins as i64 {
            insert_sizes[dir].push(dist);
        }
    }

    log::info!(
        "[PE] # candidate unique pairs for (FF, FR, RF, RR): ({}, {}, {}, {})",
        insert_sizes[0].len(),
        insert_sizes[1].len(),
        insert_sizes[2].len(),
        insert_sizes[3].len()
    );

    let mut stats = failed_stats();
    for (d, sizes) in insert_sizes.iter_mut().enumerate() {
        if sizes.len() < MIN_PAIR_SAMPLES {
            log::info!(
                "[PE] skip orientation {} as there are not enough pairs",
                ORIENTATION_NAMES[d]
            );
            continue;
        }
        log::info!(
            "[PE] analyzing insert size distribution for orientation {}...",
            ORIENTATION_NAMES[d]
        );
        stats[d] = orientation_stats(ORIENTATION_NAMES[d], sizes);
    }

    let max_count = insert_sizes.iter().map(Vec::len).max().unwrap_or(0);
    for (d, s) in stats.iter_mut().enumerate() {
        if !s.failed && (insert_sizes[d].len() as f64) < max_count as f64 * MIN_DIR_RATIO {
            s.failed = true;
            log::info!("[PE] skip orientation {}", ORIENTATION_NAMES[d]);
        }
    }

    stats
}

/// Statistics from a manual override: only FR is usable.
pub fn stats_from_override(o: &InsertSizeOverride) -> [InsertSizeStats; 4] {
    let mut stats = failed_stats();
    let low = if o.min > 0 {
        o.min
    } else {
        round_bwa(o.mean - MAX_STDDEV * o.stddev).max(1)
    };
    stats[FR] = InsertSizeStats {
        avg: o.mean,
        std: o.stddev,
        low,
        high: o.max,
        failed: false,
    };
    log::info!(
        "[PE] using manual insert size for FR: mean={:.2} std={:.2} bounds=({}, {})",
        o.mean,
        o.stddev,
        low,
        o.max
    );
    stats
}

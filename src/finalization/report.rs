// Candidate -> Alignment conversion and single-end reporting
//
// Mirrors BWA-MEM's mem_reg2aln / mem_reg2sam_se: pick the candidates worth
// reporting, attach mapping quality and the XS tag, and fall back to a single
// unmapped record when nothing qualifies.

use crate::core::alignment::{Alignment, AlignmentFlags};
use crate::core::reference::ReferenceIndex;
use crate::core::value::Tag;
use crate::error::Result;
use crate::finalization::mapq::approx_mapq_se;
use crate::mem_opt::MemOpt;
use crate::search::Candidate;
use crate::utils::err_fatal;

/// Build a mapped alignment from a candidate.
///
/// `xs` is the suboptimal score to report as `XS:i`, omitted when `None`.
/// Pairing flags are left clear for the caller to set.
pub fn candidate_to_alignment(
    reference: &ReferenceIndex,
    c: &Candidate,
    mapq: i32,
    xs: Option<i32>,
) -> Result<Alignment> {
    if reference.contig(c.contig).is_none() {
        err_fatal(
            "candidate_to_alignment",
            &format!(
                "contig id {} out of range ({} contigs)",
                c.contig.0,
                reference.len()
            ),
        );
    }

    let mut aln = Alignment {
        contig: Some(c.contig),
        pos: c.pos + 1,
        mapq: mapq.clamp(0, u8::MAX as i32) as u8,
        score: c.score,
        flags: AlignmentFlags {
            mapped: true,
            reverse_strand: c.reverse,
            ..AlignmentFlags::default()
        },
        n_mismatches: c.n_mismatches,
        n_gap_opens: c.n_gap_opens,
        n_gap_extensions: c.n_gap_extensions,
        cigar: c.cigar.clone(),
        tags: Vec::new(),
    };
    if let Some(xs) = xs.filter(|&v| v >= 0) {
        aln.push_tag(Tag::new("XS", xs)?);
    }
    Ok(aln)
}

/// Alignments to report for one read whose candidates went through primary
/// marking.
///
/// Candidates below `opt.t` are dropped. Secondaries are only kept with
/// `output_all` and when they score at least half of their primary. Every
/// reported alignment after the first is flagged secondary and has its mapq
/// capped by the first one. An empty result becomes one unmapped alignment.
pub fn finalize_single_end(
    opt: &MemOpt,
    reference: &ReferenceIndex,
    candidates: &[Candidate],
) -> Result<Vec<Alignment>> {
    let mut out: Vec<Alignment> = Vec::new();
    for c in candidates {
        if c.score < opt.t {
            continue;
        }
        if let Some(p) = c.secondary {
            if !opt.output_all {
                continue;
            }
            let primary_score = candidates.get(p).map_or(0, |pc| pc.score);
            if (c.score as f64) < primary_score as f64 * 0.5 {
                continue;
            }
        }

        let (mapq, xs) = if c.is_secondary() {
            (0, None)
        } else {
            (approx_mapq_se(opt, c), Some(c.sub.max(c.csub)))
        };
        let mut aln = candidate_to_alignment(reference, c, mapq, xs)?;
        if let Some(first) = out.first() {
            aln.flags.secondary = true;
            aln.mapq = aln.mapq.min(first.mapq);
        } else {
            aln.flags.secondary = c.is_secondary();
        }
        out.push(aln);
    }

    if out.is_empty() {
        out.push(Alignment::unmapped());
    }
    Ok(out)
}

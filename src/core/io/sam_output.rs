// SAM output module
//
// Renders reads (with their first alignment and optional mate) as SAM text.
// Formatting works on display copies of the alignments; stored data is never
// modified.

use std::fmt::Write as _;
use std::io::Write;

use crate::core::alignment::Alignment;
use crate::core::batch::ReadBatch;
use crate::core::cigar::put_cigar;
use crate::core::read::Read;
use crate::core::reference::{ContigId, ReferenceIndex};
use crate::error::{RapiError, Result};
use crate::finalization::sam_flags;
use crate::utils::{err_fatal, push_reverse_complement, push_reversed};

/// Identity of the program that produced a SAM file, for the `@PG` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInfo {
    pub id: String,
    pub name: String,
    pub version: String,
    pub command_line: Option<String>,
}

impl ProgramInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            version: version.into(),
            command_line: None,
        }
    }
}

// ============================================================================
// DISPLAY FIELDS
// ============================================================================

/// The coordinates a record shows, after mate backfill.
#[derive(Debug, Clone, Copy)]
struct Placement<'a> {
    aln: &'a Alignment,
    contig: Option<ContigId>,
    pos: u64,
    reverse: bool,
}

impl<'a> Placement<'a> {
    fn of(aln: &'a Alignment) -> Self {
        if aln.flags.mapped {
            Placement {
                aln,
                contig: aln.contig,
                pos: aln.pos,
                reverse: aln.flags.reverse_strand,
            }
        } else {
            Placement {
                aln,
                contig: None,
                pos: 0,
                reverse: false,
            }
        }
    }

    /// An unmapped end shows the coordinates and strand of its mapped mate.
    fn backfill_from(&mut self, other: &Placement<'_>) {
        if !self.aln.flags.mapped && other.aln.flags.mapped {
            self.contig = other.contig;
            self.pos = other.pos;
            self.reverse = other.reverse;
        }
    }
}

fn contig_name<'r>(reference: &'r ReferenceIndex, id: ContigId) -> &'r str {
    match reference.contig(id) {
        Some(c) => &c.name,
        None => err_fatal(
            "format_sam",
            &format!(
                "contig id {} outside reference of {} contigs",
                id.0,
                reference.len()
            ),
        ),
    }
}

/// Compute SAM FLAG from the read's and mate's stored alignment fields.
pub fn compute_flag(aln: &Alignment, mate: Option<&Alignment>) -> u16 {
    let mut flag = 0;
    if let Some(m) = mate {
        flag |= sam_flags::PAIRED;
        if !m.flags.mapped {
            flag |= sam_flags::MATE_UNMAPPED;
        } else if m.flags.reverse_strand {
            flag |= sam_flags::MATE_REVERSE;
        }
    } else if aln.flags.paired {
        flag |= sam_flags::PAIRED;
    }

    if !aln.flags.mapped {
        flag |= sam_flags::UNMAPPED;
    } else {
        if aln.flags.properly_paired {
            flag |= sam_flags::PROPER_PAIR;
        }
        if aln.flags.reverse_strand {
            flag |= sam_flags::REVERSE;
        }
        if aln.flags.secondary {
            flag |= sam_flags::SECONDARY;
        }
    }
    flag
}

/// Signed insert size between two alignments on the same contig, 0 otherwise.
///
/// Each end is taken at its 5' base: `pos` on the forward strand,
/// `pos + span - 1` on the reverse strand. The result is antisymmetric.
pub fn insert_size(read: &Alignment, mate: &Alignment) -> i64 {
    if !(read.flags.mapped && mate.flags.mapped && read.contig == mate.contig) {
        return 0;
    }
    if read.cigar.is_empty() || mate.cigar.is_empty() {
        err_fatal(
            "insert_size",
            &format!(
                "No cigar ops for mapped reads! read n_cigar: {}; mate n_cigar: {}",
                read.cigar.len(),
                mate.cigar.len()
            ),
        );
    }
    let five_prime = |a: &Alignment| -> i64 {
        let pos = a.pos as i64;
        if a.flags.reverse_strand {
            pos + a.reference_span() as i64 - 1
        } else {
            pos
        }
    };
    let p0 = five_prime(read);
    let p1 = five_prime(mate);
    -(p0 - p1 + (p0 - p1).signum())
}

// ============================================================================
// RECORD FORMATTING
// ============================================================================

/// Append one SAM record (no trailing newline) for `read`'s first alignment.
///
/// `mate` supplies RNEXT/PNEXT/TLEN and marks the record as paired.
pub fn format_sam(
    reference: &ReferenceIndex,
    read: &Read,
    mate: Option<&Read>,
    out: &mut String,
) -> Result<()> {
    let unmapped = Alignment::default();
    let aln = read.primary().unwrap_or(&unmapped);
    let mate_aln = mate.map(|m| m.primary().unwrap_or(&unmapped));

    let mut shown = Placement::of(aln);
    let mut mate_shown = mate_aln.map(Placement::of);
    if let Some(m) = mate_shown.as_mut() {
        let read_view = shown;
        shown.backfill_from(m);
        m.backfill_from(&read_view);
    }

    let flag = compute_flag(aln, mate_aln);
    let record_start = out.len();

    // QNAME FLAG
    out.push_str(&read.id);
    let _ = write!(out, "\t{}\t", flag);

    // RNAME POS MAPQ CIGAR
    match shown.contig {
        Some(id) => {
            out.push_str(contig_name(reference, id));
            let _ = write!(out, "\t{}\t{}\t", shown.pos, aln.mapq);
            let cigar = if aln.flags.mapped { &aln.cigar[..] } else { &[] };
            put_cigar(cigar, false, out);
        }
        None => out.push_str("*\t0\t0\t*"),
    }
    out.push('\t');

    // RNEXT PNEXT TLEN
    match mate_shown.and_then(|m| m.contig.map(|c| (m, c))) {
        Some((m, mate_contig)) => {
            if shown.contig == Some(mate_contig) {
                out.push('=');
            } else {
                out.push_str(contig_name(reference, mate_contig));
            }
            let isize = if aln.flags.mapped && shown.contig == Some(mate_contig) {
                insert_size(aln, m.aln)
            } else {
                0
            };
            let _ = write!(out, "\t{}\t{}", m.pos, isize);
        }
        None => out.push_str("*\t0\t0"),
    }
    out.push('\t');

    // SEQ QUAL
    if aln.flags.secondary {
        out.push_str("*\t*");
    } else if shown.reverse {
        push_reverse_complement(read.seq.as_bytes(), out);
        out.push('\t');
        match &read.qual {
            Some(q) => push_reversed(q.as_bytes(), out),
            None => out.push('*'),
        }
    } else {
        out.push_str(&read.seq);
        out.push('\t');
        out.push_str(read.qual.as_deref().unwrap_or("*"));
    }

    // Optional fields
    if aln.flags.mapped && !aln.cigar.is_empty() {
        let _ = write!(out, "\tNM:i:{}", aln.n_mismatches);
    }
    if aln.score >= 0 {
        let _ = write!(out, "\tAS:i:{}", aln.score);
    }
    for tag in &aln.tags {
        out.push('\t');
        if let Err(e) = tag.format_into(out) {
            out.truncate(record_start);
            return Err(e);
        }
    }
    Ok(())
}

/// Append the SAM header: `@HD`, one `@SQ` per contig, then `@PG`.
pub fn format_sam_header(reference: &ReferenceIndex, program: &ProgramInfo, out: &mut String) {
    out.push_str("@HD\tVN:1.5\tSO:unsorted\n");
    for (_, contig) in reference.iter() {
        let _ = write!(out, "@SQ\tSN:{}\tLN:{}", contig.name, contig.len);
        if let Some(a) = &contig.assembly_identifier {
            let _ = write!(out, "\tAS:{}", a);
        }
        if let Some(m) = &contig.md5 {
            let _ = write!(out, "\tM5:{}", m);
        }
        if let Some(s) = &contig.species {
            let _ = write!(out, "\tSP:{}", s);
        }
        if let Some(u) = &contig.uri {
            let _ = write!(out, "\tUR:{}", u);
        }
        out.push('\n');
    }
    let _ = write!(
        out,
        "@PG\tID:{}\tPN:{}\tVN:{}",
        program.id, program.name, program.version
    );
    if let Some(cl) = &program.command_line {
        let _ = write!(out, "\tCL:{}", cl);
    }
    out.push('\n');
}

/// Write every read of `batch` as SAM records, one per line.
///
/// In paired batches each mate is formatted against the other.
pub fn write_batch_sam<W: Write>(
    writer: &mut W,
    reference: &ReferenceIndex,
    batch: &ReadBatch,
) -> Result<()> {
    if batch.reads_per_fragment() > 2 {
        return Err(RapiError::OpNotSupported(format!(
            "SAM output for {} reads per fragment",
            batch.reads_per_fragment()
        )));
    }

    let mut line = String::with_capacity(512);
    for fragment in batch.fragments() {
        for (i, read) in fragment.iter().enumerate() {
            let mate = match fragment {
                [a, b] => Some(if i == 0 { b } else { a }),
                _ => None,
            };
            line.clear();
            format_sam(reference, read, mate, &mut line)?;
            line.push('\n');
            writer
                .write_all(line.as_bytes())
                .map_err(|e| anyhow::anyhow!("Error writing SAM record: {}", e))?;
        }
    }
    Ok(())
}

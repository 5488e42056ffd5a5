//! Aligner-agnostic alignment record.

use crate::core::cigar::{self, CigarOp};
use crate::core::reference::ContigId;
use crate::core::value::Tag;
use crate::error::{RapiError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignmentFlags {
    pub paired: bool,
    pub properly_paired: bool,
    pub mapped: bool,
    pub reverse_strand: bool,
    pub secondary: bool,
}

/// One placement of one read.
///
/// When `flags.mapped` is false, `contig`, `pos` and `cigar` carry no meaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alignment {
    pub contig: Option<ContigId>,
    /// 1-based leftmost reference position.
    pub pos: u64,
    pub mapq: u8,
    pub score: i32,
    pub flags: AlignmentFlags,
    pub n_mismatches: u32,
    pub n_gap_opens: u32,
    pub n_gap_extensions: u32,
    pub cigar: Vec<CigarOp>,
    pub tags: Vec<Tag>,
}

impl Alignment {
    pub fn unmapped() -> Self {
        Self::default()
    }

    pub fn is_mapped(&self) -> bool {
        self.flags.mapped
    }

    /// Reference bases covered (M + D).
    pub fn reference_span(&self) -> u64 {
        cigar::reference_length(&self.cigar)
    }

    /// 1-based position of the last reference base covered.
    pub fn end_pos(&self) -> u64 {
        (self.pos + self.reference_span()).saturating_sub(1)
    }

    pub fn push_tag(&mut self, tag: Tag) {
        self.tags.push(tag);
    }

    pub fn tag(&self, key: &str) -> Result<&Tag> {
        self.tags
            .iter()
            .find(|t| t.key().as_str() == key)
            .ok_or_else(|| RapiError::TagNotExisting(key.to_string()))
    }
}

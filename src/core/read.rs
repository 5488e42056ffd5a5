//! Sequencing read with its reported alignments.

use std::fmt;

use crate::core::alignment::Alignment;
use crate::error::{RapiError, Result};

/// Sanger quality offset used for every stored quality string.
pub const SANGER_OFFSET: u8 = 33;
/// Highest base quality representable at offset 33 ('~').
pub const MAX_BASE_QUALITY: u8 = 93;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Read {
    pub id: String,
    /// Upper-case bases.
    pub seq: String,
    /// Offset-33 qualities, same length as `seq`.
    pub qual: Option<String>,
    pub alignments: Vec<Alignment>,
}

impl Read {
    /// Build a read from raw input.
    ///
    /// A trailing `/1` or `/2` is removed from ids longer than two characters.
    /// Qualities are re-encoded from `q_offset` to offset 33; a value outside
    /// 0..=93 after decoding is a parameter error.
    pub fn new(id: &str, seq: &[u8], qual: Option<&[u8]>, q_offset: u8) -> Result<Self> {
        if id.is_empty() {
            return Err(RapiError::param("read id must not be empty"));
        }
        if !seq.iter().all(u8::is_ascii_graphic) {
            return Err(RapiError::param(format!(
                "read {id}: sequence contains non-printable characters"
            )));
        }

        let qual = match qual {
            Some(q) => Some(recode_quality(id, seq.len(), q, q_offset)?),
            None => None,
        };

        let mut seq_buf = String::new();
        seq_buf.try_reserve_exact(seq.len())?;
        seq_buf.extend(seq.iter().map(|b| b.to_ascii_uppercase() as char));

        Ok(Self {
            id: strip_mate_suffix(id).to_string(),
            seq: seq_buf,
            qual,
            alignments: Vec::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// The reported (first) alignment, if any.
    pub fn primary(&self) -> Option<&Alignment> {
        self.alignments.first()
    }
}

impl fmt::Display for Read {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "read id: {}", self.id)?;
        writeln!(f, "read length: {}", self.len())?;
        writeln!(f, "read seq: {}", self.seq)?;
        writeln!(f, "read qual: {}", self.qual.as_deref().unwrap_or("(null)"))?;
        writeln!(f, "read n_alignments: {}", self.alignments.len())
    }
}

/// Strip a trailing `/1` or `/2` from ids longer than two characters.
pub fn strip_mate_suffix(id: &str) -> &str {
    if id.len() > 2 {
        if let Some(stem) = id.strip_suffix("/1").or_else(|| id.strip_suffix("/2")) {
            return stem;
        }
    }
    id
}

fn recode_quality(id: &str, seq_len: usize, qual: &[u8], q_offset: u8) -> Result<String> {
    if qual.len() != seq_len {
        return Err(RapiError::param(format!(
            "read {id}: quality length {} does not match sequence length {seq_len}",
            qual.len()
        )));
    }

    let mut out = String::new();
    out.try_reserve_exact(seq_len)?;
    for &q in qual {
        let decoded = q
            .checked_sub(q_offset)
            .filter(|&v| v <= MAX_BASE_QUALITY)
            .ok_or_else(|| {
                RapiError::param(format!(
                    "read {id}: invalid base quality {q} for offset {q_offset}"
                ))
            })?;
        out.push((decoded + SANGER_OFFSET) as char);
    }
    Ok(out)
}

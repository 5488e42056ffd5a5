//! CIGAR operations.
//!
//! The alignment model stores CIGARs as `Vec<CigarOp>`; this module renders
//! them to SAM text, parses them back, and measures how much query and
//! reference each one covers.

use std::fmt::{self, Write};

use crate::error::{RapiError, Result};

/// CIGAR operation lengths are 28-bit in the SAM/BAM data model.
pub const MAX_OP_LEN: u32 = (1 << 28) - 1;

/// CIGAR operation type with zero-cost conversion to/from bytes
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CigarKind {
    Match = b'M',
    Ins = b'I',
    Del = b'D',
    SoftClip = b'S',
    HardClip = b'H',
}

impl CigarKind {
    #[inline(always)]
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'M' => Some(Self::Match),
            b'I' => Some(Self::Ins),
            b'D' => Some(Self::Del),
            b'S' => Some(Self::SoftClip),
            b'H' => Some(Self::HardClip),
            _ => None,
        }
    }

    #[inline(always)]
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    /// Returns true if this operation consumes query bases
    #[inline(always)]
    pub const fn consumes_query(self) -> bool {
        matches!(self, Self::Match | Self::Ins | Self::SoftClip)
    }

    /// Returns true if this operation consumes reference bases
    #[inline(always)]
    pub const fn consumes_ref(self) -> bool {
        matches!(self, Self::Match | Self::Del)
    }

    #[inline(always)]
    pub const fn is_clip(self) -> bool {
        matches!(self, Self::SoftClip | Self::HardClip)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CigarOp {
    pub kind: CigarKind,
    pub len: u32,
}

impl CigarOp {
    pub fn new(kind: CigarKind, len: u32) -> Result<Self> {
        if len > MAX_OP_LEN {
            return Err(RapiError::param(format!(
                "CIGAR operation length {len} does not fit in 28 bits"
            )));
        }
        Ok(Self { kind, len })
    }
}

impl fmt::Display for CigarOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.len, self.kind.to_byte() as char)
    }
}

/// Calculate the reference-consuming length from a CIGAR (M and D).
#[inline]
pub fn reference_length(cigar: &[CigarOp]) -> u64 {
    cigar
        .iter()
        .filter(|op| op.kind.consumes_ref())
        .map(|op| op.len as u64)
        .sum()
}

/// Calculate the query-consuming length from a CIGAR (M, I and S).
#[inline]
pub fn query_length(cigar: &[CigarOp]) -> u64 {
    cigar
        .iter()
        .filter(|op| op.kind.consumes_query())
        .map(|op| op.len as u64)
        .sum()
}

/// Write a CIGAR to `out`, `*` when empty.
///
/// With `force_hard_clip`, soft clips are written as hard clips; the ops
/// themselves are not modified.
pub fn put_cigar(cigar: &[CigarOp], force_hard_clip: bool, out: &mut String) {
    if cigar.is_empty() {
        out.push('*');
        return;
    }
    for op in cigar {
        let kind = if force_hard_clip && op.kind == CigarKind::SoftClip {
            CigarKind::HardClip
        } else {
            op.kind
        };
        // Writing into a String cannot fail
        let _ = write!(out, "{}{}", op.len, kind.to_byte() as char);
    }
}

/// Convert CIGAR to string representation (e.g., "50M2I48M").
pub fn to_string(cigar: &[CigarOp]) -> String {
    let mut s = String::with_capacity(cigar.len() * 4);
    put_cigar(cigar, false, &mut s);
    s
}

/// Parse a SAM CIGAR string. `*` is the empty CIGAR.
pub fn parse_cigar(s: &str) -> Result<Vec<CigarOp>> {
    if s == "*" {
        return Ok(Vec::new());
    }
    if s.is_empty() {
        return Err(RapiError::param("empty CIGAR string"));
    }

    let mut ops = Vec::new();
    let mut len: Option<u32> = None;
    for b in s.bytes() {
        if b.is_ascii_digit() {
            let digit = (b - b'0') as u32;
            len = Some(
                len.unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|l| l.checked_add(digit))
                    .ok_or_else(|| RapiError::param(format!("CIGAR length overflow in {s:?}")))?,
            );
            continue;
        }
        let kind = CigarKind::from_byte(b).ok_or_else(|| {
            RapiError::param(format!("unsupported CIGAR operation '{}' in {s:?}", b as char))
        })?;
        let n = len
            .take()
            .ok_or_else(|| RapiError::param(format!("CIGAR operation without length in {s:?}")))?;
        ops.push(CigarOp::new(kind, n)?);
    }
    if len.is_some() {
        return Err(RapiError::param(format!("trailing length in CIGAR {s:?}")));
    }
    Ok(ops)
}

//! Alignment finalization.
//!
//! - `sam_flags` - SAM flag bit constants
//! - `secondary` - primary/secondary marking of a read's candidates
//! - `mapq` - mapping quality
//! - `report` - turning candidates into reported alignments

pub mod mapq;
mod report;
pub mod sam_flags;
mod secondary;

pub use mapq::{approx_mapq_se, raw_mapq};
pub use report::{candidate_to_alignment, finalize_single_end};
pub use secondary::{cal_sub, mark_primary_se, near_tie_gap};

//! RAPI: an aligner-agnostic read alignment API.
//!
//! Clients fill a [`ReadBatch`], align it through an [`AlignerSession`]
//! wrapping a [`SearchService`], and render the results as SAM text with
//! [`format_sam`].

pub mod core; // Data model: values, tags, reference, reads, alignments, SAM output
pub mod defaults;
pub mod error;
pub mod finalization; // Primary marking, mapping quality, single-end reporting
pub mod mem_opt; // BWA-MEM scoring and pairing options
pub mod opts;
pub mod paired; // Insert size, pair scoring, mate rescue
pub mod search; // Search service seam
pub mod session;
pub mod utils;

pub use crate::core::alignment::{Alignment, AlignmentFlags};
pub use crate::core::batch::ReadBatch;
pub use crate::core::cigar::{CigarKind, CigarOp};
pub use crate::core::io::sam_output::{
    ProgramInfo, format_sam, format_sam_header, insert_size, write_batch_sam,
};
pub use crate::core::read::Read;
pub use crate::core::reference::{Contig, ContigId, ReferenceIndex};
pub use crate::core::value::{Param, Tag, Value, ValueBox, ValueKind};
pub use crate::error::{RapiError, Result};
pub use crate::mem_opt::{InsertSizeOverride, MemOpt};
pub use crate::opts::RapiOpts;
pub use crate::paired::InsertSizeStats;
pub use crate::search::{Candidate, RescueWindow, SearchService};
pub use crate::session::{AlignerSession, AlignerState};

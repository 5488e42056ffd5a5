//! SAM flag bit masks (SAM specification v1.6).
//!
//! Only the bits the RAPI data model can express are defined; read
//! order within a pair (0x40/0x80) is not part of it.

pub const PAIRED: u16 = 0x1;         // Template having multiple segments in sequencing
pub const PROPER_PAIR: u16 = 0x2;    // Each segment properly aligned according to the aligner
pub const UNMAPPED: u16 = 0x4;       // Segment unmapped
pub const MATE_UNMAPPED: u16 = 0x8;  // Next segment in the template unmapped
pub const REVERSE: u16 = 0x10;       // SEQ being reverse complemented
pub const MATE_REVERSE: u16 = 0x20;  // SEQ of the next segment reverse complemented
pub const SECONDARY: u16 = 0x100;    // Secondary alignment

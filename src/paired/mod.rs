//! Paired-end processing.
//!
//! - `insert_size` - insert size distribution and orientation inference
//! - `pairing` - scoring candidate pairs against the distribution
//! - `mate_rescue` - looking for a missing mate near its partner
//! - `engine` - per-pair decision and reporting

pub mod engine;
pub mod insert_size;
pub mod mate_rescue;
pub mod pairing;

pub use engine::PairingEngine;
pub use insert_size::{InsertSizeStats, infer_orientation};
pub use pairing::{PairHit, mem_pair};

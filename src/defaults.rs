// src/defaults.rs

// Name used in unsupported-parameter messages
pub const ALIGNER_NAME: &str = "bwa-mem";

// Scoring Constants
pub const MATCH_SCORE: i32 = 1;
pub const MISMATCH_PENALTY: i32 = 4;
pub const GAP_OPEN_PENALTY: i32 = 6;
pub const GAP_EXTEND_PENALTY: i32 = 1;
pub const CLIPPING_PENALTY: i32 = 5;
pub const UNPAIRED_PENALTY: i32 = 17;

// Algorithmic Constants
pub const MIN_SEED_LEN: i32 = 19;
pub const BAND_WIDTH: i32 = 100;
pub const OFF_DIAGONAL_DROPOFF: i32 = 100;
pub const MASK_LEVEL: f32 = 0.50;
pub const MAX_MATE_RESCUES: i32 = 100;
pub const MIN_SCORE: i32 = 30;
pub const MAPQ_COEF_LEN: i32 = 50;

// Insert size
pub const MAX_INSERT: i32 = 10000;
pub const MIN_PAIR_SAMPLES: usize = 10;
pub const MIN_DIR_RATIO: f64 = 0.05;
pub const UNIQUE_HIT_RATIO: f64 = 0.8;
pub const OUTLIER_BOUND: f64 = 2.0;
pub const MAPPING_BOUND: f64 = 3.0;
pub const MAX_STDDEV: f64 = 4.0;

// Mapping quality
pub const MAX_MAPQ: i32 = 60;
pub const MAPQ_PAIR_BONUS: i32 = 40;

// rapi/src/mem_opt.rs
//
// BWA-MEM scoring and pairing options (the mem_opt_t subset the pairing and
// finalization code consumes), plus the named-parameter surface that lets
// clients tune them through RapiOpts.

use crate::core::value::Param;
use crate::defaults;
use crate::error::{RapiError, Result};

/// Alignment options matching the fields of BWA's mem_opt_t used after search.
#[derive(Debug, Clone)]
pub struct MemOpt {
    // Scoring parameters
    pub a: i32,            // Match score
    pub b: i32,            // Mismatch penalty
    pub o_del: i32,        // Gap open penalty (deletions)
    pub e_del: i32,        // Gap extension penalty (deletions)
    pub o_ins: i32,        // Gap open penalty (insertions)
    pub e_ins: i32,        // Gap extension penalty (insertions)
    pub pen_unpaired: i32, // Phred-scaled penalty for unpaired reads
    pub pen_clip5: i32,    // 5' clipping penalty
    pub pen_clip3: i32,    // 3' clipping penalty

    // Alignment parameters, forwarded to the search service
    pub w: i32,     // Band width for banded alignment
    pub zdrop: i32, // Z-dropoff (off-diagonal X-dropoff)
    pub min_seed_len: i32,

    // Filtering parameters
    pub mask_level: f32, // Regard hit as redundant if overlap with better hit is over mask_level * min length

    // Output parameters
    pub t: i32, // Minimum score threshold to output

    // Paired-end parameters
    pub min_ins: i32,    // Skip pairs with insert < this when estimating the distribution
    pub max_ins: i32,    // Skip pairs with insert > this when estimating the distribution
    pub max_matesw: i32, // Perform at most max_matesw rounds of mate-SW for each end
    pub insert_size_override: Option<InsertSizeOverride>,

    // Mapping quality parameters
    pub mapq_coef_len: f32,
    pub mapq_coef_fac: i32, // (int)log(mapq_coef_len)

    // Processing parameters
    pub n_threads: usize,

    // Flags (MEM_F_NO_RESCUE, MEM_F_NOPAIRING, MEM_F_ALL)
    pub no_rescue: bool,
    pub no_pairing: bool,
    pub output_all: bool,
}

/// Manual insert size specification (overrides auto-inference, FR only)
#[derive(Debug, Clone, PartialEq)]
pub struct InsertSizeOverride {
    pub mean: f64,   // Mean insert size
    pub stddev: f64, // Standard deviation (default: 10% of mean)
    pub max: i32,    // Maximum insert size (default: mean + 4*stddev)
    pub min: i32,    // Minimum insert size (default: 0)
}

/// Options set explicitly by the caller, which `-A` style rescaling must not touch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overridden {
    pub mismatch: bool,
    pub gap_open: bool,
    pub gap_extend: bool,
    pub zdrop: bool,
    pub min_score: bool,
    pub unpaired: bool,
    pub clip: bool,
}

impl Default for MemOpt {
    /// Defaults of BWA-MEM 0.7.8 mem_opt_init()
    fn default() -> Self {
        let mut opt = MemOpt {
            a: defaults::MATCH_SCORE,
            b: defaults::MISMATCH_PENALTY,
            o_del: defaults::GAP_OPEN_PENALTY,
            e_del: defaults::GAP_EXTEND_PENALTY,
            o_ins: defaults::GAP_OPEN_PENALTY,
            e_ins: defaults::GAP_EXTEND_PENALTY,
            pen_unpaired: defaults::UNPAIRED_PENALTY,
            pen_clip5: defaults::CLIPPING_PENALTY,
            pen_clip3: defaults::CLIPPING_PENALTY,

            w: defaults::BAND_WIDTH,
            zdrop: defaults::OFF_DIAGONAL_DROPOFF,
            min_seed_len: defaults::MIN_SEED_LEN,

            mask_level: defaults::MASK_LEVEL,

            t: defaults::MIN_SCORE,

            min_ins: 1,
            max_ins: defaults::MAX_INSERT,
            max_matesw: defaults::MAX_MATE_RESCUES,
            insert_size_override: None,

            mapq_coef_len: defaults::MAPQ_COEF_LEN as f32,
            mapq_coef_fac: 0,

            n_threads: 1,

            no_rescue: false,
            no_pairing: false,
            output_all: false,
        };

        opt.mapq_coef_fac = (opt.mapq_coef_len as f64).ln() as i32;
        opt
    }
}

impl MemOpt {
    /// Validate parameters for consistency.
    /// Returns Ok(()) if valid, or Err with description of issues
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.a < 1 {
            errors.push(format!("match_score must be >= 1, got {}", self.a));
        }
        if self.b < 1 {
            errors.push(format!("mismatch_penalty must be >= 1, got {}", self.b));
        }
        for (name, v) in [
            ("gap_open", self.o_del),
            ("gap_open", self.o_ins),
            ("gap_extend", self.e_del),
            ("gap_extend", self.e_ins),
            ("unpaired_penalty", self.pen_unpaired),
            ("clip_penalty", self.pen_clip5),
            ("clip_penalty", self.pen_clip3),
        ] {
            if v < 0 {
                errors.push(format!("{name} must be >= 0, got {v}"));
            }
        }
        if self.min_seed_len < 1 {
            errors.push(format!(
                "min_seed_len must be >= 1, got {}",
                self.min_seed_len
            ));
        }
        if self.w < 1 {
            errors.push(format!("band_width must be >= 1, got {}", self.w));
        }
        if self.t < 0 {
            errors.push(format!("score_threshold must be >= 0, got {}", self.t));
        }
        if !(0.0..=1.0).contains(&self.mask_level) {
            errors.push(format!(
                "mask_level must be in [0, 1], got {}",
                self.mask_level
            ));
        }
        if self.max_ins < 1 {
            errors.push(format!("max_insert must be >= 1, got {}", self.max_ins));
        }
        if self.max_matesw < 0 {
            errors.push(format!(
                "max_mate_rescues must be >= 0, got {}",
                self.max_matesw
            ));
        }
        if self.n_threads < 1 {
            errors.push(format!("threads must be >= 1, got {}", self.n_threads));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// BWA `-A` semantics: a match score other than 1 scales every other
    /// penalty that was not set explicitly.
    pub fn rescale_for_match_score(&mut self, overridden: Overridden) {
        if self.a == 1 {
            return;
        }
        let a = self.a;
        if !overridden.mismatch {
            self.b *= a;
        }
        if !overridden.gap_open {
            self.o_del *= a;
            self.o_ins *= a;
        }
        if !overridden.gap_extend {
            self.e_del *= a;
            self.e_ins *= a;
        }
        if !overridden.zdrop {
            self.zdrop *= a;
        }
        if !overridden.min_score {
            self.t *= a;
        }
        if !overridden.unpaired {
            self.pen_unpaired *= a;
        }
        if !overridden.clip {
            self.pen_clip5 *= a;
            self.pen_clip3 *= a;
        }
    }

    /// Apply one named parameter. Returns `Ok(false)` when the name is not
    /// a BWA-MEM option, and a type error when the value kind is wrong.
    pub fn apply_param(&mut self, param: &Param, overridden: &mut Overridden) -> Result<bool> {
        let v = &param.value;
        match param.name.as_str() {
            "match_score" => self.a = to_i32(param, v.get_int()?)?,
            "mismatch_penalty" => {
                self.b = to_i32(param, v.get_int()?)?;
                overridden.mismatch = true;
            }
            "gap_open" => {
                let o = to_i32(param, v.get_int()?)?;
                self.o_del = o;
                self.o_ins = o;
                overridden.gap_open = true;
            }
            "gap_extend" => {
                let e = to_i32(param, v.get_int()?)?;
                self.e_del = e;
                self.e_ins = e;
                overridden.gap_extend = true;
            }
            "unpaired_penalty" => {
                self.pen_unpaired = to_i32(param, v.get_int()?)?;
                overridden.unpaired = true;
            }
            "clip_penalty" => {
                let c = to_i32(param, v.get_int()?)?;
                self.pen_clip5 = c;
                self.pen_clip3 = c;
                overridden.clip = true;
            }
            "min_score" => {
                self.t = to_i32(param, v.get_int()?)?;
                overridden.min_score = true;
            }
            "z_drop" => {
                self.zdrop = to_i32(param, v.get_int()?)?;
                overridden.zdrop = true;
            }
            "min_seed_len" => self.min_seed_len = to_i32(param, v.get_int()?)?,
            "band_width" => self.w = to_i32(param, v.get_int()?)?,
            "mask_level" => self.mask_level = v.get_real()? as f32,
            "max_mate_rescues" => self.max_matesw = to_i32(param, v.get_int()?)?,
            "skip_mate_rescue" => self.no_rescue = v.get_int()? != 0,
            "skip_pairing" => self.no_pairing = v.get_int()? != 0,
            "output_all" => self.output_all = v.get_int()? != 0,
            "threads" => {
                self.n_threads = usize::try_from(v.get_int()?)
                    .map_err(|_| RapiError::param("threads must be non-negative"))?
            }
            "insert_size" => {
                self.insert_size_override =
                    Some(Self::parse_insert_size(v.get_text()?).map_err(RapiError::Param)?)
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Parse insert size specification from string
    /// Format: "mean[,stddev[,max[,min]]]"
    /// Example: "500" or "500,50" or "500,50,800,200"
    pub fn parse_insert_size(s: &str) -> std::result::Result<InsertSizeOverride, String> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();

        if parts.len() > 4 {
            return Err(format!(
                "Insert size must be FLOAT[,FLOAT[,INT[,INT]]]: {}",
                s
            ));
        }

        let mean = parts[0]
            .parse::<f64>()
            .map_err(|_| format!("Invalid insert size mean: {}", parts[0]))?;

        if mean <= 0.0 {
            return Err(format!("Insert size mean must be positive: {}", mean));
        }

        let stddev = match parts.get(1) {
            Some(p) => p
                .parse::<f64>()
                .map_err(|_| format!("Invalid insert size stddev: {}", p))?,
            None => mean * 0.1,
        };

        let max = match parts.get(2) {
            Some(p) => p
                .parse::<i32>()
                .map_err(|_| format!("Invalid insert size max: {}", p))?,
            None => (mean + defaults::MAX_STDDEV * stddev) as i32,
        };

        let min = match parts.get(3) {
            Some(p) => p
                .parse::<i32>()
                .map_err(|_| format!("Invalid insert size min: {}", p))?,
            None => 0,
        };

        Ok(InsertSizeOverride {
            mean,
            stddev,
            max,
            min,
        })
    }
}

fn to_i32(param: &Param, v: i64) -> Result<i32> {
    i32::try_from(v).map_err(|_| {
        RapiError::param(format!("{} = {} does not fit a 32-bit integer", param.name, v))
    })
}

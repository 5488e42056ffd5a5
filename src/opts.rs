//! Client-facing aligner options.
//!
//! `RapiOpts` is the aligner-agnostic configuration surface: a handful of
//! generic knobs plus an open list of named parameters that only the
//! selected aligner interprets.

use crate::core::value::Param;
use crate::error::{RapiError, Result};
use crate::mem_opt::{MemOpt, Overridden};

#[derive(Debug, Clone)]
pub struct RapiOpts {
    /// Warn about (instead of rejecting) parameters the aligner does not know.
    pub ignore_unsupported: bool,
    /// Minimum score for an alignment to be reported.
    pub mapq_min: i32,
    /// Smallest insert size accepted as insert-size evidence.
    pub isize_min: i32,
    /// Largest insert size accepted as insert-size evidence.
    pub isize_max: i32,
    pub parameters: Vec<Param>,
    /// Base aligner options the generic knobs and parameters are applied to.
    pub aligner: MemOpt,
}

impl Default for RapiOpts {
    fn default() -> Self {
        Self {
            ignore_unsupported: true,
            mapq_min: 0,
            isize_min: 0,
            isize_max: crate::defaults::MAX_INSERT,
            parameters: Vec::new(),
            aligner: MemOpt::default(),
        }
    }
}

impl RapiOpts {
    /// Append a named parameter.
    pub fn push_param(&mut self, param: Param) {
        self.parameters.push(param);
    }

    /// Resolve the BWA-MEM options used for one batch.
    pub fn effective_mem_opt(&self) -> Result<MemOpt> {
        if self.isize_min < 0 || self.isize_max < 1 || self.isize_min > self.isize_max {
            return Err(RapiError::param(format!(
                "invalid insert size range [{}, {}]",
                self.isize_min, self.isize_max
            )));
        }

        let mut opt = self.aligner.clone();
        opt.t = self.mapq_min;
        opt.min_ins = self.isize_min.max(1);
        opt.max_ins = self.isize_max;

        let mut overridden = Overridden::default();
        for param in &self.parameters {
            if opt.apply_param(param, &mut overridden)? {
                continue;
            }
            if self.ignore_unsupported {
                log::warn!("Ignoring unsupported aligner parameter '{}'", param.name);
            } else {
                return Err(RapiError::OpNotSupported(format!(
                    "parameter '{}' is not supported by {}",
                    param.name,
                    crate::defaults::ALIGNER_NAME
                )));
            }
        }
        opt.rescale_for_match_score(overridden);

        opt.validate()
            .map_err(|errors| RapiError::param(errors.join("; ")))?;
        Ok(opt)
    }
}

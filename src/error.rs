//! Error type shared by every RAPI operation.
//!
//! Variants mirror the status codes of the C read aligner API so callers
//! bridging to that API can recover the numeric value with [`RapiError::code`].

use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RapiError {
    /// Failure reported by the external search service, or any other
    /// condition without a more specific kind.
    #[error("aligner error: {0}")]
    Generic(#[from] anyhow::Error),

    #[error("operation not supported: {0}")]
    OpNotSupported(String),

    #[error("reference error: {0}")]
    Reference(String),

    #[error("tag {0} does not exist")]
    TagNotExisting(String),

    #[error("memory allocation failed: {0}")]
    Memory(#[from] TryReserveError),

    #[error("invalid parameter: {0}")]
    Param(String),

    #[error("type mismatch: expected {expected}, found {found}")]
    Type {
        expected: &'static str,
        found: &'static str,
    },
}

impl RapiError {
    pub const NO_ERROR: i32 = 0;

    /// Numeric status code of the C API.
    pub fn code(&self) -> i32 {
        match self {
            RapiError::Generic(_) => -1,
            RapiError::OpNotSupported(_) => -2,
            RapiError::Reference(_) => -10,
            RapiError::TagNotExisting(_) => -20,
            RapiError::Memory(_) => -30,
            RapiError::Param(_) => -40,
            RapiError::Type { .. } => -50,
        }
    }

    pub(crate) fn param(msg: impl Into<String>) -> Self {
        RapiError::Param(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, RapiError>;

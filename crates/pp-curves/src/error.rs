//! Error types for curve construction, interpolation and combination.

use pp_core::error::PpError;
use pp_core::numeric::Real;
use thiserror::Error;

/// Errors raised while building or querying curves.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    #[error("Invalid curve: {what}")]
    InvalidCurve { what: String },

    #[error("Flow {flow} outside curve domain [{min}, {max}]")]
    OutOfRange { flow: Real, min: Real, max: Real },

    #[error("Incompatible combination: {what}")]
    IncompatibleCombination { what: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("CSV error: {message}")]
    Csv { message: String },

    #[error(transparent)]
    Core(#[from] PpError),
}

pub type CurveResult<T> = Result<T, CurveError>;

impl CurveError {
    pub(crate) fn invalid(what: impl Into<String>) -> Self {
        CurveError::InvalidCurve { what: what.into() }
    }

    pub(crate) fn incompatible(what: impl Into<String>) -> Self {
        CurveError::IncompatibleCombination { what: what.into() }
    }
}

impl From<csv::Error> for CurveError {
    fn from(e: csv::Error) -> Self {
        CurveError::Csv {
            message: e.to_string(),
        }
    }
}

impl From<CurveError> for PpError {
    fn from(e: CurveError) -> Self {
        match e {
            CurveError::InvalidCurve { .. } => PpError::InvalidArg {
                what: "invalid curve",
            },
            CurveError::OutOfRange { .. } => PpError::InvalidArg {
                what: "flow out of range",
            },
            CurveError::IncompatibleCombination { .. } => PpError::InvalidArg {
                what: "incompatible combination",
            },
            CurveError::InvalidArg { what } => PpError::InvalidArg { what },
            CurveError::Csv { .. } => PpError::InvalidArg { what: "csv" },
            CurveError::Core(inner) => inner,
        }
    }
}

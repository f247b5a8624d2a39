//! Error types for solver operations.

use pp_core::error::PpError;
use pp_curves::CurveError;
use thiserror::Error;

/// Errors that can occur while searching for operating points.
///
/// Finding no intersection is not an error; it is an empty root set.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Curve error: {0}")]
    Curve(#[from] CurveError),

    #[error("Invalid solver configuration: {what}")]
    InvalidConfig { what: &'static str },

    #[error("Search domain [{lo}, {hi}] is unbounded")]
    UnboundedDomain { lo: f64, hi: f64 },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl SolverError {
    /// A curve was queried outside its domain during the search.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, SolverError::Curve(CurveError::OutOfRange { .. }))
    }
}

impl From<SolverError> for PpError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::Curve(inner) => inner.into(),
            SolverError::InvalidConfig { what } => PpError::InvalidArg { what },
            SolverError::UnboundedDomain { .. } => PpError::InvalidArg {
                what: "unbounded search domain",
            },
        }
    }
}

//! Root-finding configuration.

use crate::error::{SolverError, SolverResult};
use pp_core::numeric::{Real, Tolerances};

/// Operating-point search configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverConfig {
    /// Relative flow tolerance for bracket refinement
    pub rel_tol: Real,
    /// Absolute flow tolerance for bracket refinement (flow units)
    pub abs_tol: Real,
    /// Maximum bisection iterations per bracket
    pub max_iterations: usize,
    /// Equal sub-steps per interval of the merged breakpoint grid
    pub subdivisions: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            rel_tol: 1e-6,
            abs_tol: 1e-4,
            max_iterations: 100,
            subdivisions: 4,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> SolverResult<()> {
        if !(self.rel_tol.is_finite() && self.rel_tol >= 0.0) {
            return Err(SolverError::InvalidConfig {
                what: "rel_tol must be finite and non-negative",
            });
        }
        if !(self.abs_tol.is_finite() && self.abs_tol >= 0.0) {
            return Err(SolverError::InvalidConfig {
                what: "abs_tol must be finite and non-negative",
            });
        }
        if self.rel_tol == 0.0 && self.abs_tol == 0.0 {
            return Err(SolverError::InvalidConfig {
                what: "at least one of rel_tol/abs_tol must be positive",
            });
        }
        if self.max_iterations == 0 {
            return Err(SolverError::InvalidConfig {
                what: "max_iterations must be at least 1",
            });
        }
        if self.subdivisions == 0 {
            return Err(SolverError::InvalidConfig {
                what: "subdivisions must be at least 1",
            });
        }
        Ok(())
    }

    pub fn tolerances(&self) -> Tolerances {
        Tolerances {
            abs: self.abs_tol,
            rel: self.rel_tol,
        }
    }

    /// Converged bracket half-width at `flow`: the looser of the two bounds.
    pub fn flow_tolerance(&self, flow: Real) -> Real {
        self.tolerances().looser_at(flow)
    }
}

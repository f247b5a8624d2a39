//! The head-versus-flow interface shared by pump and system curves.

use crate::error::CurveResult;
use pp_core::numeric::Real;

/// Anything that can report head as a function of flow.
///
/// Pump composites and both system-curve modes implement this, so the
/// operating-point solver never needs to know where a curve came from.
pub trait HeadCurve: Send + Sync {
    /// Head at `flow`. Fails with `OutOfRange` outside the accepted domain.
    fn head_at(&self, flow: Real) -> CurveResult<Real>;

    /// Nominal flow domain `[min, max]`. `max` may be `+inf` for analytic curves.
    fn flow_domain(&self) -> (Real, Real);

    /// Native sample flows, ascending. Empty for analytic curves.
    fn breakpoints(&self) -> Vec<Real>;

    /// Distance outside the nominal domain that still clamps to the boundary.
    fn boundary_tolerance(&self) -> Real {
        0.0
    }

    /// Domain widened by the boundary tolerance, never below zero flow.
    fn accepted_domain(&self) -> (Real, Real) {
        let (lo, hi) = self.flow_domain();
        let tol = self.boundary_tolerance();
        ((lo - tol).max(0.0), hi + tol)
    }
}

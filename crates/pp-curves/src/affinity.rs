//! Affinity-law speed scaling.
//!
//! For a speed ratio `r = n / n_rated`:
//!
//! ```text
//! Q' = Q * r
//! H' = H * r^2
//! P' = P * r^3
//! NPSHr' = NPSHr * r^2
//! eta' = eta
//! ```
//!
//! Efficiency is carried through unchanged. That is an approximation: real
//! pumps lose some efficiency at reduced speed, so scaled efficiencies are
//! slightly optimistic far from the rated speed.

use crate::curve::{CurveModel, CurvePoint};
use crate::error::{CurveError, CurveResult};
use pp_core::numeric::Real;

/// Scale a curve to run at `ratio` times its rated speed.
///
/// The boundary tolerance of the input is scaled with flow.
///
/// # Errors
/// `InvalidArg` if `ratio` is not a positive finite number.
pub fn scale_by_speed(curve: &CurveModel, ratio: Real) -> CurveResult<CurveModel> {
    if !(ratio.is_finite() && ratio > 0.0) {
        return Err(CurveError::InvalidArg {
            what: "speed ratio must be positive and finite",
        });
    }

    let r2 = ratio * ratio;
    let r3 = r2 * ratio;
    let points = curve
        .points()
        .iter()
        .map(|p| CurvePoint {
            flow: p.flow * ratio,
            head: p.head * r2,
            efficiency: p.efficiency,
            power: p.power.map(|w| w * r3),
            npshr: p.npshr.map(|n| n * r2),
        })
        .collect();

    CurveModel::new(points)?.with_tolerance(curve.tolerance() * ratio)
}

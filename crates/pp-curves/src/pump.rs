//! Catalog pump curves, best efficiency point and operating regions.

use crate::curve::{CurveModel, CurvePoint};
use crate::error::{CurveError, CurveResult};
use pp_core::numeric::Real;
use pp_core::units::UnitSystem;
use serde::{Deserialize, Serialize};

/// Minimum number of samples a catalog pump curve must carry.
pub const MIN_PUMP_POINTS: usize = 3;

/// Flow floor used by the head-per-flow fallback when no efficiency is known.
const BEP_FLOW_FLOOR: Real = 1e-6;

/// A pump performance curve measured at its rated speed.
///
/// Immutable once built; scenarios reference it by `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct PumpCurve {
    id: String,
    name: String,
    rated_speed: Real,
    unit_system: UnitSystem,
    curve: CurveModel,
}

impl PumpCurve {
    /// Build a pump curve.
    ///
    /// # Errors
    /// `InvalidCurve` if `rated_speed` is not positive, if fewer than three
    /// samples are given, or if the samples fail [`CurveModel::new`].
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        rated_speed: Real,
        unit_system: UnitSystem,
        points: Vec<CurvePoint>,
    ) -> CurveResult<Self> {
        let id = id.into();
        if !(rated_speed.is_finite() && rated_speed > 0.0) {
            return Err(CurveError::invalid(format!(
                "pump '{id}' rated speed must be positive, got {rated_speed}"
            )));
        }
        if points.len() < MIN_PUMP_POINTS {
            return Err(CurveError::invalid(format!(
                "pump '{id}' needs at least {MIN_PUMP_POINTS} points, got {}",
                points.len()
            )));
        }
        let curve = CurveModel::new(points).map_err(|e| match e {
            CurveError::InvalidCurve { what } => {
                CurveError::invalid(format!("pump '{id}': {what}"))
            }
            other => other,
        })?;
        Ok(Self {
            id,
            name: name.into(),
            rated_speed,
            unit_system,
            curve,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rated_speed(&self) -> Real {
        self.rated_speed
    }

    pub fn unit_system(&self) -> UnitSystem {
        self.unit_system
    }

    pub fn curve(&self) -> &CurveModel {
        &self.curve
    }

    /// Speed ratio for running this pump at `speed` (same units as rated speed).
    pub fn speed_ratio(&self, speed: Real) -> Real {
        speed / self.rated_speed
    }

    /// Best efficiency point of the tabulated curve.
    pub fn best_efficiency_point(&self) -> CurvePoint {
        best_efficiency_point(&self.curve)
    }
}

/// Sample with the highest efficiency.
///
/// Without any positive efficiency data, falls back to the sample with the
/// lowest `head / flow` (flow floored at a small positive value).
pub fn best_efficiency_point(curve: &CurveModel) -> CurvePoint {
    let points = curve.points();
    let best_eta = points
        .iter()
        .filter(|p| p.efficiency.is_some_and(|e| e > 0.0))
        .max_by(|a, b| {
            let (ea, eb) = (a.efficiency.unwrap_or(0.0), b.efficiency.unwrap_or(0.0));
            ea.total_cmp(&eb)
        });
    if let Some(p) = best_eta {
        return *p;
    }

    let specific = |p: &CurvePoint| p.head / p.flow.max(BEP_FLOW_FLOOR);
    points
        .iter()
        .min_by(|a, b| specific(a).total_cmp(&specific(b)))
        .copied()
        .unwrap_or(points[0])
}

/// Where an operating point sits relative to the best efficiency flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingRegion {
    /// Inside the preferred operating region.
    Preferred,
    /// Outside the preferred but inside the allowable operating region.
    Allowable,
    Outside,
}

/// Preferred (POR) and allowable (AOR) flow windows around a BEP.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatingRanges {
    pub por: (Real, Real),
    pub aor: (Real, Real),
}

impl OperatingRanges {
    pub fn classify(&self, flow: Real) -> OperatingRegion {
        let within = |(lo, hi): (Real, Real)| flow >= lo && flow <= hi;
        if within(self.por) {
            OperatingRegion::Preferred
        } else if within(self.aor) {
            OperatingRegion::Allowable
        } else {
            OperatingRegion::Outside
        }
    }
}

/// Scale POR/AOR fractions of the BEP flow into absolute flow windows.
pub fn operating_ranges(
    bep_flow: Real,
    por: (Real, Real),
    aor: (Real, Real),
) -> CurveResult<OperatingRanges> {
    if !(bep_flow.is_finite() && bep_flow > 0.0) {
        return Err(CurveError::InvalidArg {
            what: "BEP flow must be positive",
        });
    }
    Ok(OperatingRanges {
        por: (bep_flow * por.0, bep_flow * por.1),
        aor: (bep_flow * aor.0, bep_flow * aor.1),
    })
}

//! Tabulated performance curves with piecewise-linear interpolation.

use crate::error::{CurveError, CurveResult};
use crate::traits::HeadCurve;
use pp_core::numeric::{Real, ensure_finite, ensure_non_negative, lerp};
use serde::{Deserialize, Serialize};

/// One tabulated sample of a performance curve.
///
/// Efficiency is a fraction in `[0, 1]`. The optional columns may be
/// populated on some samples and not on others.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub flow: Real,
    pub head: Real,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<Real>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<Real>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npshr: Option<Real>,
}

impl CurvePoint {
    pub fn new(flow: Real, head: Real) -> Self {
        Self {
            flow,
            head,
            efficiency: None,
            power: None,
            npshr: None,
        }
    }

    pub fn with_efficiency(mut self, efficiency: Real) -> Self {
        self.efficiency = Some(efficiency);
        self
    }

    pub fn with_power(mut self, power: Real) -> Self {
        self.power = Some(power);
        self
    }

    pub fn with_npshr(mut self, npshr: Real) -> Self {
        self.npshr = Some(npshr);
        self
    }

    fn validate(&self) -> CurveResult<()> {
        ensure_non_negative(self.flow, "flow")?;
        ensure_non_negative(self.head, "head")?;
        if let Some(eta) = self.efficiency {
            ensure_finite(eta, "efficiency")?;
            if !(0.0..=1.0).contains(&eta) {
                return Err(CurveError::invalid(format!(
                    "efficiency {eta} at flow {} is outside [0, 1]",
                    self.flow
                )));
            }
        }
        if let Some(power) = self.power {
            ensure_non_negative(power, "power")?;
        }
        if let Some(npshr) = self.npshr {
            ensure_non_negative(npshr, "npshr")?;
        }
        Ok(())
    }
}

/// Where a query flow falls relative to the samples.
#[derive(Debug, Clone, Copy)]
enum Bracket {
    /// On (or clamped to) sample `i`.
    Exact(usize),
    /// Strictly between samples `i` and `i + 1`.
    Between(usize, Real),
}

/// A validated curve: samples sorted by strictly increasing flow.
///
/// Queries between samples interpolate linearly, so monotone data stays
/// monotone. Queries outside `[min_flow, max_flow]` fail with `OutOfRange`
/// unless they are within `tolerance` of the boundary, in which case the
/// boundary sample is returned.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveModel {
    points: Vec<CurvePoint>,
    tolerance: Real,
}

impl CurveModel {
    /// Validate, sort by flow and build a curve.
    ///
    /// # Errors
    /// `InvalidCurve` for fewer than two samples, duplicate flows, negative or
    /// non-finite values, or efficiency outside `[0, 1]`.
    pub fn new(mut points: Vec<CurvePoint>) -> CurveResult<Self> {
        for p in &points {
            p.validate().map_err(|e| match e {
                CurveError::Core(core) => CurveError::invalid(core.to_string()),
                other => other,
            })?;
        }

        points.sort_by(|a, b| a.flow.total_cmp(&b.flow));

        if let Some(w) = points.windows(2).find(|w| w[0].flow == w[1].flow) {
            return Err(CurveError::invalid(format!(
                "duplicate flow value {}",
                w[0].flow
            )));
        }
        if points.len() < 2 {
            return Err(CurveError::invalid(format!(
                "need at least 2 distinct flow values, got {}",
                points.len()
            )));
        }

        Ok(Self {
            points,
            tolerance: 0.0,
        })
    }

    /// Set the boundary clamping tolerance (flow units).
    pub fn with_tolerance(mut self, tolerance: Real) -> CurveResult<Self> {
        self.tolerance = ensure_non_negative(tolerance, "boundary tolerance")?;
        Ok(self)
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Number of samples; never below two.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn tolerance(&self) -> Real {
        self.tolerance
    }

    pub fn min_flow(&self) -> Real {
        self.points[0].flow
    }

    pub fn max_flow(&self) -> Real {
        self.points[self.points.len() - 1].flow
    }

    /// `(min, max)` of the sampled heads.
    pub fn head_range(&self) -> (Real, Real) {
        self.points
            .iter()
            .fold((Real::INFINITY, Real::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.head), hi.max(p.head))
            })
    }

    fn locate(&self, flow: Real) -> CurveResult<Bracket> {
        let flow = ensure_finite(flow, "query flow")?;
        let (lo, hi) = (self.min_flow(), self.max_flow());

        if flow < lo {
            if lo - flow <= self.tolerance {
                return Ok(Bracket::Exact(0));
            }
            return Err(CurveError::OutOfRange {
                flow,
                min: lo,
                max: hi,
            });
        }
        if flow > hi {
            if flow - hi <= self.tolerance {
                return Ok(Bracket::Exact(self.points.len() - 1));
            }
            return Err(CurveError::OutOfRange {
                flow,
                min: lo,
                max: hi,
            });
        }

        // first sample with flow >= query; lo <= flow guarantees idx < len
        let idx = self.points.partition_point(|p| p.flow < flow);
        if self.points[idx].flow == flow {
            Ok(Bracket::Exact(idx))
        } else {
            Ok(Bracket::Between(idx - 1, flow))
        }
    }

    fn interpolate(
        &self,
        flow: Real,
        field: impl Fn(&CurvePoint) -> Option<Real>,
    ) -> CurveResult<Option<Real>> {
        Ok(match self.locate(flow)? {
            Bracket::Exact(i) => field(&self.points[i]),
            Bracket::Between(i, q) => {
                let (a, b) = (&self.points[i], &self.points[i + 1]);
                match (field(a), field(b)) {
                    (Some(ya), Some(yb)) => Some(lerp(a.flow, ya, b.flow, yb, q)),
                    _ => None,
                }
            }
        })
    }

    /// Head at `flow`.
    pub fn head_at(&self, flow: Real) -> CurveResult<Real> {
        match self.locate(flow)? {
            Bracket::Exact(i) => Ok(self.points[i].head),
            Bracket::Between(i, q) => {
                let (a, b) = (&self.points[i], &self.points[i + 1]);
                Ok(lerp(a.flow, a.head, b.flow, b.head, q))
            }
        }
    }

    /// Efficiency at `flow`; `None` if either bracketing sample lacks it.
    pub fn efficiency_at(&self, flow: Real) -> CurveResult<Option<Real>> {
        self.interpolate(flow, |p| p.efficiency)
    }

    /// Power at `flow`; `None` if either bracketing sample lacks it.
    pub fn power_at(&self, flow: Real) -> CurveResult<Option<Real>> {
        self.interpolate(flow, |p| p.power)
    }

    /// NPSHr at `flow`; `None` if either bracketing sample lacks it.
    pub fn npshr_at(&self, flow: Real) -> CurveResult<Option<Real>> {
        self.interpolate(flow, |p| p.npshr)
    }

    /// Every column at `flow`. The returned `flow` is the query flow, even when
    /// the query was clamped to a boundary sample.
    pub fn point_at(&self, flow: Real) -> CurveResult<CurvePoint> {
        Ok(CurvePoint {
            flow,
            head: self.head_at(flow)?,
            efficiency: self.efficiency_at(flow)?,
            power: self.power_at(flow)?,
            npshr: self.npshr_at(flow)?,
        })
    }

    /// `n` evenly spaced points spanning the domain, endpoints included.
    pub fn sample(&self, n: usize) -> CurveResult<Vec<CurvePoint>> {
        if n < 2 {
            return Err(CurveError::InvalidArg {
                what: "sample count must be at least 2",
            });
        }
        let (lo, hi) = (self.min_flow(), self.max_flow());
        let step = (hi - lo) / (n - 1) as Real;
        (0..n)
            .map(|i| {
                // pin the last point to the exact upper bound
                let q = if i == n - 1 { hi } else { lo + step * i as Real };
                self.point_at(q)
            })
            .collect()
    }
}

impl HeadCurve for CurveModel {
    fn head_at(&self, flow: Real) -> CurveResult<Real> {
        CurveModel::head_at(self, flow)
    }

    fn flow_domain(&self) -> (Real, Real) {
        (self.min_flow(), self.max_flow())
    }

    fn breakpoints(&self) -> Vec<Real> {
        self.points.iter().map(|p| p.flow).collect()
    }

    fn boundary_tolerance(&self) -> Real {
        self.tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pump() -> CurveModel {
        CurveModel::new(vec![
            CurvePoint::new(1000.0, 120.0)
                .with_efficiency(0.75)
                .with_power(160.0),
            CurvePoint::new(0.0, 150.0).with_efficiency(0.55).with_power(100.0),
            CurvePoint::new(500.0, 140.0).with_efficiency(0.70),
        ])
        .unwrap()
    }

    #[test]
    fn sorts_on_construction() {
        let c = pump();
        let flows: Vec<_> = c.points().iter().map(|p| p.flow).collect();
        assert_eq!(flows, vec![0.0, 500.0, 1000.0]);
    }

    #[test]
    fn rejects_duplicate_flow() {
        let err = CurveModel::new(vec![
            CurvePoint::new(0.0, 10.0),
            CurvePoint::new(5.0, 8.0),
            CurvePoint::new(5.0, 7.0),
        ])
        .unwrap_err();
        assert!(matches!(err, CurveError::InvalidCurve { .. }));
    }

    #[test]
    fn rejects_single_point() {
        let err = CurveModel::new(vec![CurvePoint::new(0.0, 10.0)]).unwrap_err();
        assert!(matches!(err, CurveError::InvalidCurve { .. }));
    }

    #[test]
    fn rejects_negative_and_bad_efficiency() {
        let negative_flow = vec![CurvePoint::new(-1.0, 10.0), CurvePoint::new(1.0, 9.0)];
        assert!(CurveModel::new(negative_flow).is_err());
        let negative_head = vec![CurvePoint::new(0.0, -10.0), CurvePoint::new(1.0, 9.0)];
        assert!(CurveModel::new(negative_head).is_err());
        let err = CurveModel::new(vec![
            CurvePoint::new(0.0, 10.0).with_efficiency(75.0),
            CurvePoint::new(1.0, 9.0),
        ])
        .unwrap_err();
        assert!(matches!(err, CurveError::InvalidCurve { .. }));
    }

    #[test]
    fn exact_at_samples() {
        let c = pump();
        assert_eq!(c.head_at(500.0).unwrap(), 140.0);
        assert_eq!(c.efficiency_at(500.0).unwrap(), Some(0.70));
    }

    #[test]
    fn interpolates_between_samples() {
        let c = pump();
        assert!((c.head_at(750.0).unwrap() - 130.0).abs() < 1e-12);
        assert!((c.efficiency_at(250.0).unwrap().unwrap() - 0.625).abs() < 1e-12);
    }

    #[test]
    fn missing_neighbor_propagates_none() {
        let c = pump();
        // sample at 500 has no power
        assert_eq!(c.power_at(250.0).unwrap(), None);
        assert_eq!(c.power_at(750.0).unwrap(), None);
        assert_eq!(c.power_at(500.0).unwrap(), None);
        assert_eq!(c.power_at(1000.0).unwrap(), Some(160.0));
    }

    #[test]
    fn out_of_range_without_tolerance() {
        let c = pump();
        let err = c.head_at(1000.5).unwrap_err();
        assert!(matches!(err, CurveError::OutOfRange { .. }));
    }

    #[test]
    fn clamps_within_tolerance() {
        let c = pump().with_tolerance(1.0).unwrap();
        assert_eq!(c.head_at(1000.5).unwrap(), 120.0);
        assert!(c.head_at(1001.5).is_err());
    }

    #[test]
    fn sample_spans_domain() {
        let pts = pump().sample(5).unwrap();
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[0].flow, 0.0);
        assert_eq!(pts[4].flow, 1000.0);
        assert_eq!(pts[2].head, 140.0);
        assert!(pump().sample(1).is_err());
    }

    proptest! {
        #[test]
        fn round_trip_at_sample_flows(
            mut flows in prop::collection::vec(0.0_f64..1e4, 2..12),
            heads in prop::collection::vec(0.0_f64..500.0, 12),
        ) {
            flows.sort_by(|a, b| a.total_cmp(b));
            flows.dedup();
            prop_assume!(flows.len() >= 2);
            let pts: Vec<_> = flows.iter().zip(&heads).map(|(&q, &h)| CurvePoint::new(q, h)).collect();
            let c = CurveModel::new(pts.clone()).unwrap();
            for p in pts {
                prop_assert_eq!(c.head_at(p.flow).unwrap(), p.head);
            }
        }

        #[test]
        fn monotone_data_stays_monotone(
            steps in prop::collection::vec((0.1_f64..100.0, 0.0_f64..50.0), 2..10),
            f1 in 0.0_f64..1.0,
            f2 in 0.0_f64..1.0,
        ) {
            let mut q = 0.0;
            let mut h = 0.0;
            let mut pts = Vec::new();
            for (dq, dh) in steps {
                pts.push(CurvePoint::new(q, h));
                q += dq;
                h += dh;
            }
            let c = CurveModel::new(pts).unwrap();
            let span = c.max_flow() - c.min_flow();
            let (a, b) = if f1 <= f2 { (f1, f2) } else { (f2, f1) };
            let (qa, qb) = (c.min_flow() + a * span, c.min_flow() + b * span);
            prop_assert!(c.head_at(qa).unwrap() <= c.head_at(qb).unwrap());
        }
    }
}

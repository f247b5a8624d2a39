//! Curve queries for callers that chart or tabulate pump data.

use pp_core::numeric::Real;
use pp_curves::{
    Arrangement, CurvePoint, OperatingRanges, best_efficiency_point, effective_curve,
    operating_ranges, scale_by_speed,
};
use pp_project::{CurveCatalog, DEFAULT_AOR, DEFAULT_POR};
use serde::Serialize;

use crate::error::AppResult;

/// Best efficiency point of a pump at one speed ratio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BepSummary {
    pub pump_id: String,
    pub pump_name: String,
    pub speed_ratio: Real,
    pub bep: CurvePoint,
    /// `None` when the BEP sits at zero flow
    pub ranges: Option<OperatingRanges>,
}

/// BEP and POR/AOR windows of `pump_id` running at `speed_ratio`.
pub fn best_efficiency(
    catalog: &dyn CurveCatalog,
    pump_id: &str,
    speed_ratio: Real,
) -> AppResult<BepSummary> {
    let pump = catalog.get_pump_curve(pump_id)?;
    let scaled = scale_by_speed(pump.curve(), speed_ratio)?;
    let bep = best_efficiency_point(&scaled);
    Ok(BepSummary {
        pump_id: pump.id().to_string(),
        pump_name: pump.name().to_string(),
        speed_ratio,
        bep,
        ranges: operating_ranges(bep.flow, DEFAULT_POR, DEFAULT_AOR).ok(),
    })
}

/// `n` evenly spaced samples of the effective curve of a configuration.
pub fn sample_effective_curve(
    catalog: &dyn CurveCatalog,
    pump_id: &str,
    arrangement: Arrangement,
    count: u32,
    speed_ratio: Real,
    n: usize,
) -> AppResult<Vec<CurvePoint>> {
    let pump = catalog.get_pump_curve(pump_id)?;
    let curve = effective_curve(pump.curve(), arrangement, count, speed_ratio)?;
    Ok(curve.sample(n)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppError;
    use pp_core::UnitSystem;
    use pp_curves::PumpCurve;
    use pp_project::InMemoryCatalog;

    fn catalog() -> InMemoryCatalog {
        let mut catalog = InMemoryCatalog::new();
        catalog.insert_pump(
            PumpCurve::new(
                "p1",
                "ESP",
                1780.0,
                UnitSystem::Us,
                vec![
                    CurvePoint::new(0.0, 150.0).with_efficiency(0.0),
                    CurvePoint::new(500.0, 140.0).with_efficiency(0.70),
                    CurvePoint::new(1000.0, 120.0).with_efficiency(0.75),
                ],
            )
            .unwrap(),
        );
        catalog
    }

    #[test]
    fn bep_scales_with_speed() {
        let summary = best_efficiency(&catalog(), "p1", 0.5).unwrap();
        assert_eq!(summary.bep.flow, 500.0);
        assert_eq!(summary.bep.head, 30.0);
        let ranges = summary.ranges.unwrap();
        assert!((ranges.por.0 - 350.0).abs() < 1e-9);
        assert!((ranges.aor.1 - 600.0).abs() < 1e-9);
    }

    #[test]
    fn sample_parallel_pair() {
        let points =
            sample_effective_curve(&catalog(), "p1", Arrangement::Parallel, 2, 1.0, 5).unwrap();
        assert_eq!(points.len(), 5);
        assert_eq!(points[0].flow, 0.0);
        assert_eq!(points[4].flow, 2000.0);
        assert_eq!(points[4].head, 120.0);
    }

    #[test]
    fn unknown_pump() {
        assert!(matches!(
            best_efficiency(&catalog(), "nope", 1.0),
            Err(AppError::NotFound { .. })
        ));
    }
}

//! pp-curves: pump and system curve models.
//!
//! Provides:
//! - `CurveModel`: validated tabulated curves with piecewise-linear lookup
//! - `SystemCurve`: analytic or tabulated system resistance
//! - affinity-law speed scaling and series/parallel combination
//! - CSV ingest, best efficiency point and POR/AOR windows
//!
//! Every head-versus-flow shape implements [`HeadCurve`], the only interface
//! the operating-point solver depends on.
//!
//! # Example
//!
//! ```
//! use pp_curves::{Arrangement, CurvePoint, HeadCurve, PumpCurve, SystemCurve, effective_curve};
//! use pp_core::UnitSystem;
//!
//! let pump = PumpCurve::new(
//!     "p1",
//!     "End suction 4x3",
//!     1780.0,
//!     UnitSystem::Us,
//!     vec![
//!         CurvePoint::new(0.0, 150.0),
//!         CurvePoint::new(500.0, 140.0),
//!         CurvePoint::new(1000.0, 120.0),
//!     ],
//! )
//! .unwrap();
//!
//! let pair = effective_curve(pump.curve(), Arrangement::Parallel, 2, 1.0).unwrap();
//! assert_eq!(pair.max_flow(), 2000.0);
//!
//! let system = SystemCurve::analytic(50.0, 1e-4).unwrap();
//! assert!((system.head_at(500.0).unwrap() - 75.0).abs() < 1e-9);
//! ```

pub mod affinity;
pub mod combine;
pub mod csv_ingest;
pub mod curve;
pub mod error;
pub mod pump;
pub mod system;
pub mod traits;

// Re-exports
pub use affinity::scale_by_speed;
pub use combine::{Arrangement, effective_curve, parallel, series};
pub use csv_ingest::{
    CsvUnits, pump_curve_from_csv, read_pump_points, read_system_points, system_curve_from_csv,
};
pub use curve::{CurveModel, CurvePoint};
pub use error::{CurveError, CurveResult};
pub use pump::{
    MIN_PUMP_POINTS, OperatingRanges, OperatingRegion, PumpCurve, best_efficiency_point,
    operating_ranges,
};
pub use system::{AnalyticSystem, ExtraTerm, SystemCurve};
pub use traits::HeadCurve;

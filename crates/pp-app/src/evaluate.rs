//! Scenario evaluation.
//!
//! For every configuration of a scenario and every speed ratio it lists, the
//! effective pump curve is built and intersected with the scenario's system
//! curve. Output order is configurations in input order, then speed ratios in
//! input order, then roots by ascending flow.
//!
//! Unresolved references and invalid input abort the evaluation. An
//! incompatible combination or a missing intersection is recorded for that
//! configuration and evaluation carries on.

use crate::error::{AppError, AppResult};
use pp_core::numeric::Real;
use pp_curves::{
    Arrangement, CurveError, OperatingRanges, OperatingRegion, PumpCurve, SystemCurve,
    best_efficiency_point, effective_curve, operating_ranges, scale_by_speed,
};
use pp_project::{CurveCatalog, Project, PumpConfigurationDef, ScenarioDef};
use pp_solver::{Intersection, SolverConfig, solve_operating_points};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

/// Knobs for one evaluation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationOptions {
    pub solver: SolverConfig,
    /// Distance outside a tabulated curve's flow range that still clamps to
    /// the boundary value
    pub boundary_tolerance: Real,
    /// Evaluate configurations (and scenarios in a batch) on the rayon pool
    pub parallel: bool,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            boundary_tolerance: 0.0,
            parallel: true,
        }
    }
}

/// One resolved pump/system intersection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingPoint {
    pub configuration_label: String,
    pub speed_ratio: Real,
    pub flow: Real,
    pub head: Real,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<Real>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<Real>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npshr: Option<Real>,
    /// Per-pump flow relative to the BEP windows of the speed-scaled pump
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<OperatingRegion>,
}

/// Outcome of one (configuration, speed ratio) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConfigurationStatus {
    Ok,
    NoIntersection,
    IncompatibleCombination { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationDiagnostic {
    pub configuration_index: usize,
    pub configuration_label: String,
    pub speed_ratio: Real,
    pub point_count: usize,
    #[serde(flatten)]
    pub status: ConfigurationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario_id: String,
    pub name: String,
    /// RFC 3339 timestamp
    pub computed_at: String,
    pub operating_points: Vec<OperatingPoint>,
    pub diagnostics: Vec<ConfigurationDiagnostic>,
}

impl ScenarioReport {
    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Diagnostics that did not produce a point.
    pub fn failures(&self) -> impl Iterator<Item = &ConfigurationDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.status != ConfigurationStatus::Ok)
    }
}

/// A single (configuration, speed ratio) evaluation.
struct Job<'a> {
    index: usize,
    config: &'a PumpConfigurationDef,
    pump: &'a PumpCurve,
    label: String,
    speed_ratio: Real,
}

/// Evaluate one scenario against curves from `catalog`.
///
/// # Errors
/// `NotFound` for an unresolved system or pump reference, `Validation` for a
/// scenario without configurations or with a bad speed ratio, `InvalidCurve`
/// for a bad boundary tolerance and `Solver` for an invalid solver config.
pub fn evaluate_scenario(
    scenario: &ScenarioDef,
    catalog: &dyn CurveCatalog,
    options: &EvaluationOptions,
) -> AppResult<ScenarioReport> {
    let span = info_span!("evaluate_scenario", scenario = %scenario.id);
    let _guard = span.enter();

    options.solver.validate()?;
    if scenario.configurations.is_empty() {
        return Err(AppError::Validation(format!(
            "scenario '{}' has no pump configurations",
            scenario.id
        )));
    }

    let system = catalog
        .get_system_curve(&scenario.system_curve)?
        .clone()
        .with_tolerance(options.boundary_tolerance)?;

    // Resolve every reference before any solving starts.
    let mut jobs = Vec::new();
    for (index, config) in scenario.configurations.iter().enumerate() {
        let pump = catalog.get_pump_curve(&config.pump)?;
        if config.speed_ratios.is_empty() {
            return Err(AppError::Validation(format!(
                "scenario '{}' configuration {index} lists no speed ratios",
                scenario.id
            )));
        }
        let label = config.label_or(pump.name());
        for &speed_ratio in &config.speed_ratios {
            if !(speed_ratio.is_finite() && speed_ratio > 0.0) {
                return Err(AppError::Validation(format!(
                    "scenario '{}' configuration {index} has speed ratio {speed_ratio}",
                    scenario.id
                )));
            }
            jobs.push(Job {
                index,
                config,
                pump,
                label: label.clone(),
                speed_ratio,
            });
        }
    }

    let run = |job: &Job<'_>| run_job(job, &system, scenario, options);
    let outcomes: Vec<(Vec<OperatingPoint>, ConfigurationDiagnostic)> = if options.parallel {
        jobs.par_iter().map(run).collect::<AppResult<_>>()?
    } else {
        jobs.iter().map(run).collect::<AppResult<_>>()?
    };

    let mut operating_points = Vec::new();
    let mut diagnostics = Vec::with_capacity(outcomes.len());
    for (points, diagnostic) in outcomes {
        operating_points.extend(points);
        diagnostics.push(diagnostic);
    }

    info!(
        points = operating_points.len(),
        evaluations = diagnostics.len(),
        "scenario evaluated"
    );

    Ok(ScenarioReport {
        scenario_id: scenario.id.clone(),
        name: scenario.name.clone(),
        computed_at: chrono::Utc::now().to_rfc3339(),
        operating_points,
        diagnostics,
    })
}

/// Evaluate every scenario of `project`, preserving scenario order.
pub fn evaluate_project(
    project: &Project,
    catalog: &dyn CurveCatalog,
    options: &EvaluationOptions,
) -> AppResult<Vec<ScenarioReport>> {
    let eval = |s: &ScenarioDef| evaluate_scenario(s, catalog, options);
    if options.parallel {
        project.scenarios.par_iter().map(eval).collect()
    } else {
        project.scenarios.iter().map(eval).collect()
    }
}

fn run_job(
    job: &Job<'_>,
    system: &SystemCurve,
    scenario: &ScenarioDef,
    options: &EvaluationOptions,
) -> AppResult<(Vec<OperatingPoint>, ConfigurationDiagnostic)> {
    let diagnostic = |status: ConfigurationStatus, point_count: usize| ConfigurationDiagnostic {
        configuration_index: job.index,
        configuration_label: job.label.clone(),
        speed_ratio: job.speed_ratio,
        point_count,
        status,
    };

    let composite = match effective_curve(
        job.pump.curve(),
        job.config.arrangement,
        job.config.count,
        job.speed_ratio,
    ) {
        Ok(curve) => curve.with_tolerance(options.boundary_tolerance)?,
        Err(CurveError::IncompatibleCombination { what }) => {
            warn!(
                label = %job.label,
                ratio = job.speed_ratio,
                reason = %what,
                "incompatible combination"
            );
            return Ok((
                Vec::new(),
                diagnostic(ConfigurationStatus::IncompatibleCombination { reason: what }, 0),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    let roots = match solve_operating_points(&composite, system, &options.solver) {
        Ok(roots) => roots,
        Err(e) if e.is_out_of_range() => {
            debug!(label = %job.label, error = %e, "curve query left its domain");
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };

    if roots.is_empty() {
        warn!(
            label = %job.label,
            ratio = job.speed_ratio,
            shutoff = composite.points()[0].head,
            static_head = system.shutoff_head(),
            "no intersection"
        );
        return Ok((Vec::new(), diagnostic(ConfigurationStatus::NoIntersection, 0)));
    }

    let ranges = bep_ranges(job, scenario);
    let per_pump = |flow: Real| match job.config.arrangement {
        Arrangement::Parallel => flow / Real::from(job.config.count),
        Arrangement::Series => flow,
    };
    let point_label = format!("{} @{:.2}", job.label, job.speed_ratio);
    let points: Vec<OperatingPoint> = roots
        .iter()
        .map(|root: &Intersection| OperatingPoint {
            configuration_label: point_label.clone(),
            speed_ratio: job.speed_ratio,
            flow: root.flow,
            head: root.head,
            efficiency: root.efficiency,
            power: root.power,
            npshr: root.npshr,
            region: ranges.map(|r| r.classify(per_pump(root.flow))),
        })
        .collect();

    debug!(label = %point_label, points = points.len(), "configuration solved");
    let count = points.len();
    Ok((points, diagnostic(ConfigurationStatus::Ok, count)))
}

/// POR/AOR windows around the BEP of the pump at this job's speed.
fn bep_ranges(job: &Job<'_>, scenario: &ScenarioDef) -> Option<OperatingRanges> {
    let scaled = scale_by_speed(job.pump.curve(), job.speed_ratio).ok()?;
    let bep = best_efficiency_point(&scaled);
    operating_ranges(bep.flow, scenario.por, scenario.aor).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pp_core::UnitSystem;
    use pp_curves::CurvePoint;
    use pp_project::{DEFAULT_AOR, DEFAULT_POR, InMemoryCatalog};

    fn catalog(static_head: Real) -> InMemoryCatalog {
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
                    CurvePoint::new(1200.0, 100.0).with_efficiency(0.65),
                ],
            )
            .unwrap(),
        );
        catalog.insert_system("sys", SystemCurve::analytic(static_head, 1e-4).unwrap());
        catalog
    }

    fn config(count: u32, arrangement: Arrangement, ratios: Vec<Real>) -> PumpConfigurationDef {
        PumpConfigurationDef {
            pump: "p1".to_string(),
            label: None,
            arrangement,
            count,
            speed_ratios: ratios,
        }
    }

    fn scenario(configurations: Vec<PumpConfigurationDef>) -> ScenarioDef {
        ScenarioDef {
            id: "s1".to_string(),
            name: "Duty".to_string(),
            system_curve: "sys".to_string(),
            configurations,
            por: DEFAULT_POR,
            aor: DEFAULT_AOR,
        }
    }

    #[test]
    fn single_pump_has_one_point() {
        let report = evaluate_scenario(
            &scenario(vec![config(1, Arrangement::Parallel, vec![1.0])]),
            &catalog(50.0),
            &EvaluationOptions::default(),
        )
        .unwrap();
        assert_eq!(report.operating_points.len(), 1);
        let op = &report.operating_points[0];
        assert_eq!(op.configuration_label, "ESP x1 parallel @1.00");
        assert!(op.flow > 500.0 && op.flow < 1000.0);
        // BEP at 1000: POR is 700..1200
        assert_eq!(op.region, Some(OperatingRegion::Preferred));
        assert_eq!(report.diagnostics[0].status, ConfigurationStatus::Ok);
        assert_eq!(report.diagnostics[0].point_count, 1);
    }

    #[test]
    fn order_follows_configurations_then_ratios() {
        let s = scenario(vec![
            config(2, Arrangement::Parallel, vec![1.0, 0.8]),
            config(1, Arrangement::Parallel, vec![0.9]),
        ]);
        for parallel in [true, false] {
            let options = EvaluationOptions {
                parallel,
                ..EvaluationOptions::default()
            };
            let report = evaluate_scenario(&s, &catalog(50.0), &options).unwrap();
            let keys: Vec<_> = report
                .diagnostics
                .iter()
                .map(|d| (d.configuration_index, d.speed_ratio))
                .collect();
            assert_eq!(keys, vec![(0, 1.0), (0, 0.8), (1, 0.9)]);
            let ratios: Vec<_> = report.operating_points.iter().map(|p| p.speed_ratio).collect();
            assert_eq!(ratios, vec![1.0, 0.8, 0.9]);
        }
    }

    #[test]
    fn zero_count_is_recorded_not_fatal() {
        let report = evaluate_scenario(
            &scenario(vec![
                config(0, Arrangement::Parallel, vec![1.0]),
                config(1, Arrangement::Parallel, vec![1.0]),
            ]),
            &catalog(50.0),
            &EvaluationOptions::default(),
        )
        .unwrap();
        assert!(matches!(
            report.diagnostics[0].status,
            ConfigurationStatus::IncompatibleCombination { .. }
        ));
        assert_eq!(report.diagnostics[1].status, ConfigurationStatus::Ok);
        assert_eq!(report.operating_points.len(), 1);
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn static_head_above_shutoff_is_no_intersection() {
        let report = evaluate_scenario(
            &scenario(vec![
                config(1, Arrangement::Parallel, vec![1.0]),
                config(3, Arrangement::Parallel, vec![0.9]),
            ]),
            &catalog(180.0),
            &EvaluationOptions::default(),
        )
        .unwrap();
        assert!(report.operating_points.is_empty());
        assert!(
            report
                .diagnostics
                .iter()
                .all(|d| d.status == ConfigurationStatus::NoIntersection)
        );
    }

    #[test]
    fn series_pair_region_uses_single_pump_flow() {
        let report = evaluate_scenario(
            &scenario(vec![config(2, Arrangement::Series, vec![1.0])]),
            &catalog(180.0),
            &EvaluationOptions::default(),
        )
        .unwrap();
        assert_eq!(report.operating_points.len(), 1);
        let op = &report.operating_points[0];
        assert!(op.head > 180.0);
        assert!(op.region.is_some());
    }

    #[test]
    fn unknown_pump_aborts() {
        let mut c = config(1, Arrangement::Parallel, vec![1.0]);
        c.pump = "ghost".to_string();
        let err = evaluate_scenario(
            &scenario(vec![config(1, Arrangement::Parallel, vec![1.0]), c]),
            &catalog(50.0),
            &EvaluationOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound { kind: "pump", .. }));
    }

    #[test]
    fn unknown_system_aborts() {
        let mut s = scenario(vec![config(1, Arrangement::Parallel, vec![1.0])]);
        s.system_curve = "nowhere".to_string();
        let err = evaluate_scenario(&s, &catalog(50.0), &EvaluationOptions::default()).unwrap_err();
        assert!(matches!(err, AppError::NotFound { kind: "system curve", .. }));
    }

    #[test]
    fn bad_speed_ratio_aborts() {
        let err = evaluate_scenario(
            &scenario(vec![config(1, Arrangement::Parallel, vec![1.0, -0.5])]),
            &catalog(50.0),
            &EvaluationOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn report_serializes_status_inline() {
        let report = evaluate_scenario(
            &scenario(vec![config(0, Arrangement::Series, vec![1.0])]),
            &catalog(50.0),
            &EvaluationOptions::default(),
        )
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        let diag = &json["diagnostics"][0];
        assert_eq!(diag["status"], "incompatible_combination");
        assert!(diag["reason"].as_str().unwrap().contains("count"));
        assert!(chrono::DateTime::parse_from_rfc3339(json["computed_at"].as_str().unwrap()).is_ok());
    }
}

//! Pump/system intersection search.
//!
//! `diff(q) = pump_head(q) - system_head(q)` is scanned on a grid covering the
//! flows both curves accept. Every grid node where `diff` is exactly zero is a
//! root, and every adjacent pair with opposite signs is refined by bisection.
//! All roots are returned in ascending flow order; an empty result means the
//! curves do not intersect.

use crate::bisection::bisect;
use crate::config::SolverConfig;
use crate::error::{SolverError, SolverResult};
use crate::grid::scan_grid;
use pp_core::numeric::{Real, nearly_equal, sign};
use pp_curves::{CurveModel, HeadCurve};
use tracing::{debug, warn};

/// A flow at which pump head and system head agree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub flow: Real,
    /// Pump head at `flow`
    pub head: Real,
    /// System head at `flow`; equals `head` to within the solve tolerance
    pub system_head: Real,
    pub efficiency: Option<Real>,
    pub power: Option<Real>,
    pub npshr: Option<Real>,
    pub iterations: usize,
    pub converged: bool,
}

/// Raw root location before pump-side properties are read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowRoot {
    pub flow: Real,
    pub iterations: usize,
    pub converged: bool,
}

/// Flow range accepted by both curves, or `None` if they are disjoint.
pub fn common_domain(pump: &dyn HeadCurve, system: &dyn HeadCurve) -> Option<(Real, Real)> {
    let (pl, ph) = pump.accepted_domain();
    let (sl, sh) = system.accepted_domain();
    let (lo, hi) = (pl.max(sl), ph.min(sh));
    (lo <= hi).then_some((lo, hi))
}

/// Every flow where `pump` and `system` heads are equal, ascending.
///
/// # Errors
/// Invalid configuration, an unbounded common domain (two analytic curves),
/// or a curve error raised while evaluating heads.
pub fn find_roots(
    pump: &dyn HeadCurve,
    system: &dyn HeadCurve,
    config: &SolverConfig,
) -> SolverResult<Vec<FlowRoot>> {
    config.validate()?;

    let Some((lo, hi)) = common_domain(pump, system) else {
        debug!("pump and system flow domains are disjoint");
        return Ok(Vec::new());
    };
    if !hi.is_finite() {
        return Err(SolverError::UnboundedDomain { lo, hi });
    }

    let mut breakpoints = pump.breakpoints();
    breakpoints.extend(system.breakpoints());
    let grid = scan_grid(lo, hi, &breakpoints, config.subdivisions);

    let diff = |q: Real| -> SolverResult<Real> { Ok(pump.head_at(q)? - system.head_at(q)?) };
    let diffs = grid
        .iter()
        .map(|&q| diff(q))
        .collect::<SolverResult<Vec<_>>>()?;

    let mut roots: Vec<FlowRoot> = Vec::new();
    for i in 0..grid.len() {
        if diffs[i] == 0.0 {
            push_distinct(
                &mut roots,
                FlowRoot {
                    flow: grid[i],
                    iterations: 0,
                    converged: true,
                },
                config,
            );
        }
        if i + 1 < grid.len() && sign(diffs[i]) * sign(diffs[i + 1]) < 0 {
            let root = bisect(diff, grid[i], grid[i + 1], diffs[i], diffs[i + 1], config)?;
            if !root.converged {
                warn!(
                    lo = grid[i],
                    hi = grid[i + 1],
                    iterations = root.iterations,
                    "bracket refinement hit the iteration cap"
                );
            }
            debug!(
                lo = grid[i],
                hi = grid[i + 1],
                flow = root.x,
                iterations = root.iterations,
                "refined bracket"
            );
            push_distinct(
                &mut roots,
                FlowRoot {
                    flow: root.x,
                    iterations: root.iterations,
                    converged: root.converged,
                },
                config,
            );
        }
    }

    Ok(roots)
}

/// Roots are produced in ascending order; drop one that lands on the previous.
fn push_distinct(roots: &mut Vec<FlowRoot>, root: FlowRoot, config: &SolverConfig) {
    if let Some(last) = roots.last() {
        if nearly_equal(root.flow, last.flow, config.tolerances()) {
            return;
        }
    }
    roots.push(root);
}

/// Operating points of a composite pump curve against a system curve.
///
/// Efficiency, power and NPSHr come from the composite pump curve at each
/// root and are `None` wherever the composite does not carry them.
pub fn solve_operating_points(
    pump: &CurveModel,
    system: &dyn HeadCurve,
    config: &SolverConfig,
) -> SolverResult<Vec<Intersection>> {
    let roots = find_roots(pump, system, config)?;
    roots
        .into_iter()
        .map(|r| {
            let p = pump.point_at(r.flow)?;
            Ok(Intersection {
                flow: r.flow,
                head: p.head,
                system_head: system.head_at(r.flow)?,
                efficiency: p.efficiency,
                power: p.power,
                npshr: p.npshr,
                iterations: r.iterations,
                converged: r.converged,
            })
        })
        .collect()
}

//! Series and parallel combination of pump curves.
//!
//! ## Series
//!
//! Every pump passes the same flow, so heads add at equal flow. Operands are
//! resampled on the union of their flow breakpoints, clipped to the flow range
//! they share.
//!
//! ## Parallel
//!
//! Every pump sees the same head, so flows add at equal head. Operands are
//! resampled on the union of their head breakpoints inside the shared head
//! range. A curve that rises before it falls reaches some heads more than
//! once; every crossing is kept and crossings are paired across operands by
//! their rank in flow. Where operands reach a head a different number of
//! times, only the highest-flow crossings are paired. The summed
//! `(flow, head)` pairs are then sorted by flow.
//!
//! ## Identical operands
//!
//! `count` copies of one curve are combined sample by sample: each sample's
//! head (series) or flow (parallel) is multiplied by `count`, so every sample
//! of the base curve, shut-off included, survives.
//!
//! ## Derived columns
//!
//! - efficiency: hydraulic-power weighted (`sum(w) / sum(w / eta)`, with
//!   `w` = head in series and flow in parallel)
//! - power: sum over operands
//! - NPSHr: first stage in series, largest requirement in parallel
//!
//! A derived column is absent at a sample whenever any operand lacks it there.

use crate::affinity::scale_by_speed;
use crate::curve::{CurveModel, CurvePoint};
use crate::error::{CurveError, CurveResult};
use pp_core::numeric::Real;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How identical pumps in one configuration are connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arrangement {
    #[default]
    Parallel,
    Series,
}

impl fmt::Display for Arrangement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arrangement::Parallel => write!(f, "parallel"),
            Arrangement::Series => write!(f, "series"),
        }
    }
}

/// Effective curve of `count` identical pumps running at `speed_ratio`.
///
/// # Errors
/// `IncompatibleCombination` when `count == 0` or the operands share no
/// domain; `InvalidArg` for a non-positive speed ratio.
pub fn effective_curve(
    base: &CurveModel,
    arrangement: Arrangement,
    count: u32,
    speed_ratio: Real,
) -> CurveResult<CurveModel> {
    if count == 0 {
        return Err(CurveError::incompatible("pump count must be at least 1"));
    }
    let scaled = scale_by_speed(base, speed_ratio)?;
    if count == 1 {
        return Ok(scaled);
    }
    let operands = vec![&scaled; count as usize];
    match arrangement {
        Arrangement::Series => series(&operands),
        Arrangement::Parallel => parallel(&operands),
    }
}

/// Heads add at equal flow.
pub fn series(operands: &[&CurveModel]) -> CurveResult<CurveModel> {
    let first = *operands.first().ok_or_else(|| {
        CurveError::incompatible("series combination needs at least one curve")
    })?;
    if all_same(operands, first) {
        return replicate(first, Arrangement::Series, operands.len());
    }

    let lo = operands
        .iter()
        .map(|c| c.min_flow())
        .fold(Real::NEG_INFINITY, Real::max);
    let hi = operands
        .iter()
        .map(|c| c.max_flow())
        .fold(Real::INFINITY, Real::min);
    if lo >= hi {
        return Err(CurveError::incompatible(format!(
            "series operands share no flow range (common [{lo}, {hi}])"
        )));
    }

    let breakpoints = operands
        .iter()
        .flat_map(|c| c.points().iter().map(|p| p.flow));
    let grid = merged_grid(breakpoints, lo, hi);

    let mut points = Vec::with_capacity(grid.len());
    for q in grid {
        let samples = operands
            .iter()
            .map(|c| c.point_at(q))
            .collect::<CurveResult<Vec<_>>>()?;
        let head: Real = samples.iter().map(|s| s.head).sum();
        points.push(CurvePoint {
            flow: q,
            head,
            efficiency: weighted_efficiency(samples.iter().map(|s| (s.head, s.efficiency))),
            power: sum_all(samples.iter().map(|s| s.power)),
            npshr: samples[0].npshr,
        });
    }

    CurveModel::new(points)?.with_tolerance(first.tolerance())
}

/// Flows add at equal head.
pub fn parallel(operands: &[&CurveModel]) -> CurveResult<CurveModel> {
    let first = *operands.first().ok_or_else(|| {
        CurveError::incompatible("parallel combination needs at least one curve")
    })?;
    if all_same(operands, first) {
        return replicate(first, Arrangement::Parallel, operands.len());
    }

    let ranges: Vec<_> = operands.iter().map(|c| c.head_range()).collect();
    let lo = ranges.iter().map(|r| r.0).fold(Real::NEG_INFINITY, Real::max);
    let hi = ranges.iter().map(|r| r.1).fold(Real::INFINITY, Real::min);
    if lo > hi {
        return Err(CurveError::incompatible(format!(
            "parallel operands share no head range (common [{lo}, {hi}])"
        )));
    }

    let breakpoints = operands
        .iter()
        .flat_map(|c| c.points().iter().map(|p| p.head));
    let grid = merged_grid(breakpoints, lo, hi);

    let mut points = Vec::with_capacity(grid.len());
    for h in grid {
        let crossings: Vec<Vec<Real>> = operands.iter().map(|c| flows_at_head(c, h)).collect();
        let branches = crossings.iter().map(Vec::len).min().unwrap_or(0);
        if branches == 0 {
            return Err(CurveError::incompatible(format!(
                "head {h} not reached by a parallel operand"
            )));
        }
        if crossings.iter().any(|c| c.len() != branches) {
            tracing::debug!(head = h, branches, "parallel operands cross this head unevenly");
        }

        for rank in 0..branches {
            let samples = operands
                .iter()
                .zip(&crossings)
                .map(|(c, flows)| c.point_at(flows[flows.len() - branches + rank]))
                .collect::<CurveResult<Vec<_>>>()?;
            points.push(CurvePoint {
                flow: samples.iter().map(|s| s.flow).sum(),
                head: h,
                efficiency: weighted_efficiency(samples.iter().map(|s| (s.flow, s.efficiency))),
                power: sum_all(samples.iter().map(|s| s.power)),
                npshr: max_all(samples.iter().map(|s| s.npshr)),
            });
        }
    }

    points.sort_by(|a, b| a.flow.total_cmp(&b.flow));
    points.dedup_by(|later, kept| later.flow == kept.flow);
    if points.len() < 2 {
        return Err(CurveError::incompatible(
            "parallel combination collapsed to a single flow",
        ));
    }

    CurveModel::new(points)?.with_tolerance(first.tolerance() * operands.len() as Real)
}

fn all_same(operands: &[&CurveModel], first: &CurveModel) -> bool {
    operands.iter().all(|c| std::ptr::eq(*c, first) || *c == first)
}

/// `count` copies of `curve`, combined sample by sample.
fn replicate(
    curve: &CurveModel,
    arrangement: Arrangement,
    count: usize,
) -> CurveResult<CurveModel> {
    let n = count as Real;
    let points = curve
        .points()
        .iter()
        .map(|p| match arrangement {
            Arrangement::Series => CurvePoint {
                head: p.head * n,
                power: p.power.map(|w| w * n),
                ..*p
            },
            Arrangement::Parallel => CurvePoint {
                flow: p.flow * n,
                power: p.power.map(|w| w * n),
                ..*p
            },
        })
        .collect();
    let tolerance = match arrangement {
        Arrangement::Series => curve.tolerance(),
        Arrangement::Parallel => curve.tolerance() * n,
    };
    CurveModel::new(points)?.with_tolerance(tolerance)
}

/// Every flow at which `curve` delivers `head`, ascending. A flat segment at
/// `head` contributes both of its ends.
fn flows_at_head(curve: &CurveModel, head: Real) -> Vec<Real> {
    let mut flows = Vec::new();
    for w in curve.points().windows(2) {
        let (a, b) = (&w[0], &w[1]);
        if head < a.head.min(b.head) || head > a.head.max(b.head) {
            continue;
        }
        if a.head == b.head {
            flows.push(a.flow);
            flows.push(b.flow);
        } else if head == a.head {
            flows.push(a.flow);
        } else if head == b.head {
            flows.push(b.flow);
        } else {
            flows.push(a.flow + (head - a.head) / (b.head - a.head) * (b.flow - a.flow));
        }
    }
    flows.sort_by(|a, b| a.total_cmp(b));
    flows.dedup();
    flows
}

/// Sorted, de-duplicated values in `[lo, hi]`, always including both ends.
fn merged_grid(values: impl Iterator<Item = Real>, lo: Real, hi: Real) -> Vec<Real> {
    let mut grid: Vec<Real> = values.filter(|v| *v > lo && *v < hi).collect();
    grid.push(lo);
    grid.push(hi);
    grid.sort_by(|a, b| a.total_cmp(b));
    grid.dedup();
    grid
}

/// `sum(w) / sum(w / eta)` over the terms with positive weight.
fn weighted_efficiency(terms: impl Iterator<Item = (Real, Option<Real>)>) -> Option<Real> {
    let terms: Vec<(Real, Real)> = terms
        .map(|(w, eta)| eta.map(|e| (w, e)))
        .collect::<Option<_>>()?;

    let total_weight: Real = terms.iter().map(|(w, _)| w).sum();
    if total_weight <= 0.0 {
        let n = terms.len() as Real;
        return Some(terms.iter().map(|(_, e)| e).sum::<Real>() / n);
    }
    if terms.iter().any(|&(w, e)| w > 0.0 && e <= 0.0) {
        return Some(0.0);
    }
    let shaft: Real = terms
        .iter()
        .filter(|(w, _)| *w > 0.0)
        .map(|(w, e)| w / e)
        .sum();
    Some((total_weight / shaft).min(1.0))
}

fn sum_all(values: impl Iterator<Item = Option<Real>>) -> Option<Real> {
    values.sum()
}

fn max_all(values: impl Iterator<Item = Option<Real>>) -> Option<Real> {
    values
        .collect::<Option<Vec<_>>>()?
        .into_iter()
        .reduce(Real::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_curve() -> CurveModel {
        CurveModel::new(vec![
            CurvePoint::new(0.0, 40.0).with_efficiency(0.0).with_power(1000.0),
            CurvePoint::new(0.01, 30.0).with_efficiency(0.75).with_power(1200.0),
            CurvePoint::new(0.02, 20.0).with_efficiency(0.70).with_power(1500.0),
        ])
        .unwrap()
    }

    fn line(q0: Real, h0: Real, q1: Real, h1: Real) -> CurveModel {
        CurveModel::new(vec![CurvePoint::new(q0, h0), CurvePoint::new(q1, h1)]).unwrap()
    }

    #[test]
    fn series_doubles_head_at_grid_flows() {
        let c = sample_curve();
        let s = effective_curve(&c, Arrangement::Series, 2, 1.0).unwrap();
        for (a, b) in c.points().iter().zip(s.points()) {
            assert_eq!(b.flow, a.flow);
            assert_eq!(b.head, 2.0 * a.head);
            assert_eq!(b.power, a.power.map(|p| 2.0 * p));
        }
        let eta = s.efficiency_at(0.01).unwrap().unwrap();
        assert!((eta - 0.75).abs() < 1e-12);
    }

    #[test]
    fn parallel_doubles_flow_at_grid_heads() {
        let c = sample_curve();
        let p = effective_curve(&c, Arrangement::Parallel, 2, 1.0).unwrap();
        assert_eq!(p.len(), 3);
        for a in c.points() {
            let b = p.points().iter().find(|b| b.head == a.head).unwrap();
            assert_eq!(b.flow, 2.0 * a.flow);
        }
        assert!((p.max_flow() - 0.04).abs() < 1e-15);
        assert_eq!(p.head_at(0.04).unwrap(), 20.0);
    }

    #[test]
    fn parallel_of_two_matches_single_head_at_double_flow() {
        let c = sample_curve();
        let p = parallel(&[&c, &c]).unwrap();
        let expected = c.head_at(c.max_flow()).unwrap();
        assert_eq!(p.head_at(2.0 * c.max_flow()).unwrap(), expected);
    }

    #[test]
    fn series_increases_head() {
        let c = sample_curve();
        let s = series(&[&c, &c]).unwrap();
        assert!(s.head_at(0.01).unwrap() > 30.0);
    }

    #[test]
    fn single_pump_is_just_scaled() {
        let c = sample_curve();
        assert_eq!(effective_curve(&c, Arrangement::Parallel, 1, 1.0).unwrap(), c);
        assert_eq!(effective_curve(&c, Arrangement::Series, 1, 1.0).unwrap(), c);
    }

    #[test]
    fn zero_count_is_incompatible() {
        let c = sample_curve();
        for arrangement in [Arrangement::Parallel, Arrangement::Series] {
            assert!(matches!(
                effective_curve(&c, arrangement, 0, 1.0),
                Err(CurveError::IncompatibleCombination { .. })
            ));
        }
    }

    #[test]
    fn disjoint_flow_ranges_are_incompatible() {
        let a = line(0.0, 10.0, 1.0, 5.0);
        let b = line(2.0, 10.0, 3.0, 5.0);
        assert!(matches!(
            series(&[&a, &b]),
            Err(CurveError::IncompatibleCombination { .. })
        ));
    }

    #[test]
    fn disjoint_head_ranges_are_incompatible() {
        let a = line(0.0, 10.0, 1.0, 5.0);
        let b = line(0.0, 40.0, 1.0, 20.0);
        assert!(matches!(
            parallel(&[&a, &b]),
            Err(CurveError::IncompatibleCombination { .. })
        ));
    }

    #[test]
    fn series_of_different_pumps_clips_to_shared_flows() {
        let a = CurveModel::new(vec![
            CurvePoint::new(0.0, 50.0),
            CurvePoint::new(10.0, 40.0),
            CurvePoint::new(20.0, 20.0),
        ])
        .unwrap();
        let b = CurveModel::new(vec![
            CurvePoint::new(5.0, 30.0),
            CurvePoint::new(15.0, 20.0),
            CurvePoint::new(25.0, 5.0),
        ])
        .unwrap();
        let s = series(&[&a, &b]).unwrap();
        assert_eq!(s.min_flow(), 5.0);
        assert_eq!(s.max_flow(), 20.0);
        let flows: Vec<_> = s.points().iter().map(|p| p.flow).collect();
        assert_eq!(flows, vec![5.0, 10.0, 15.0, 20.0]);
        // 45 + 30 at q=5
        assert_eq!(s.head_at(5.0).unwrap(), 75.0);
    }

    #[test]
    fn missing_power_drops_composite_power() {
        let a = CurveModel::new(vec![
            CurvePoint::new(0.0, 40.0).with_power(10.0),
            CurvePoint::new(1.0, 30.0),
            CurvePoint::new(2.0, 20.0).with_power(14.0),
        ])
        .unwrap();
        let s = series(&[&a, &a]).unwrap();
        assert_eq!(s.points()[0].power, Some(20.0));
        assert_eq!(s.points()[1].power, None);
    }

    fn humped() -> CurveModel {
        CurveModel::new(vec![
            CurvePoint::new(0.0, 100.0),
            CurvePoint::new(200.0, 120.0),
            CurvePoint::new(600.0, 110.0),
            CurvePoint::new(1000.0, 60.0),
        ])
        .unwrap()
    }

    #[test]
    fn humped_curve_in_parallel_keeps_every_sample() {
        let c = humped();
        let p = effective_curve(&c, Arrangement::Parallel, 2, 1.0).unwrap();
        assert_eq!(p.points()[0].flow, 0.0);
        assert_eq!(p.points()[0].head, 100.0);
        assert_eq!(p.len(), c.len());
        for (a, b) in c.points().iter().zip(p.points()) {
            assert_eq!(b.flow, 2.0 * a.flow);
            assert_eq!(b.head, a.head);
        }
    }

    #[test]
    fn flat_shutoff_in_parallel_starts_at_zero_flow() {
        let c = CurveModel::new(vec![
            CurvePoint::new(0.0, 100.0),
            CurvePoint::new(10.0, 100.0),
            CurvePoint::new(20.0, 80.0),
        ])
        .unwrap();
        let p = effective_curve(&c, Arrangement::Parallel, 2, 1.0).unwrap();
        let flows: Vec<_> = p.points().iter().map(|pt| pt.flow).collect();
        assert_eq!(flows, vec![0.0, 20.0, 40.0]);
        assert_eq!(p.head_at(10.0).unwrap(), 100.0);
    }

    #[test]
    fn different_operands_keep_the_rising_branch() {
        // same heads at twice the flow; the pair behaves like three of `a`
        let a = humped();
        let b = CurveModel::new(
            a.points()
                .iter()
                .map(|pt| CurvePoint::new(2.0 * pt.flow, pt.head))
                .collect(),
        )
        .unwrap();
        let p = parallel(&[&a, &b]).unwrap();
        assert_eq!(p.min_flow(), 0.0);
        assert_eq!(p.head_at(0.0).unwrap(), 100.0);
        for pt in a.points() {
            assert!((p.head_at(3.0 * pt.flow).unwrap() - pt.head).abs() < 1e-9);
        }
        // head 110 is reached on both sides of the hump
        let at_110: Vec<_> = p
            .points()
            .iter()
            .filter(|pt| pt.head == 110.0)
            .map(|pt| pt.flow)
            .collect();
        assert_eq!(at_110, vec![300.0, 1800.0]);
    }

    #[test]
    fn uneven_crossings_pair_the_high_flow_branches() {
        let a = humped();
        let b = line(0.0, 130.0, 1000.0, 60.0);
        let p = parallel(&[&a, &b]).unwrap();
        // at head 110 `a` crosses at 100 and 600, `b` only once
        let at_110: Vec<_> = p.points().iter().filter(|pt| pt.head == 110.0).collect();
        assert_eq!(at_110.len(), 1);
        let b_flow = 1000.0 * 20.0 / 70.0;
        assert!((at_110[0].flow - (600.0 + b_flow)).abs() < 1e-9);
    }

    fn curve_strategy() -> impl Strategy<Value = CurveModel> {
        prop::collection::vec((1.0_f64..50.0, 0.0_f64..200.0, 0.05_f64..0.9), 2..8).prop_map(
            |samples| {
                let mut flow = 0.0;
                let points = samples
                    .into_iter()
                    .map(|(step, head, eta)| {
                        let p = CurvePoint::new(flow, head).with_efficiency(eta);
                        flow += step;
                        p
                    })
                    .collect();
                CurveModel::new(points).unwrap()
            },
        )
    }

    proptest! {
        #[test]
        fn series_pair_doubles_head_at_every_sample(c in curve_strategy()) {
            let s = effective_curve(&c, Arrangement::Series, 2, 1.0).unwrap();
            prop_assert_eq!(s.len(), c.len());
            for (a, b) in c.points().iter().zip(s.points()) {
                prop_assert_eq!(b.flow, a.flow);
                prop_assert_eq!(b.head, 2.0 * a.head);
                prop_assert_eq!(b.efficiency, a.efficiency);
            }
        }

        #[test]
        fn parallel_pair_doubles_flow_at_every_sample(c in curve_strategy()) {
            let p = effective_curve(&c, Arrangement::Parallel, 2, 1.0).unwrap();
            prop_assert_eq!(p.len(), c.len());
            for (a, b) in c.points().iter().zip(p.points()) {
                prop_assert_eq!(b.flow, 2.0 * a.flow);
                prop_assert_eq!(b.head, a.head);
            }
        }

        #[test]
        fn parallel_of_different_operands_covers_every_sample(c in curve_strategy()) {
            let wide = CurveModel::new(
                c.points()
                    .iter()
                    .map(|pt| CurvePoint::new(2.0 * pt.flow, pt.head))
                    .collect(),
            )
            .unwrap();
            let p = parallel(&[&c, &wide]).unwrap();
            for pt in c.points() {
                let q = pt.flow + 2.0 * pt.flow;
                prop_assert!((p.head_at(q).unwrap() - pt.head).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn arrangement_display_and_serde() {
        assert_eq!(Arrangement::Series.to_string(), "series");
        assert_eq!(Arrangement::default(), Arrangement::Parallel);
    }
}

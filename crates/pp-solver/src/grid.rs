//! Scan grid construction.

use pp_core::numeric::Real;

/// Merged breakpoints inside `[lo, hi]`, both ends included, each interval
/// split into `subdivisions` equal steps.
///
/// Every native breakpoint of either curve is a grid node, so a sign change
/// between adjacent samples of either curve is always seen by the scan.
pub fn scan_grid(lo: Real, hi: Real, breakpoints: &[Real], subdivisions: usize) -> Vec<Real> {
    let mut nodes: Vec<Real> = breakpoints
        .iter()
        .copied()
        .filter(|q| *q > lo && *q < hi)
        .collect();
    nodes.push(lo);
    nodes.push(hi);
    nodes.sort_by(|a, b| a.total_cmp(b));
    nodes.dedup();

    if subdivisions <= 1 || nodes.len() < 2 {
        return nodes;
    }

    let mut grid = Vec::with_capacity((nodes.len() - 1) * subdivisions + 1);
    for w in nodes.windows(2) {
        let (a, b) = (w[0], w[1]);
        let step = (b - a) / subdivisions as Real;
        grid.push(a);
        for k in 1..subdivisions {
            grid.push(a + step * k as Real);
        }
    }
    grid.push(nodes[nodes.len() - 1]);
    grid
}

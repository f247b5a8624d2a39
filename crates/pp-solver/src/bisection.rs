//! Bracketed root refinement.

use crate::config::SolverConfig;
use crate::error::SolverResult;
use pp_core::numeric::{Real, sign};

/// A refined root of a scalar function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Root {
    pub x: Real,
    pub iterations: usize,
    pub converged: bool,
}

/// Refine a root of `f` inside `[a, b]`, where `fa` and `fb` have opposite
/// signs, until the bracket half-width is within `config.flow_tolerance`.
///
/// The final estimate is the secant point of the last bracket. Hitting the
/// iteration cap still returns that estimate, flagged `converged: false`.
pub fn bisect<F>(
    f: F,
    mut a: Real,
    mut b: Real,
    mut fa: Real,
    mut fb: Real,
    config: &SolverConfig,
) -> SolverResult<Root>
where
    F: Fn(Real) -> SolverResult<Real>,
{
    debug_assert!(sign(fa) * sign(fb) < 0, "bracket must straddle the root");

    for iter in 1..=config.max_iterations {
        let mid = 0.5 * (a + b);
        let fm = f(mid)?;

        if fm == 0.0 {
            return Ok(Root {
                x: mid,
                iterations: iter,
                converged: true,
            });
        }

        if sign(fm) == sign(fa) {
            a = mid;
            fa = fm;
        } else {
            b = mid;
            fb = fm;
        }

        if 0.5 * (b - a) <= config.flow_tolerance(mid) {
            return Ok(Root {
                x: secant(a, b, fa, fb),
                iterations: iter,
                converged: true,
            });
        }
    }

    Ok(Root {
        x: secant(a, b, fa, fb),
        iterations: config.max_iterations,
        converged: false,
    })
}

fn secant(a: Real, b: Real, fa: Real, fb: Real) -> Real {
    let x = a - fa * (b - a) / (fb - fa);
    if x.is_finite() {
        x.clamp(a, b)
    } else {
        0.5 * (a + b)
    }
}

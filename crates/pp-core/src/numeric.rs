use crate::PpError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

impl Tolerances {
    /// The looser of the absolute and relative bounds at magnitude `x`.
    pub fn looser_at(&self, x: Real) -> Real {
        self.abs.max(self.rel * x.abs())
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, PpError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(PpError::NonFinite { what, value: v })
    }
}

/// Finite and `>= 0`.
pub fn ensure_non_negative(v: Real, what: &'static str) -> Result<Real, PpError> {
    let v = ensure_finite(v, what)?;
    if v < 0.0 {
        return Err(PpError::Negative { what, value: v });
    }
    Ok(v)
}

/// Linear interpolation between `(x0, y0)` and `(x1, y1)`.
///
/// Returns the endpoint value exactly when `x` sits on an endpoint, and never
/// leaves `[min(y0, y1), max(y0, y1)]` for `x` inside `[x0, x1]`.
pub fn lerp(x0: Real, y0: Real, x1: Real, y1: Real, x: Real) -> Real {
    if x == x0 {
        return y0;
    }
    if x == x1 {
        return y1;
    }
    let y = y0 + (y1 - y0) * (x - x0) / (x1 - x0);
    if (x0..=x1).contains(&x) {
        y.clamp(y0.min(y1), y0.max(y1))
    } else {
        y
    }
}

/// `-1`, `0` or `1` with an exact zero (no signed-zero surprises).
pub fn sign(v: Real) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

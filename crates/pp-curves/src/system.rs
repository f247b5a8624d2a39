//! System resistance curves.
//!
//! A system curve is either analytic (static lift plus friction terms) or
//! tabulated from measured points. Both answer `head_at` through
//! [`HeadCurve`], so the solver treats them identically.

use crate::curve::{CurveModel, CurvePoint};
use crate::error::{CurveError, CurveResult};
use crate::traits::HeadCurve;
use pp_core::numeric::{Real, ensure_finite, ensure_non_negative};
use serde::{Deserialize, Serialize};

/// Additional `coefficient * flow^exponent` loss term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtraTerm {
    pub coefficient: Real,
    pub exponent: Real,
}

/// `head = static_head + k * flow^2 + sum(c_i * flow^e_i)`, valid for `flow >= 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticSystem {
    static_head: Real,
    resistance_coefficient: Real,
    extra_terms: Vec<ExtraTerm>,
}

impl AnalyticSystem {
    pub fn static_head(&self) -> Real {
        self.static_head
    }

    pub fn resistance_coefficient(&self) -> Real {
        self.resistance_coefficient
    }

    pub fn extra_terms(&self) -> &[ExtraTerm] {
        &self.extra_terms
    }

    fn evaluate(&self, flow: Real) -> Real {
        let friction = self.resistance_coefficient * flow * flow;
        let extra: Real = self
            .extra_terms
            .iter()
            .map(|t| t.coefficient * flow.powf(t.exponent))
            .sum();
        self.static_head + friction + extra
    }
}

/// A system curve in exactly one mode.
#[derive(Debug, Clone, PartialEq)]
pub enum SystemCurve {
    Analytic(AnalyticSystem),
    Tabulated(CurveModel),
}

impl SystemCurve {
    /// Build an analytic curve `static_head + k * flow^2`.
    pub fn analytic(static_head: Real, resistance_coefficient: Real) -> CurveResult<Self> {
        Self::analytic_with_terms(static_head, resistance_coefficient, Vec::new())
    }

    /// Build an analytic curve with additional power-law loss terms.
    ///
    /// # Errors
    /// `InvalidCurve` for negative or non-finite static head or coefficient,
    /// and for extra terms with a non-finite coefficient or negative exponent.
    pub fn analytic_with_terms(
        static_head: Real,
        resistance_coefficient: Real,
        extra_terms: Vec<ExtraTerm>,
    ) -> CurveResult<Self> {
        let invalid = |e: pp_core::PpError| CurveError::invalid(e.to_string());
        let static_head = ensure_non_negative(static_head, "static head").map_err(invalid)?;
        let resistance_coefficient =
            ensure_non_negative(resistance_coefficient, "resistance coefficient")
                .map_err(invalid)?;
        for term in &extra_terms {
            ensure_finite(term.coefficient, "extra term coefficient").map_err(invalid)?;
            ensure_non_negative(term.exponent, "extra term exponent").map_err(invalid)?;
        }
        Ok(SystemCurve::Analytic(AnalyticSystem {
            static_head,
            resistance_coefficient,
            extra_terms,
        }))
    }

    /// Build a tabulated curve from `(flow, head)` samples.
    pub fn tabulated(points: Vec<CurvePoint>) -> CurveResult<Self> {
        let points = points
            .into_iter()
            .map(|p| CurvePoint::new(p.flow, p.head))
            .collect();
        Ok(SystemCurve::Tabulated(CurveModel::new(points)?))
    }

    /// Set the boundary tolerance on a tabulated curve. Analytic curves have
    /// no upper bound and ignore it.
    pub fn with_tolerance(self, tolerance: Real) -> CurveResult<Self> {
        match self {
            SystemCurve::Tabulated(model) => {
                Ok(SystemCurve::Tabulated(model.with_tolerance(tolerance)?))
            }
            analytic => Ok(analytic),
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            SystemCurve::Analytic(_) => "analytic",
            SystemCurve::Tabulated(_) => "tabulated",
        }
    }

    /// Head demanded with no flow.
    pub fn shutoff_head(&self) -> Real {
        match self {
            SystemCurve::Analytic(a) => a.static_head,
            SystemCurve::Tabulated(model) => model.points()[0].head,
        }
    }
}

impl HeadCurve for SystemCurve {
    fn head_at(&self, flow: Real) -> CurveResult<Real> {
        match self {
            SystemCurve::Analytic(a) => {
                let flow = ensure_finite(flow, "query flow")?;
                if flow < 0.0 {
                    return Err(CurveError::OutOfRange {
                        flow,
                        min: 0.0,
                        max: Real::INFINITY,
                    });
                }
                Ok(a.evaluate(flow))
            }
            SystemCurve::Tabulated(model) => model.head_at(flow),
        }
    }

    fn flow_domain(&self) -> (Real, Real) {
        match self {
            SystemCurve::Analytic(_) => (0.0, Real::INFINITY),
            SystemCurve::Tabulated(model) => model.flow_domain(),
        }
    }

    fn breakpoints(&self) -> Vec<Real> {
        match self {
            SystemCurve::Analytic(_) => Vec::new(),
            SystemCurve::Tabulated(model) => model.breakpoints(),
        }
    }

    fn boundary_tolerance(&self) -> Real {
        match self {
            SystemCurve::Analytic(_) => 0.0,
            SystemCurve::Tabulated(model) => model.tolerance(),
        }
    }
}

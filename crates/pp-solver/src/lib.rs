//! pp-solver: operating-point search.
//!
//! Finds every flow at which a pump curve meets a system curve. The search
//! scans a grid built from both curves' breakpoints and refines each sign
//! change by bisection, so multiple intersections on unstable (rising) pump
//! curves are all reported. No intersection is an empty result, not an error.

pub mod bisection;
pub mod config;
pub mod error;
pub mod grid;
pub mod operating_point;

// Re-exports
pub use bisection::{Root, bisect};
pub use config::SolverConfig;
pub use error::{SolverError, SolverResult};
pub use grid::scan_grid;
pub use operating_point::{
    FlowRoot, Intersection, common_domain, find_roots, solve_operating_points,
};

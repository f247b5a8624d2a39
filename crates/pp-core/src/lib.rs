//! pp-core: stable foundation for pumppoint.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - units (unit systems + uom-backed normalization of tabulated inputs)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{PpError, PpResult};
pub use numeric::*;
pub use units::*;

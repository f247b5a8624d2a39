//! Shared application service layer for pumppoint.
//!
//! Both the CLI and any embedding caller go through this crate: it loads
//! projects, resolves curves through a catalog and evaluates scenarios into
//! serializable reports.

pub mod curve_service;
pub mod error;
pub mod evaluate;
pub mod project_service;

// Re-export key types for convenience
pub use curve_service::{BepSummary, best_efficiency, sample_effective_curve};
pub use error::{AppError, AppResult};
pub use evaluate::{
    ConfigurationDiagnostic, ConfigurationStatus, EvaluationOptions, OperatingPoint,
    ScenarioReport, evaluate_project, evaluate_scenario,
};
pub use project_service::{
    ScenarioSummary, get_scenario, list_scenarios, load_project, open_project, save_project,
    validate_project,
};

//! Error types for the pp-app service layer.

use std::path::PathBuf;

/// Errors that abort an evaluation or a service call.
///
/// Per-configuration outcomes such as a missing intersection are not errors;
/// they are reported through [`crate::ConfigurationStatus`].
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Failed to read project file: {path}")]
    ProjectFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid curve: {0}")]
    InvalidCurve(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pp-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<pp_project::ProjectError> for AppError {
    fn from(err: pp_project::ProjectError) -> Self {
        use pp_project::ProjectError;
        match err {
            ProjectError::NotFound { kind, id } => AppError::NotFound { kind, id },
            ProjectError::Curve(e) => AppError::InvalidCurve(e.to_string()),
            ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            ProjectError::Io(e) => AppError::Io(e),
            other => AppError::Project(other.to_string()),
        }
    }
}

impl From<pp_curves::CurveError> for AppError {
    fn from(err: pp_curves::CurveError) -> Self {
        AppError::InvalidCurve(err.to_string())
    }
}

impl From<pp_solver::SolverError> for AppError {
    fn from(err: pp_solver::SolverError) -> Self {
        AppError::Solver(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

//! Project loading, validation, and introspection.

use std::path::Path;

use pp_project::{InMemoryCatalog, Project, ScenarioDef};

use crate::error::{AppError, AppResult};

/// Summary of a scenario for listing.
#[derive(Debug, Clone)]
pub struct ScenarioSummary {
    pub id: String,
    pub name: String,
    pub system_curve: String,
    pub configuration_count: usize,
    /// Number of (configuration, speed ratio) evaluations the scenario requests
    pub evaluation_count: usize,
}

/// Load a YAML or JSON project file; migrated and validated.
pub fn load_project(path: &Path) -> AppResult<Project> {
    if !path.exists() {
        return Err(AppError::ProjectFileRead {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
    }
    Ok(pp_project::load_project(path)?)
}

/// Load a project and build every curve it references.
///
/// CSV paths inside the project resolve against the project file's directory.
pub fn open_project(path: &Path) -> AppResult<(Project, InMemoryCatalog)> {
    let project = load_project(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let catalog = InMemoryCatalog::from_project(&project, base_dir)?;
    Ok((project, catalog))
}

/// Save a project, choosing the format from the file extension.
pub fn save_project(path: &Path, project: &Project) -> AppResult<()> {
    Ok(pp_project::save_project(path, project)?)
}

pub fn validate_project(project: &Project) -> AppResult<()> {
    pp_project::validate_project(project).map_err(|e| AppError::Validation(e.to_string()))
}

pub fn list_scenarios(project: &Project) -> Vec<ScenarioSummary> {
    project
        .scenarios
        .iter()
        .map(|s| ScenarioSummary {
            id: s.id.clone(),
            name: s.name.clone(),
            system_curve: s.system_curve.clone(),
            configuration_count: s.configurations.len(),
            evaluation_count: s.configurations.iter().map(|c| c.speed_ratios.len()).sum(),
        })
        .collect()
}

pub fn get_scenario<'a>(project: &'a Project, scenario_id: &str) -> AppResult<&'a ScenarioDef> {
    project
        .scenarios
        .iter()
        .find(|s| s.id == scenario_id)
        .ok_or_else(|| AppError::NotFound {
            kind: "scenario",
            id: scenario_id.to_string(),
        })
}

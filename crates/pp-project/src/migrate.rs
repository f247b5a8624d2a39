//! Schema migration framework.
//!
//! Version 1 is the first project format. Each later format adds one arm to
//! `migrate_one_version` that lifts a project by a single version.

use crate::ProjectError;
use crate::schema::Project;

pub const LATEST_VERSION: u32 = 1;

pub fn migrate_to_latest(mut project: Project) -> Result<Project, ProjectError> {
    while project.version < LATEST_VERSION {
        project = migrate_one_version(project)?;
    }
    Ok(project)
}

fn migrate_one_version(project: Project) -> Result<Project, ProjectError> {
    Err(ProjectError::Migration {
        what: format!("No migration path from version {}", project.version),
    })
}

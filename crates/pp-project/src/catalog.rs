//! Curve lookup by id.
//!
//! Evaluation resolves pump and system references through [`CurveCatalog`].
//! [`InMemoryCatalog`] builds every curve of a project up front so shape
//! errors are reported before any scenario runs.

use crate::schema::{Project, PumpCurveSourceDef, PumpDef, SystemCurveDef, SystemCurveKindDef};
use crate::{ProjectError, ProjectResult};
use pp_core::UnitSystem;
use pp_curves::{PumpCurve, SystemCurve, pump_curve_from_csv, system_curve_from_csv};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Source of validated curves.
pub trait CurveCatalog: Send + Sync {
    /// # Errors
    /// `NotFound` if no pump has this id.
    fn get_pump_curve(&self, id: &str) -> ProjectResult<&PumpCurve>;

    /// # Errors
    /// `NotFound` if no system curve has this id.
    fn get_system_curve(&self, id: &str) -> ProjectResult<&SystemCurve>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    pumps: HashMap<String, PumpCurve>,
    systems: HashMap<String, SystemCurve>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every pump and system curve in `project`.
    ///
    /// Relative CSV paths are resolved against `base_dir`; CSV values are
    /// converted to the project's unit system.
    pub fn from_project(project: &Project, base_dir: &Path) -> ProjectResult<Self> {
        let mut catalog = Self::new();
        for def in &project.pumps {
            catalog.insert_pump(build_pump(def, project.unit_system, base_dir)?);
        }
        for def in &project.system_curves {
            let curve = build_system(def, project.unit_system, base_dir)?;
            catalog.insert_system(def.id.clone(), curve);
        }
        tracing::debug!(
            pumps = catalog.pumps.len(),
            system_curves = catalog.systems.len(),
            "built curve catalog"
        );
        Ok(catalog)
    }

    pub fn insert_pump(&mut self, pump: PumpCurve) {
        self.pumps.insert(pump.id().to_string(), pump);
    }

    pub fn insert_system(&mut self, id: impl Into<String>, curve: SystemCurve) {
        self.systems.insert(id.into(), curve);
    }

    pub fn pump_ids(&self) -> impl Iterator<Item = &str> {
        self.pumps.keys().map(String::as_str)
    }
}

impl CurveCatalog for InMemoryCatalog {
    fn get_pump_curve(&self, id: &str) -> ProjectResult<&PumpCurve> {
        self.pumps.get(id).ok_or_else(|| ProjectError::NotFound {
            kind: "pump",
            id: id.to_string(),
        })
    }

    fn get_system_curve(&self, id: &str) -> ProjectResult<&SystemCurve> {
        self.systems.get(id).ok_or_else(|| ProjectError::NotFound {
            kind: "system curve",
            id: id.to_string(),
        })
    }
}

fn build_pump(def: &PumpDef, units: UnitSystem, base_dir: &Path) -> ProjectResult<PumpCurve> {
    let pump = match &def.curve {
        PumpCurveSourceDef::Inline { points } => {
            PumpCurve::new(&def.id, &def.name, def.rated_speed, units, points.clone())?
        }
        PumpCurveSourceDef::Csv { path } => {
            let reader = open_csv(base_dir, path)?;
            pump_curve_from_csv(&def.id, &def.name, def.rated_speed, reader, units)?
        }
    };
    Ok(pump)
}

fn build_system(
    def: &SystemCurveDef,
    units: UnitSystem,
    base_dir: &Path,
) -> ProjectResult<SystemCurve> {
    let curve = match &def.curve {
        SystemCurveKindDef::Analytic {
            static_head,
            resistance_coefficient,
            extra_terms,
        } => SystemCurve::analytic_with_terms(
            *static_head,
            *resistance_coefficient,
            extra_terms.clone(),
        )?,
        SystemCurveKindDef::Tabulated { points } => SystemCurve::tabulated(points.clone())?,
        SystemCurveKindDef::Csv { path } => system_curve_from_csv(open_csv(base_dir, path)?, units)?,
    };
    Ok(curve)
}

fn open_csv(base_dir: &Path, path: &str) -> ProjectResult<BufReader<File>> {
    let full: PathBuf = base_dir.join(path);
    let file = File::open(&full).map_err(|e| ProjectError::CurveFile {
        path: full.display().to_string(),
        source: e,
    })?;
    Ok(BufReader::new(file))
}

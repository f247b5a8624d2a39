//! Project validation logic.
//!
//! Structural checks only: ids, references and value ranges that can be
//! judged without building curves. Curve shape problems surface when the
//! catalog is built.

use crate::schema::{
    Project, PumpConfigurationDef, PumpCurveSourceDef, PumpDef, ScenarioDef, SystemCurveDef,
    SystemCurveKindDef,
};
use std::collections::HashSet;

/// Speed ratios a VFD is normally run at. Values outside are allowed but logged.
pub const TYPICAL_SPEED_RATIO: (f64, f64) = (0.3, 1.2);

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    let mut pump_ids = HashSet::new();
    for pump in &project.pumps {
        if !pump_ids.insert(pump.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: pump.id.clone(),
                context: "pumps".to_string(),
            });
        }
        validate_pump(pump)?;
    }

    let mut system_ids = HashSet::new();
    for system in &project.system_curves {
        if !system_ids.insert(system.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: system.id.clone(),
                context: "system_curves".to_string(),
            });
        }
        validate_system_curve(system)?;
    }

    let mut scenario_ids = HashSet::new();
    for scenario in &project.scenarios {
        if !scenario_ids.insert(scenario.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: scenario.id.clone(),
                context: "scenarios".to_string(),
            });
        }
        validate_scenario(scenario, &pump_ids, &system_ids)?;
    }

    Ok(())
}

fn validate_pump(pump: &PumpDef) -> Result<(), ValidationError> {
    validate_positive_finite(&format!("pump '{}' rated_speed", pump.id), pump.rated_speed)?;
    match &pump.curve {
        PumpCurveSourceDef::Inline { points } => {
            if points.len() < pp_curves::MIN_PUMP_POINTS {
                return Err(ValidationError::InvalidValue {
                    field: format!("pump '{}' points", pump.id),
                    value: points.len().to_string(),
                    reason: format!("at least {} points required", pp_curves::MIN_PUMP_POINTS),
                });
            }
        }
        PumpCurveSourceDef::Csv { path } => validate_path(&format!("pump '{}'", pump.id), path)?,
    }
    Ok(())
}

fn validate_system_curve(system: &SystemCurveDef) -> Result<(), ValidationError> {
    let owner = format!("system curve '{}'", system.id);
    match &system.curve {
        SystemCurveKindDef::Analytic {
            static_head,
            resistance_coefficient,
            extra_terms,
        } => {
            validate_non_negative_finite(&format!("{owner} static_head"), *static_head)?;
            validate_non_negative_finite(
                &format!("{owner} resistance_coefficient"),
                *resistance_coefficient,
            )?;
            for term in extra_terms {
                validate_non_negative_finite(&format!("{owner} extra term exponent"), term.exponent)?;
                if !term.coefficient.is_finite() {
                    return Err(ValidationError::InvalidValue {
                        field: format!("{owner} extra term coefficient"),
                        value: term.coefficient.to_string(),
                        reason: "must be finite".to_string(),
                    });
                }
            }
        }
        SystemCurveKindDef::Tabulated { points } => {
            if points.len() < 2 {
                return Err(ValidationError::InvalidValue {
                    field: format!("{owner} points"),
                    value: points.len().to_string(),
                    reason: "at least 2 points required".to_string(),
                });
            }
        }
        SystemCurveKindDef::Csv { path } => validate_path(&owner, path)?,
    }
    Ok(())
}

fn validate_scenario(
    scenario: &ScenarioDef,
    pump_ids: &HashSet<&str>,
    system_ids: &HashSet<&str>,
) -> Result<(), ValidationError> {
    if !system_ids.contains(scenario.system_curve.as_str()) {
        return Err(ValidationError::MissingReference {
            id: scenario.system_curve.clone(),
            context: format!("scenario '{}' system_curve", scenario.id),
        });
    }
    if scenario.configurations.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: format!("scenario '{}' configurations", scenario.id),
            value: "0".to_string(),
            reason: "at least one configuration required".to_string(),
        });
    }
    for (index, config) in scenario.configurations.iter().enumerate() {
        validate_configuration(scenario, index, config, pump_ids)?;
    }

    validate_window(&format!("scenario '{}' por", scenario.id), scenario.por)?;
    validate_window(&format!("scenario '{}' aor", scenario.id), scenario.aor)?;
    Ok(())
}

/// `count == 0` passes; evaluation reports it for that configuration alone.
fn validate_configuration(
    scenario: &ScenarioDef,
    index: usize,
    config: &PumpConfigurationDef,
    pump_ids: &HashSet<&str>,
) -> Result<(), ValidationError> {
    if !pump_ids.contains(config.pump.as_str()) {
        return Err(ValidationError::MissingReference {
            id: config.pump.clone(),
            context: format!("scenario '{}' configuration {} pump", scenario.id, index),
        });
    }
    if config.speed_ratios.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: format!("scenario '{}' configuration {} speed_ratios", scenario.id, index),
            value: "[]".to_string(),
            reason: "at least one speed ratio required".to_string(),
        });
    }
    for &ratio in &config.speed_ratios {
        validate_positive_finite(
            &format!("scenario '{}' configuration {} speed_ratio", scenario.id, index),
            ratio,
        )?;
        let (lo, hi) = TYPICAL_SPEED_RATIO;
        if ratio < lo || ratio > hi {
            tracing::warn!(
                scenario = %scenario.id,
                configuration = index,
                ratio,
                "speed ratio outside the typical VFD range [{lo}, {hi}]"
            );
        }
    }
    Ok(())
}

fn validate_window(field: &str, (lo, hi): (f64, f64)) -> Result<(), ValidationError> {
    if !(lo.is_finite() && hi.is_finite() && lo > 0.0 && lo < hi) {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: format!("({lo}, {hi})"),
            reason: "must satisfy 0 < low < high".to_string(),
        });
    }
    Ok(())
}

fn validate_path(owner: &str, path: &str) -> Result<(), ValidationError> {
    if path.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: format!("{owner} csv path"),
            value: path.to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

fn validate_positive_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be positive and finite".to_string(),
        });
    }
    Ok(())
}

fn validate_non_negative_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be non-negative and finite".to_string(),
        });
    }
    Ok(())
}

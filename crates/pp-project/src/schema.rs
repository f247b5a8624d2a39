//! Project schema definitions.

use pp_core::UnitSystem;
use pp_curves::{Arrangement, CurvePoint, ExtraTerm};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub unit_system: UnitSystem,
    #[serde(default)]
    pub pumps: Vec<PumpDef>,
    #[serde(default)]
    pub system_curves: Vec<SystemCurveDef>,
    #[serde(default)]
    pub scenarios: Vec<ScenarioDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PumpDef {
    pub id: String,
    pub name: String,
    pub rated_speed: f64,
    pub curve: PumpCurveSourceDef,
}

/// Where a pump's samples come from. CSV paths are relative to the project file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PumpCurveSourceDef {
    Inline { points: Vec<CurvePoint> },
    Csv { path: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemCurveDef {
    pub id: String,
    pub name: String,
    pub curve: SystemCurveKindDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SystemCurveKindDef {
    Analytic {
        static_head: f64,
        resistance_coefficient: f64,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        extra_terms: Vec<ExtraTerm>,
    },
    Tabulated {
        points: Vec<CurvePoint>,
    },
    /// Tabulated points read from a `flow,head` CSV file
    Csv {
        path: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioDef {
    pub id: String,
    pub name: String,
    pub system_curve: String,
    #[serde(default)]
    pub configurations: Vec<PumpConfigurationDef>,
    /// Preferred operating region as fractions of BEP flow
    #[serde(default = "default_por")]
    pub por: (f64, f64),
    /// Allowable operating region as fractions of BEP flow
    #[serde(default = "default_aor")]
    pub aor: (f64, f64),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PumpConfigurationDef {
    pub pump: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub arrangement: Arrangement,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default = "default_speed_ratios")]
    pub speed_ratios: Vec<f64>,
}

impl PumpConfigurationDef {
    /// Configuration label, defaulting to `"{pump name} x{count} {arrangement}"`.
    pub fn label_or(&self, pump_name: &str) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => format!("{} x{} {}", pump_name, self.count, self.arrangement),
        }
    }
}

pub const DEFAULT_POR: (f64, f64) = (0.7, 1.2);
pub const DEFAULT_AOR: (f64, f64) = (0.5, 1.2);

fn default_por() -> (f64, f64) {
    DEFAULT_POR
}

fn default_aor() -> (f64, f64) {
    DEFAULT_AOR
}

fn default_count() -> u32 {
    1
}

fn default_speed_ratios() -> Vec<f64> {
    vec![1.0]
}

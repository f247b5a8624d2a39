use pp_core::UnitSystem;
use pp_curves::{Arrangement, CurvePoint, ExtraTerm};
use pp_project::schema::*;
use pp_project::{ProjectError, load_project, load_yaml, save_json, save_yaml, validate_project};

fn sample_project() -> Project {
    Project {
        version: pp_project::LATEST_VERSION,
        name: "Booster Station".to_string(),
        unit_system: UnitSystem::Us,
        pumps: vec![PumpDef {
            id: "p1".to_string(),
            name: "4x3 ESP".to_string(),
            rated_speed: 1780.0,
            curve: PumpCurveSourceDef::Inline {
                points: vec![
                    CurvePoint::new(0.0, 150.0).with_efficiency(0.55),
                    CurvePoint::new(500.0, 140.0).with_efficiency(0.70),
                    CurvePoint::new(1000.0, 120.0)
                        .with_efficiency(0.75)
                        .with_power(160.0),
                ],
            },
        }],
        system_curves: vec![
            SystemCurveDef {
                id: "header".to_string(),
                name: "Main header".to_string(),
                curve: SystemCurveKindDef::Analytic {
                    static_head: 50.0,
                    resistance_coefficient: 1e-4,
                    extra_terms: vec![ExtraTerm {
                        coefficient: 0.01,
                        exponent: 1.0,
                    }],
                },
            },
            SystemCurveDef {
                id: "measured".to_string(),
                name: "Field test".to_string(),
                curve: SystemCurveKindDef::Tabulated {
                    points: vec![CurvePoint::new(0.0, 40.0), CurvePoint::new(1200.0, 190.0)],
                },
            },
        ],
        scenarios: vec![ScenarioDef {
            id: "duty".to_string(),
            name: "Duty/standby".to_string(),
            system_curve: "header".to_string(),
            configurations: vec![PumpConfigurationDef {
                pump: "p1".to_string(),
                label: Some("Lead pair".to_string()),
                arrangement: Arrangement::Parallel,
                count: 2,
                speed_ratios: vec![0.8, 1.0],
            }],
            por: DEFAULT_POR,
            aor: DEFAULT_AOR,
        }],
    }
}

#[test]
fn roundtrip_yaml_empty_project() {
    let project = Project {
        version: pp_project::LATEST_VERSION,
        name: "Empty Project".to_string(),
        unit_system: UnitSystem::Si,
        pumps: vec![],
        system_curves: vec![],
        scenarios: vec![],
    };
    validate_project(&project).unwrap();

    let path = std::env::temp_dir().join("pp_project_roundtrip_empty.yaml");
    save_yaml(&path, &project).unwrap();
    let loaded = load_yaml(&path).unwrap();
    assert_eq!(project, loaded);
}

#[test]
fn roundtrip_yaml_full_project() {
    let project = sample_project();
    let path = std::env::temp_dir().join("pp_project_roundtrip_full.yaml");
    save_yaml(&path, &project).unwrap();
    assert_eq!(load_project(&path).unwrap(), project);
}

#[test]
fn roundtrip_json_full_project() {
    let project = sample_project();
    let path = std::env::temp_dir().join("pp_project_roundtrip_full.json");
    save_json(&path, &project).unwrap();
    assert_eq!(load_project(&path).unwrap(), project);
}

#[test]
fn save_refuses_invalid_project() {
    let mut project = sample_project();
    project.scenarios[0].system_curve = "missing".to_string();
    let path = std::env::temp_dir().join("pp_project_invalid.yaml");
    assert!(matches!(
        save_yaml(&path, &project),
        Err(ProjectError::Validation(_))
    ));
}

#[test]
fn unknown_extension_is_rejected() {
    let path = std::env::temp_dir().join("pp_project.toml");
    assert!(matches!(
        load_project(&path),
        Err(ProjectError::UnknownFormat { .. })
    ));
}

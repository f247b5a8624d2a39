use clap::{Parser, Subcommand, ValueEnum};
use pp_app::{
    AppError, AppResult, ConfigurationStatus, EvaluationOptions, ScenarioReport, curve_service,
    evaluate, project_service,
};
use pp_curves::{Arrangement, CurvePoint};
use pp_solver::SolverConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pumppoint")]
#[command(about = "PumpPoint CLI - pump and system curve operating points", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax, structure and curves
    Validate {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
    },
    /// List scenarios in a project
    Scenarios {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
    },
    /// Compute operating points
    Evaluate {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
        /// Scenario ID (all scenarios when omitted)
        #[arg(short, long)]
        scenario: Option<String>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Output file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Flow distance outside a tabulated curve that still clamps to its end
        #[arg(long, default_value_t = 0.0)]
        boundary_tolerance: f64,
        /// Equal sub-steps per interval of the root scan grid
        #[arg(long, default_value_t = SolverConfig::default().subdivisions)]
        subdivisions: usize,
        /// Evaluate on the current thread only
        #[arg(long)]
        serial: bool,
    },
    /// Show a pump's best efficiency point and POR/AOR windows
    Bep {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
        /// Pump ID
        pump_id: String,
        #[arg(long, default_value_t = 1.0)]
        speed_ratio: f64,
    },
    /// Sample an effective pump curve as CSV
    Sample {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
        /// Pump ID
        pump_id: String,
        #[arg(long, value_enum, default_value_t = ArrangementArg::Parallel)]
        arrangement: ArrangementArg,
        #[arg(long, default_value_t = 1)]
        count: u32,
        #[arg(long, default_value_t = 1.0)]
        speed_ratio: f64,
        /// Number of evenly spaced points
        #[arg(short, long, default_value_t = 20)]
        points: usize,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ArrangementArg {
    Parallel,
    Series,
}

impl From<ArrangementArg> for Arrangement {
    fn from(arg: ArrangementArg) -> Self {
        match arg {
            ArrangementArg::Parallel => Arrangement::Parallel,
            ArrangementArg::Series => Arrangement::Series,
        }
    }
}

fn main() -> AppResult<()> {
    // Logs go to stderr so JSON output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Scenarios { project_path } => cmd_scenarios(&project_path),
        Commands::Evaluate {
            project_path,
            scenario,
            format,
            output,
            boundary_tolerance,
            subdivisions,
            serial,
        } => {
            let options = EvaluationOptions {
                solver: SolverConfig {
                    subdivisions,
                    ..SolverConfig::default()
                },
                boundary_tolerance,
                parallel: !serial,
            };
            cmd_evaluate(
                &project_path,
                scenario.as_deref(),
                format,
                output.as_deref(),
                &options,
            )
        }
        Commands::Bep {
            project_path,
            pump_id,
            speed_ratio,
        } => cmd_bep(&project_path, &pump_id, speed_ratio),
        Commands::Sample {
            project_path,
            pump_id,
            arrangement,
            count,
            speed_ratio,
            points,
            output,
        } => cmd_sample(
            &project_path,
            &pump_id,
            arrangement.into(),
            count,
            speed_ratio,
            points,
            output.as_deref(),
        ),
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let (project, _catalog) = project_service::open_project(project_path)?;
    println!(
        "✓ Project is valid ({} pumps, {} system curves, {} scenarios)",
        project.pumps.len(),
        project.system_curves.len(),
        project.scenarios.len()
    );
    Ok(())
}

fn cmd_scenarios(project_path: &Path) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let scenarios = project_service::list_scenarios(&project);

    if scenarios.is_empty() {
        println!("No scenarios found in project");
    } else {
        println!("Scenarios in project:");
        for s in scenarios {
            println!(
                "  {} - {} (system '{}', {} configurations, {} evaluations)",
                s.id, s.name, s.system_curve, s.configuration_count, s.evaluation_count
            );
        }
    }
    Ok(())
}

fn cmd_evaluate(
    project_path: &Path,
    scenario_id: Option<&str>,
    format: OutputFormat,
    output: Option<&Path>,
    options: &EvaluationOptions,
) -> AppResult<()> {
    let (project, catalog) = project_service::open_project(project_path)?;
    let reports = match scenario_id {
        Some(id) => {
            let scenario = project_service::get_scenario(&project, id)?;
            vec![evaluate::evaluate_scenario(scenario, &catalog, options)?]
        }
        None => evaluate::evaluate_project(&project, &catalog, options)?,
    };

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&reports)? + "\n",
        OutputFormat::Table => {
            let units = project.unit_system;
            let mut out = String::new();
            for report in &reports {
                out.push_str(&render_table(
                    report,
                    units.flow_label(),
                    units.head_label(),
                    units.power_label(),
                ));
            }
            out
        }
    };

    write_output(output, &rendered)
}

fn render_table(report: &ScenarioReport, flow: &str, head: &str, power: &str) -> String {
    let mut out = format!(
        "Scenario '{}' - {} (computed {})\n",
        report.scenario_id, report.name, report.computed_at
    );
    if report.operating_points.is_empty() {
        out.push_str("  No operating points\n");
    } else {
        out.push_str(&format!(
            "  {:<40} {:>12} {:>10} {:>7} {:>10}  {}\n",
            "configuration",
            format!("flow [{flow}]"),
            format!("head [{head}]"),
            "eta",
            format!("P [{power}]"),
            "region"
        ));
        for op in &report.operating_points {
            out.push_str(&format!(
                "  {:<40} {:>12.3} {:>10.3} {:>7} {:>10}  {}\n",
                op.configuration_label,
                op.flow,
                op.head,
                op.efficiency
                    .map(|e| format!("{:.1}%", e * 100.0))
                    .unwrap_or_else(|| "-".to_string()),
                op.power
                    .map(|p| format!("{p:.2}"))
                    .unwrap_or_else(|| "-".to_string()),
                op.region
                    .map(|r| format!("{r:?}").to_lowercase())
                    .unwrap_or_else(|| "-".to_string()),
            ));
        }
    }
    for diag in report.failures() {
        let reason = match &diag.status {
            ConfigurationStatus::NoIntersection => "no intersection".to_string(),
            ConfigurationStatus::IncompatibleCombination { reason } => {
                format!("incompatible combination: {reason}")
            }
            ConfigurationStatus::Ok => continue,
        };
        out.push_str(&format!(
            "  ! {} @{:.2}: {}\n",
            diag.configuration_label, diag.speed_ratio, reason
        ));
    }
    out.push('\n');
    out
}

fn cmd_bep(project_path: &Path, pump_id: &str, speed_ratio: f64) -> AppResult<()> {
    let (project, catalog) = project_service::open_project(project_path)?;
    let summary = curve_service::best_efficiency(&catalog, pump_id, speed_ratio)?;
    let units = project.unit_system;

    println!(
        "Pump '{}' ({}) at speed ratio {:.2}",
        summary.pump_id, summary.pump_name, summary.speed_ratio
    );
    print_point("  BEP", &summary.bep, units.flow_label(), units.head_label());
    match summary.ranges {
        Some(r) => {
            println!("  POR: {:.3} - {:.3} {}", r.por.0, r.por.1, units.flow_label());
            println!("  AOR: {:.3} - {:.3} {}", r.aor.0, r.aor.1, units.flow_label());
        }
        None => println!("  POR/AOR: undefined (BEP at zero flow)"),
    }
    Ok(())
}

fn print_point(prefix: &str, p: &CurvePoint, flow: &str, head: &str) {
    let eta = p
        .efficiency
        .map(|e| format!(", eta {:.1}%", e * 100.0))
        .unwrap_or_default();
    println!("{prefix}: {:.3} {flow} at {:.3} {head}{eta}", p.flow, p.head);
}

fn cmd_sample(
    project_path: &Path,
    pump_id: &str,
    arrangement: Arrangement,
    count: u32,
    speed_ratio: f64,
    n: usize,
    output: Option<&Path>,
) -> AppResult<()> {
    let (_project, catalog) = project_service::open_project(project_path)?;
    let points = curve_service::sample_effective_curve(
        &catalog,
        pump_id,
        arrangement,
        count,
        speed_ratio,
        n,
    )?;

    let csv = points_to_csv(&points)?;
    write_output(output, &csv)?;
    if let Some(path) = output {
        eprintln!("✓ Exported {} points to {}", points.len(), path.display());
    }
    Ok(())
}

fn points_to_csv(points: &[CurvePoint]) -> AppResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let csv_err = |e: csv::Error| AppError::Serialization(e.to_string());
    writer
        .write_record(["flow", "head", "efficiency", "power", "npshr"])
        .map_err(csv_err)?;
    let cell = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    for p in points {
        writer
            .write_record([
                p.flow.to_string(),
                p.head.to_string(),
                cell(p.efficiency),
                cell(p.power),
                cell(p.npshr),
            ])
            .map_err(csv_err)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Serialization(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AppError::Serialization(e.to_string()))
}

fn write_output(output: Option<&Path>, content: &str) -> AppResult<()> {
    match output {
        Some(path) => std::fs::write(path, content)?,
        None => print!("{content}"),
    }
    Ok(())
}

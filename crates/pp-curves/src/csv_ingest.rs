//! CSV ingest for tabulated pump and system curves.
//!
//! Expected layout:
//!
//! ```text
//! # units: flow gpm, head ft, efficiency %, power hp
//! flow,head,efficiency,power
//! 0,150,55,100
//! 500,140,70,120
//! 1000,120,75,160
//! ```
//!
//! The units line is optional; flow defaults to gpm and head to ft. Column
//! names are case-insensitive, `flow` and `head` are required. Rows with any
//! unparseable cell are skipped.

use crate::curve::CurvePoint;
use crate::error::{CurveError, CurveResult};
use crate::pump::PumpCurve;
use crate::system::SystemCurve;
use pp_core::numeric::Real;
use pp_core::units::{
    UnitSystem, normalize_efficiency, normalize_flow, normalize_head, normalize_power,
};
use std::collections::HashMap;
use std::io::Read;

const DEFAULT_FLOW_UNIT: &str = "gpm";
const DEFAULT_HEAD_UNIT: &str = "ft";

/// Unit tags read from a `# units:` comment line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvUnits {
    tags: HashMap<String, String>,
}

impl CsvUnits {
    /// Parse `# units: flow gpm, head ft, ...`. Malformed entries are ignored.
    pub fn parse(comment: &str) -> Self {
        let body = comment.trim_start_matches('#').trim();
        let body = body
            .strip_prefix("units:")
            .or_else(|| body.strip_prefix("UNITS:"))
            .or_else(|| body.strip_prefix("Units:"))
            .unwrap_or(body);

        let tags = body
            .split(',')
            .filter_map(|part| {
                let mut pieces = part.split_whitespace();
                match (pieces.next(), pieces.next(), pieces.next()) {
                    (Some(name), Some(unit), None) => {
                        Some((name.to_lowercase(), unit.to_string()))
                    }
                    _ => None,
                }
            })
            .collect();
        Self { tags }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.tags.get(column).map(String::as_str)
    }

    pub fn flow(&self) -> &str {
        self.get("flow").unwrap_or(DEFAULT_FLOW_UNIT)
    }

    pub fn head(&self) -> &str {
        self.get("head").unwrap_or(DEFAULT_HEAD_UNIT)
    }
}

/// Raw numeric table: lowercase header plus rows with every cell parsed.
struct Table {
    units: CsvUnits,
    columns: HashMap<String, usize>,
    rows: Vec<Vec<Real>>,
}

impl Table {
    fn column(&self, row: &[Real], name: &str) -> Option<Real> {
        self.columns.get(name).map(|&i| row[i])
    }
}

fn read_table<R: Read>(mut reader: R) -> CurveResult<Table> {
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .map_err(|e| CurveError::Csv {
            message: e.to_string(),
        })?;

    let units = content
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with('#') && l.to_lowercase().contains("units"))
        .map(CsvUnits::parse)
        .unwrap_or_default();

    let mut csv_reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .flexible(true)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let columns: HashMap<String, usize> = csv_reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_lowercase(), i))
        .collect();

    for required in ["flow", "head"] {
        if !columns.contains_key(required) {
            return Err(CurveError::Csv {
                message: format!("missing required column '{required}'"),
            });
        }
    }

    let width = columns.len();
    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for record in csv_reader.records() {
        let record = record?;
        let parsed: Option<Vec<Real>> = (0..width)
            .map(|i| record.get(i).and_then(|cell| cell.parse::<Real>().ok()))
            .collect();
        match parsed {
            Some(row) if row.iter().all(|v| v.is_finite()) => rows.push(row),
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, "dropped CSV rows with missing or non-numeric cells");
    }

    Ok(Table {
        units,
        columns,
        rows,
    })
}

/// Read pump samples, normalized to the default units of `target`.
pub fn read_pump_points<R: Read>(reader: R, target: UnitSystem) -> CurveResult<Vec<CurvePoint>> {
    let table = read_table(reader)?;
    let units = &table.units;

    let mut points = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let flow = table.column(row, "flow").unwrap_or_default();
        let head = table.column(row, "head").unwrap_or_default();
        let mut point = CurvePoint::new(
            normalize_flow(flow, units.flow(), target)?,
            normalize_head(head, units.head(), target)?,
        );
        if let Some(eta) = table.column(row, "efficiency") {
            point.efficiency = Some(normalize_efficiency(eta, units.get("efficiency"))?);
        }
        if let Some(power) = table.column(row, "power") {
            point.power = Some(match units.get("power") {
                Some(unit) => normalize_power(power, unit, target)?,
                None => power,
            });
        }
        if let Some(npshr) = table.column(row, "npshr") {
            point.npshr = Some(match units.get("npshr") {
                Some(unit) => normalize_head(npshr, unit, target)?,
                None => npshr,
            });
        }
        points.push(point);
    }

    points.sort_by(|a, b| a.flow.total_cmp(&b.flow));
    Ok(points)
}

/// Read `(flow, head)` samples, normalized to the default units of `target`.
pub fn read_system_points<R: Read>(
    reader: R,
    target: UnitSystem,
) -> CurveResult<Vec<CurvePoint>> {
    let table = read_table(reader)?;
    let units = &table.units;
    let mut points = table
        .rows
        .iter()
        .map(|row| {
            let flow = table.column(row, "flow").unwrap_or_default();
            let head = table.column(row, "head").unwrap_or_default();
            Ok(CurvePoint::new(
                normalize_flow(flow, units.flow(), target)?,
                normalize_head(head, units.head(), target)?,
            ))
        })
        .collect::<CurveResult<Vec<_>>>()?;
    points.sort_by(|a, b| a.flow.total_cmp(&b.flow));
    Ok(points)
}

/// Build a [`PumpCurve`] straight from CSV.
pub fn pump_curve_from_csv<R: Read>(
    id: impl Into<String>,
    name: impl Into<String>,
    rated_speed: Real,
    reader: R,
    target: UnitSystem,
) -> CurveResult<PumpCurve> {
    let points = read_pump_points(reader, target)?;
    PumpCurve::new(id, name, rated_speed, target, points)
}

/// Build a tabulated [`SystemCurve`] straight from CSV.
pub fn system_curve_from_csv<R: Read>(reader: R, target: UnitSystem) -> CurveResult<SystemCurve> {
    SystemCurve::tabulated(read_system_points(reader, target)?)
}

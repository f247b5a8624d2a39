// pp-core/src/units.rs
//
// The solver works in whatever consistent units its inputs arrive in. This
// module exists for the ingest boundary only: tabulated data tagged with unit
// names is normalized here to the default units of one `UnitSystem`.

use crate::error::{PpError, PpResult};
use crate::numeric::Real;

use uom::si::f64::{Length as UomLength, Power as UomPower, VolumeRate as UomVolumeRate};

pub type Head = UomLength;
pub type Power = UomPower;
pub type VolumeRate = UomVolumeRate;

/// Unit system a scenario is expressed in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum UnitSystem {
    /// gpm, ft, hp
    #[default]
    Us,
    /// m³/s, m, W
    Si,
}

impl UnitSystem {
    pub fn flow_label(self) -> &'static str {
        match self {
            UnitSystem::Us => "gpm",
            UnitSystem::Si => "m3/s",
        }
    }

    pub fn head_label(self) -> &'static str {
        match self {
            UnitSystem::Us => "ft",
            UnitSystem::Si => "m",
        }
    }

    pub fn power_label(self) -> &'static str {
        match self {
            UnitSystem::Us => "hp",
            UnitSystem::Si => "W",
        }
    }
}

fn parse_flow(value: Real, unit: &str) -> PpResult<VolumeRate> {
    use uom::si::volume_rate::{
        cubic_meter_per_hour, cubic_meter_per_second, gallon_per_minute, liter_per_second,
    };

    let q = match unit.trim().to_lowercase().as_str() {
        "gpm" | "gal/min" | "gallon_us/minute" | "usgpm" => {
            VolumeRate::new::<gallon_per_minute>(value)
        }
        "m3/s" | "m^3/s" | "m³/s" | "meter**3/second" | "cms" => {
            VolumeRate::new::<cubic_meter_per_second>(value)
        }
        "m3/h" | "m3/hr" | "m^3/h" | "m³/h" | "cmh" => VolumeRate::new::<cubic_meter_per_hour>(value),
        "l/s" | "lps" | "liter/second" => VolumeRate::new::<liter_per_second>(value),
        other => {
            return Err(PpError::UnknownUnit {
                quantity: "flow",
                unit: other.to_string(),
            });
        }
    };
    Ok(q)
}

fn parse_head(value: Real, unit: &str) -> PpResult<Head> {
    use uom::si::length::{foot, meter};

    let h = match unit.trim().to_lowercase().as_str() {
        "ft" | "foot" | "feet" | "fth2o" => Head::new::<foot>(value),
        "m" | "meter" | "metre" | "mh2o" => Head::new::<meter>(value),
        other => {
            return Err(PpError::UnknownUnit {
                quantity: "head",
                unit: other.to_string(),
            });
        }
    };
    Ok(h)
}

fn parse_power(value: Real, unit: &str) -> PpResult<Power> {
    use uom::si::power::{horsepower, kilowatt, watt};

    let p = match unit.trim().to_lowercase().as_str() {
        "hp" | "horsepower" | "bhp" => Power::new::<horsepower>(value),
        "w" | "watt" => Power::new::<watt>(value),
        "kw" | "kilowatt" => Power::new::<kilowatt>(value),
        other => {
            return Err(PpError::UnknownUnit {
                quantity: "power",
                unit: other.to_string(),
            });
        }
    };
    Ok(p)
}

/// Convert a flow tagged with `unit` into the default flow unit of `target`.
pub fn normalize_flow(value: Real, unit: &str, target: UnitSystem) -> PpResult<Real> {
    use uom::si::volume_rate::{cubic_meter_per_second, gallon_per_minute};

    let q = parse_flow(value, unit)?;
    Ok(match target {
        UnitSystem::Us => q.get::<gallon_per_minute>(),
        UnitSystem::Si => q.get::<cubic_meter_per_second>(),
    })
}

/// Convert a head tagged with `unit` into the default head unit of `target`.
pub fn normalize_head(value: Real, unit: &str, target: UnitSystem) -> PpResult<Real> {
    use uom::si::length::{foot, meter};

    let h = parse_head(value, unit)?;
    Ok(match target {
        UnitSystem::Us => h.get::<foot>(),
        UnitSystem::Si => h.get::<meter>(),
    })
}

/// Convert a power tagged with `unit` into the default power unit of `target`.
pub fn normalize_power(value: Real, unit: &str, target: UnitSystem) -> PpResult<Real> {
    use uom::si::power::{horsepower, watt};

    let p = parse_power(value, unit)?;
    Ok(match target {
        UnitSystem::Us => p.get::<horsepower>(),
        UnitSystem::Si => p.get::<watt>(),
    })
}

/// Efficiency as a fraction. `%`/`percent` inputs are divided by 100, an
/// absent unit means the value is already a fraction.
pub fn normalize_efficiency(value: Real, unit: Option<&str>) -> PpResult<Real> {
    match unit.map(|u| u.trim().to_lowercase()) {
        None => Ok(value),
        Some(u) => match u.as_str() {
            "" | "fraction" | "-" => Ok(value),
            "%" | "percent" | "pct" => Ok(value / 100.0),
            other => Err(PpError::UnknownUnit {
                quantity: "efficiency",
                unit: other.to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, rel: f64) -> bool {
        (a - b).abs() <= rel * b.abs().max(1e-12)
    }

    #[test]
    fn gpm_to_si() {
        let q = normalize_flow(1000.0, "gpm", UnitSystem::Si).unwrap();
        assert!(close(q, 0.063_090_2, 1e-5), "got {q}");
    }

    #[test]
    fn same_system_is_identity() {
        let q = normalize_flow(500.0, "gpm", UnitSystem::Us).unwrap();
        assert!(close(q, 500.0, 1e-12));
        let h = normalize_head(30.0, "m", UnitSystem::Si).unwrap();
        assert!(close(h, 30.0, 1e-12));
    }

    #[test]
    fn feet_to_meters() {
        let h = normalize_head(100.0, "ft", UnitSystem::Si).unwrap();
        assert!(close(h, 30.48, 1e-9));
    }

    #[test]
    fn horsepower_to_watts() {
        let p = normalize_power(1.0, "hp", UnitSystem::Si).unwrap();
        assert!(close(p, 745.7, 1e-4), "got {p}");
    }

    #[test]
    fn percent_efficiency() {
        assert!(close(normalize_efficiency(75.0, Some("%")).unwrap(), 0.75, 1e-12));
        assert_eq!(normalize_efficiency(0.75, None).unwrap(), 0.75);
    }

    #[test]
    fn unknown_unit_is_reported() {
        let err = normalize_flow(1.0, "furlongs/fortnight", UnitSystem::Us).unwrap_err();
        assert!(matches!(err, PpError::UnknownUnit { quantity: "flow", .. }));
        assert!(err.to_string().contains("furlongs"));
    }
}

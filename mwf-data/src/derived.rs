//! Fallback resolver for quantities the models do not uniformly report.
//!
//! Every resolved value carries a [`Provenance`]:
//!
//! * freezing level: `direct` from the capable source models, else
//!   `estimated` from surface (and 850 hPa) temperature, else `unavailable`;
//! * wind: `direct` from 80 m members, else `adjusted` from 10 m members
//!   scaled by [`WIND_80M_FACTOR`], else `unavailable`;
//! * snow level: freezing level minus [`SNOW_LEVEL_OFFSET_M`], inheriting
//!   the freezing level's provenance.

use mwf_ensemble::{capability, SeriesTable, Variable};
use rayon::prelude::*;
use serde::Serialize;

use crate::statistics::mean;

/// Standard atmosphere lapse rate.
pub const STANDARD_LAPSE_RATE_C_PER_KM: f64 = 6.5;

/// Nominal height of the 850 hPa surface.
pub const HEIGHT_850HPA_M: f64 = 1500.0;

/// Plausible range for a lapse rate derived from 850 hPa temperature;
/// outside it the standard rate is used.
pub const MIN_LAPSE_RATE_C_PER_KM: f64 = 2.0;
pub const MAX_LAPSE_RATE_C_PER_KM: f64 = 9.8;

/// 10 m -> ridge-top (80 m) wind scaling.
pub const WIND_80M_FACTOR: f64 = 1.4;

/// Snow typically reaches this far below the freezing level.
pub const SNOW_LEVEL_OFFSET_M: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Direct,
    Estimated,
    Adjusted,
    Unavailable,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Direct => "direct",
            Provenance::Estimated => "estimated",
            Provenance::Adjusted => "adjusted",
            Provenance::Unavailable => "unavailable",
        }
    }
}

/// A resolved number and where it came from. `value` is `None` exactly
/// when the provenance is `Unavailable`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedValue {
    pub value: Option<f64>,
    pub provenance: Provenance,
}

impl DerivedValue {
    pub fn direct(value: f64) -> Self {
        DerivedValue {
            value: Some(value),
            provenance: Provenance::Direct,
        }
    }

    pub fn estimated(value: f64) -> Self {
        DerivedValue {
            value: Some(value),
            provenance: Provenance::Estimated,
        }
    }

    pub fn adjusted(value: f64) -> Self {
        DerivedValue {
            value: Some(value),
            provenance: Provenance::Adjusted,
        }
    }

    pub fn unavailable() -> Self {
        DerivedValue {
            value: None,
            provenance: Provenance::Unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        self.value.is_some()
    }
}

/// Which wind level supplied a resolved wind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WindSource {
    #[serde(rename = "80m")]
    Wind80m,
    #[serde(rename = "10m_adjusted")]
    Wind10mAdjusted,
    #[serde(rename = "unavailable")]
    Unavailable,
}

impl WindSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindSource::Wind80m => "80m",
            WindSource::Wind10mAdjusted => "10m_adjusted",
            WindSource::Unavailable => "unavailable",
        }
    }
}

/// Member wind speeds at one timestep, already on the 80 m scale.
#[derive(Debug, Clone, PartialEq)]
pub struct WindMembers {
    pub source: WindSource,
    pub speeds: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedWind {
    /// Mean member speed.
    pub speed: DerivedValue,
    /// Strongest member speed, on the same scale as `speed`.
    pub max_speed: Option<f64>,
    pub direction: Option<f64>,
    pub source: WindSource,
}

/// All resolved quantities for one timestep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedHour {
    pub freezing_level: DerivedValue,
    pub snow_level: DerivedValue,
    pub wind: ResolvedWind,
}

/// Pick the wind level for timestep `idx`: 80 m members when any reports,
/// otherwise 10 m members scaled up.
pub fn wind_members(table: &SeriesTable, idx: usize) -> WindMembers {
    let direct = table.member_values(Variable::WindSpeed80m, idx);
    if !direct.is_empty() {
        return WindMembers {
            source: WindSource::Wind80m,
            speeds: direct,
        };
    }
    let surface = table.member_values(Variable::WindSpeed10m, idx);
    if !surface.is_empty() {
        return WindMembers {
            source: WindSource::Wind10mAdjusted,
            speeds: surface.iter().map(|s| s * WIND_80M_FACTOR).collect(),
        };
    }
    WindMembers {
        source: WindSource::Unavailable,
        speeds: Vec::new(),
    }
}

/// Mean direction of a set of bearings, in [0, 360). `None` when empty or
/// when the bearings cancel out.
pub fn circular_mean(degrees: &[f64]) -> Option<f64> {
    if degrees.is_empty() {
        return None;
    }
    let (sin, cos) = degrees.iter().fold((0.0, 0.0), |(s, c), d| {
        let r = d.to_radians();
        (s + r.sin(), c + r.cos())
    });
    if sin.hypot(cos) < 1e-9 {
        return None;
    }
    Some(sin.atan2(cos).to_degrees().rem_euclid(360.0))
}

pub fn resolve_wind(table: &SeriesTable, idx: usize) -> ResolvedWind {
    let members = wind_members(table, idx);
    let Some(speed) = mean(&members.speeds) else {
        return ResolvedWind {
            speed: DerivedValue::unavailable(),
            max_speed: None,
            direction: None,
            source: WindSource::Unavailable,
        };
    };
    let (speed, direction_var) = match members.source {
        WindSource::Wind80m => (DerivedValue::direct(speed), Variable::WindDirection80m),
        _ => (DerivedValue::adjusted(speed), Variable::WindDirection10m),
    };
    ResolvedWind {
        speed,
        max_speed: members.speeds.iter().copied().reduce(f64::max),
        direction: circular_mean(&table.member_values(direction_var, idx)),
        source: members.source,
    }
}

/// Freezing level above the surface from surface temperature and, when
/// plausible, the lapse rate implied by 850 hPa temperature.
///
/// A surface at or below 0 °C is already frozen: height 0.
pub fn estimate_freezing_level(t2m: f64, t850: Option<f64>) -> f64 {
    if t2m <= 0.0 {
        return 0.0;
    }
    let lapse_per_km = t850
        .map(|t| (t2m - t) / HEIGHT_850HPA_M * 1000.0)
        .filter(|l| (MIN_LAPSE_RATE_C_PER_KM..=MAX_LAPSE_RATE_C_PER_KM).contains(l))
        .unwrap_or(STANDARD_LAPSE_RATE_C_PER_KM);
    t2m / lapse_per_km * 1000.0
}

pub fn resolve_freezing_level(table: &SeriesTable, idx: usize) -> DerivedValue {
    let reported: Vec<f64> = capability::sources_of(Variable::FreezingLevelHeight)
        .into_iter()
        .flat_map(|m| table.model_member_values(Variable::FreezingLevelHeight, m, idx))
        .collect();
    if let Some(direct) = mean(&reported) {
        return DerivedValue::direct(direct);
    }
    match mean(&table.member_values(Variable::Temperature2m, idx)) {
        Some(t2m) => {
            let t850 = mean(&table.member_values(Variable::Temperature850hPa, idx));
            DerivedValue::estimated(estimate_freezing_level(t2m, t850))
        }
        None => DerivedValue::unavailable(),
    }
}

pub fn snow_level(freezing_level: &DerivedValue) -> DerivedValue {
    match freezing_level.value {
        Some(fl) => DerivedValue {
            value: Some(fl - SNOW_LEVEL_OFFSET_M),
            provenance: freezing_level.provenance,
        },
        None => DerivedValue::unavailable(),
    }
}

/// Resolve every timestep of the hourly table, in parallel across steps.
pub fn resolve_all(table: &SeriesTable) -> Vec<ResolvedHour> {
    (0..table.len())
        .into_par_iter()
        .map(|idx| {
            let freezing_level = resolve_freezing_level(table, idx);
            ResolvedHour {
                snow_level: snow_level(&freezing_level),
                freezing_level,
                wind: resolve_wind(table, idx),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::table;
    use mwf_ensemble::Model;

    #[test]
    fn test_freezing_level_direct_from_gfs() {
        let t = table(
            2,
            &[
                (
                    Variable::FreezingLevelHeight,
                    Model::GfsSeamless,
                    vec![vec![Some(1200.0), None], vec![Some(1400.0), None]],
                ),
                (
                    Variable::Temperature2m,
                    Model::EcmwfIfs025,
                    vec![vec![Some(3.25), Some(3.25)]],
                ),
            ],
        );
        let first = resolve_freezing_level(&t, 0);
        assert_eq!(first, DerivedValue::direct(1300.0));
        // no GFS value at step 1: falls back to the surface estimate
        let second = resolve_freezing_level(&t, 1);
        assert_eq!(second.provenance, Provenance::Estimated);
        assert!((second.value.unwrap() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_freezing_level_unavailable() {
        let t = table(
            1,
            &[(Variable::Precipitation, Model::GemGlobal, vec![vec![Some(1.0)]])],
        );
        let fl = resolve_freezing_level(&t, 0);
        assert_eq!(fl, DerivedValue::unavailable());
        assert_eq!(snow_level(&fl), DerivedValue::unavailable());
    }

    #[test]
    fn test_estimate_freezing_level() {
        assert_eq!(estimate_freezing_level(-2.0, Some(-10.0)), 0.0);
        assert_eq!(estimate_freezing_level(0.0, None), 0.0);
        assert!((estimate_freezing_level(6.5, None) - 1000.0).abs() < 1e-9);
        // (9 - 0) / 1500 m = 6 °C/km
        assert!((estimate_freezing_level(9.0, Some(0.0)) - 1500.0).abs() < 1e-9);
        // implied 20 °C/km is implausible: standard rate
        assert!((estimate_freezing_level(13.0, Some(-17.0)) - 2000.0).abs() < 1e-9);
        // warmer surface, higher freezing level
        assert!(estimate_freezing_level(8.0, None) > estimate_freezing_level(4.0, None));
    }

    #[test]
    fn test_snow_level_inherits_provenance() {
        let sl = snow_level(&DerivedValue::estimated(1000.0));
        assert_eq!(sl, DerivedValue::estimated(700.0));
        let sl = snow_level(&DerivedValue::direct(2500.0));
        assert_eq!(sl, DerivedValue::direct(2200.0));
    }

    #[test]
    fn test_wind_prefers_80m() {
        let t = table(
            2,
            &[
                (
                    Variable::WindSpeed80m,
                    Model::GfsSeamless,
                    vec![vec![Some(40.0), None], vec![Some(50.0), None]],
                ),
                (
                    Variable::WindDirection80m,
                    Model::GfsSeamless,
                    vec![vec![Some(350.0), None], vec![Some(10.0), None]],
                ),
                (
                    Variable::WindSpeed10m,
                    Model::GemGlobal,
                    vec![vec![Some(10.0), Some(20.0)]],
                ),
                (
                    Variable::WindDirection10m,
                    Model::GemGlobal,
                    vec![vec![Some(90.0), Some(180.0)]],
                ),
            ],
        );
        let w0 = resolve_wind(&t, 0);
        assert_eq!(w0.source, WindSource::Wind80m);
        assert_eq!(w0.speed, DerivedValue::direct(45.0));
        assert_eq!(w0.max_speed, Some(50.0));
        let dir = w0.direction.unwrap();
        assert!(dir < 1e-6 || (360.0 - dir) < 1e-6);

        let w1 = resolve_wind(&t, 1);
        assert_eq!(w1.source, WindSource::Wind10mAdjusted);
        assert_eq!(w1.speed.provenance, Provenance::Adjusted);
        assert!((w1.speed.value.unwrap() - 28.0).abs() < 1e-9);
        assert!((w1.direction.unwrap() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_wind_unavailable() {
        let t = table(
            1,
            &[(Variable::Temperature2m, Model::GemGlobal, vec![vec![Some(1.0)]])],
        );
        let w = resolve_wind(&t, 0);
        assert_eq!(w.source, WindSource::Unavailable);
        assert_eq!(w.speed, DerivedValue::unavailable());
        assert_eq!(w.direction, None);
    }

    #[test]
    fn test_circular_mean() {
        assert_eq!(circular_mean(&[]), None);
        assert!((circular_mean(&[90.0, 180.0]).unwrap() - 135.0).abs() < 1e-9);
        assert_eq!(circular_mean(&[0.0, 180.0]), None);
    }

    #[test]
    fn test_resolve_all_keeps_order() {
        let t = table(
            3,
            &[(
                Variable::Temperature2m,
                Model::GemGlobal,
                vec![vec![Some(6.5), Some(-1.0), None]],
            )],
        );
        let resolved = resolve_all(&t);
        assert_eq!(resolved.len(), 3);
        assert!((resolved[0].freezing_level.value.unwrap() - 1000.0).abs() < 1e-9);
        assert_eq!(resolved[1].freezing_level, DerivedValue::estimated(0.0));
        assert_eq!(resolved[1].snow_level, DerivedValue::estimated(-300.0));
        assert_eq!(resolved[2].freezing_level.provenance, Provenance::Unavailable);
    }
}

//! Snowfall depth from temperature, humidity and liquid precipitation.
//!
//! The depth of one member at one step is
//!
//! ```text
//! depth_cm = P * SLR_base(T) * f_RH(RH) * f_rate(P / H) * p_snow(Tw) / 10
//! ```
//!
//! where `Tw` is the Stull wet-bulb temperature, `p_snow` a logistic
//! rain/snow split on `Tw`, `SLR_base` a Gaussian snow-to-liquid ratio
//! peaking at `t_peak`, and the humidity and rate factors densify snow in
//! wet or intense storms. Every member is computed from its own inputs,
//! never from ensemble statistics.

use log::debug;
use mwf_ensemble::{EnsembleError, MemberColumn, Model, Result, SeriesTable, Variable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tunable formula parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnowParams {
    /// Steepness of the rain/snow transition.
    pub alpha: f64,
    /// Wet-bulb temperature (°C) of a 50% snow share.
    pub beta: f64,
    /// Snow-to-liquid ratio of dense, wet snow.
    pub r_min: f64,
    /// Snow-to-liquid ratio at the dendritic peak.
    pub r_max: f64,
    /// Temperature (°C) of peak ratio.
    pub t_peak: f64,
    /// Width (°C) of the ratio peak.
    pub sigma: f64,
    /// Maximum relative humidity effect.
    pub gamma: f64,
    /// Densification per mm/h of precipitation rate.
    pub delta: f64,
}

impl Default for SnowParams {
    fn default() -> Self {
        SnowParams {
            alpha: 1.2,
            beta: 0.5,
            r_min: 6.0,
            r_max: 18.0,
            t_peak: -12.0,
            sigma: 7.0,
            gamma: 0.2,
            delta: 0.05,
        }
    }
}

/// Named parameter sets for common snow climates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnowPreset {
    #[default]
    Default,
    Maritime,
    Continental,
    Arctic,
}

impl SnowPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnowPreset::Default => "default",
            SnowPreset::Maritime => "maritime",
            SnowPreset::Continental => "continental",
            SnowPreset::Arctic => "arctic",
        }
    }

    pub fn params(&self) -> SnowParams {
        let base = SnowParams::default();
        match self {
            SnowPreset::Default => base,
            // wet coastal snowpacks
            SnowPreset::Maritime => SnowParams {
                r_max: 13.5,
                gamma: 0.25,
                ..base
            },
            SnowPreset::Continental => SnowParams {
                r_max: 22.0,
                ..base
            },
            SnowPreset::Arctic => SnowParams {
                r_min: 8.0,
                r_max: 25.0,
                t_peak: -15.0,
                sigma: 8.0,
                ..base
            },
        }
    }
}

impl fmt::Display for SnowPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnowPreset {
    type Err = EnsembleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(SnowPreset::Default),
            "maritime" => Ok(SnowPreset::Maritime),
            "continental" => Ok(SnowPreset::Continental),
            "arctic" => Ok(SnowPreset::Arctic),
            other => Err(EnsembleError::InvalidInput(format!(
                "unknown snow preset '{}'",
                other
            ))),
        }
    }
}

/// Per-run overrides applied on top of a preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnowOverrides {
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub r_min: Option<f64>,
    pub r_max: Option<f64>,
    pub t_peak: Option<f64>,
    pub sigma: Option<f64>,
    pub gamma: Option<f64>,
    pub delta: Option<f64>,
}

impl SnowOverrides {
    pub fn apply(&self, params: SnowParams) -> SnowParams {
        SnowParams {
            alpha: self.alpha.unwrap_or(params.alpha),
            beta: self.beta.unwrap_or(params.beta),
            r_min: self.r_min.unwrap_or(params.r_min),
            r_max: self.r_max.unwrap_or(params.r_max),
            t_peak: self.t_peak.unwrap_or(params.t_peak),
            sigma: self.sigma.unwrap_or(params.sigma),
            gamma: self.gamma.unwrap_or(params.gamma),
            delta: self.delta.unwrap_or(params.delta),
        }
    }
}

/// Stull (2011) wet-bulb approximation, °C.
pub fn wet_bulb(temperature: f64, relative_humidity: f64) -> f64 {
    let t = temperature;
    let rh = relative_humidity;
    t * (0.151977 * (rh + 8.313659).sqrt()).atan() + (t + rh).atan() - (rh - 1.676331).atan()
        + 0.00391838 * rh.powf(1.5) * (0.023101 * rh).atan()
        - 4.686035
}

/// Share of precipitation falling as snow, decreasing in wet-bulb temperature.
pub fn snow_probability(wet_bulb: f64, params: &SnowParams) -> f64 {
    1.0 / (1.0 + (params.alpha * (wet_bulb - params.beta)).exp())
}

pub fn base_slr(temperature: f64, params: &SnowParams) -> f64 {
    let d = temperature - params.t_peak;
    params.r_min + (params.r_max - params.r_min) * (-(d * d) / (2.0 * params.sigma.powi(2))).exp()
}

pub fn humidity_factor(relative_humidity: f64, params: &SnowParams) -> f64 {
    (1.0 + params.gamma * (50.0 - relative_humidity) / 50.0).clamp(0.8, 1.2)
}

/// Densification from precipitation rate; 1 when no duration is known.
pub fn rate_factor(precipitation: f64, duration_hours: Option<f64>, params: &SnowParams) -> f64 {
    match duration_hours {
        Some(h) if h > 0.0 => 1.0 / (1.0 + params.delta * precipitation / h),
        _ => 1.0,
    }
}

/// Inputs for one member at one step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnowInput {
    pub temperature: f64,
    pub relative_humidity: f64,
    pub precipitation: f64,
    pub duration_hours: Option<f64>,
}

impl SnowInput {
    pub fn validate(&self) -> Result<()> {
        if !self.temperature.is_finite() {
            return Err(EnsembleError::InvalidInput(format!(
                "temperature must be finite, got {}",
                self.temperature
            )));
        }
        if !self.relative_humidity.is_finite() || !(0.0..=100.0).contains(&self.relative_humidity) {
            return Err(EnsembleError::InvalidInput(format!(
                "relative humidity must be within 0-100%, got {}",
                self.relative_humidity
            )));
        }
        if !self.precipitation.is_finite() || self.precipitation < 0.0 {
            return Err(EnsembleError::InvalidInput(format!(
                "precipitation must be a non-negative amount, got {}",
                self.precipitation
            )));
        }
        if let Some(h) = self.duration_hours {
            if !h.is_finite() || h <= 0.0 {
                return Err(EnsembleError::InvalidInput(format!(
                    "duration must be a positive number of hours, got {}",
                    h
                )));
            }
        }
        Ok(())
    }
}

/// All intermediate terms of one snowfall calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SnowEstimate {
    pub wet_bulb: f64,
    pub snow_probability: f64,
    pub base_slr: f64,
    pub humidity_factor: f64,
    pub rate_factor: f64,
    pub snowfall_cm: f64,
}

pub fn calculate_snowfall(input: &SnowInput, params: &SnowParams) -> Result<SnowEstimate> {
    input.validate()?;
    let tw = wet_bulb(input.temperature, input.relative_humidity);
    let p_snow = snow_probability(tw, params);
    let slr = base_slr(input.temperature, params);
    let f_rh = humidity_factor(input.relative_humidity, params);
    let f_rate = rate_factor(input.precipitation, input.duration_hours, params);
    let depth = input.precipitation * slr * f_rh * f_rate * p_snow / 10.0;

    Ok(SnowEstimate {
        wet_bulb: tw,
        snow_probability: p_snow,
        base_slr: slr,
        humidity_factor: f_rh,
        rate_factor: f_rate,
        snowfall_cm: depth.max(0.0),
    })
}

/// Per-member snow depth columns for a whole table.
#[derive(Debug, Clone, PartialEq)]
pub struct SnowDerivation {
    pub blocks: Vec<(Model, Vec<MemberColumn>)>,
    /// Cells whose inputs were present but physically invalid.
    pub invalid_cells: usize,
}

/// Run the formula for every member of every model that reports
/// temperature, humidity and precipitation.
///
/// Members are matched by index within a model. A cell with any input
/// missing is no-data; a cell with invalid input is no-data and counted.
pub fn derive_snow_depth(table: &SeriesTable, params: &SnowParams) -> SnowDerivation {
    let duration = mwf_utils::times::step_hours(table.axis());
    let mut blocks = Vec::new();
    let mut invalid_cells = 0;

    for model in table.models_for(Variable::Precipitation) {
        let (Some(temps), Some(humidity), Some(precip)) = (
            table.columns(Variable::Temperature2m, model),
            table.columns(Variable::RelativeHumidity2m, model),
            table.columns(Variable::Precipitation, model),
        ) else {
            debug!("No snow depth for {}: missing temperature or humidity", model);
            continue;
        };

        let mut columns = Vec::with_capacity(precip.len());
        for p_col in precip {
            let t_col = temps.iter().find(|c| c.member == p_col.member);
            let rh_col = humidity.iter().find(|c| c.member == p_col.member);
            let values = (0..table.len())
                .map(|idx| {
                    let input = SnowInput {
                        temperature: t_col?.at(idx)?,
                        relative_humidity: rh_col?.at(idx)?,
                        precipitation: p_col.at(idx)?,
                        duration_hours: duration,
                    };
                    match calculate_snowfall(&input, params) {
                        Ok(estimate) => Some(estimate.snowfall_cm),
                        Err(e) => {
                            debug!("{} member {} step {}: {}", model, p_col.member, idx, e);
                            invalid_cells += 1;
                            None
                        }
                    }
                })
                .collect();
            columns.push(MemberColumn::new(p_col.member, values));
        }
        blocks.push((model, columns));
    }

    SnowDerivation {
        blocks,
        invalid_cells,
    }
}

/// Add `snow_depth` blocks to the table; returns the invalid cell count.
pub fn apply_snow_depth(table: &mut SeriesTable, params: &SnowParams) -> Result<usize> {
    let derivation = derive_snow_depth(table, params);
    for (model, columns) in derivation.blocks {
        table.insert_block(Variable::SnowDepth, model, columns)?;
    }
    Ok(derivation.invalid_cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::table;

    fn input(t: f64, rh: f64, p: f64, h: Option<f64>) -> SnowInput {
        SnowInput {
            temperature: t,
            relative_humidity: rh,
            precipitation: p,
            duration_hours: h,
        }
    }

    #[test]
    fn test_moderate_cold_storm() {
        let e = calculate_snowfall(&input(-4.0, 85.0, 10.0, Some(12.0)), &SnowParams::default())
            .unwrap();
        assert!(e.snowfall_cm >= 10.0 && e.snowfall_cm <= 12.0, "{}", e.snowfall_cm);
        assert!((e.snowfall_cm - 10.099).abs() < 0.01);
        assert!((e.humidity_factor - 0.86).abs() < 1e-9);
        assert!((e.rate_factor - 0.96).abs() < 1e-9);
    }

    #[test]
    fn test_dendritic_peak() {
        let e = calculate_snowfall(&input(-12.0, 50.0, 5.0, Some(6.0)), &SnowParams::default())
            .unwrap();
        assert!(e.snowfall_cm >= 8.0 && e.snowfall_cm <= 9.0, "{}", e.snowfall_cm);
        assert!((e.base_slr - 18.0).abs() < 1e-9);
        assert_eq!(e.humidity_factor, 1.0);
    }

    #[test]
    fn test_warm_rain_is_nearly_zero() {
        let e = calculate_snowfall(&input(5.0, 90.0, 10.0, Some(1.0)), &SnowParams::default())
            .unwrap();
        assert!(e.snowfall_cm < 0.1);
        assert!(e.snowfall_cm >= 0.0);
    }

    #[test]
    fn test_no_duration_means_no_rate_adjustment() {
        let e = calculate_snowfall(&input(-4.0, 85.0, 10.0, None), &SnowParams::default()).unwrap();
        assert_eq!(e.rate_factor, 1.0);
        assert!((e.snowfall_cm - 10.52).abs() < 0.01);
    }

    #[test]
    fn test_invalid_inputs() {
        let p = SnowParams::default();
        for bad in [
            input(-4.0, 85.0, -1.0, Some(1.0)),
            input(-4.0, 105.0, 1.0, Some(1.0)),
            input(-4.0, -1.0, 1.0, Some(1.0)),
            input(f64::NAN, 85.0, 1.0, Some(1.0)),
            input(-4.0, 85.0, f64::INFINITY, Some(1.0)),
            input(-4.0, 85.0, 1.0, Some(0.0)),
            input(-4.0, 85.0, 1.0, Some(-2.0)),
        ] {
            assert!(matches!(
                calculate_snowfall(&bad, &p),
                Err(EnsembleError::InvalidInput(_))
            ));
        }
        assert!(calculate_snowfall(&input(-4.0, 85.0, 0.0, Some(1.0)), &p).is_ok());
    }

    #[test]
    fn test_monotonic_factors() {
        let p = SnowParams::default();
        let mut last = f64::INFINITY;
        for mm in [0.0, 0.5, 1.0, 5.0, 20.0, 60.0] {
            let f = rate_factor(mm, Some(1.0), &p);
            assert!(f <= last);
            last = f;
        }
        let mut last = 1.0;
        for tw in [-10.0, -2.0, 0.0, 0.5, 1.0, 3.0, 8.0] {
            let s = snow_probability(tw, &p);
            assert!(s < last);
            last = s;
        }
        assert!((snow_probability(0.5, &p) - 0.5).abs() < 1e-12);
        assert_eq!(humidity_factor(100.0, &p), 0.8);
        assert_eq!(humidity_factor(0.0, &p), 1.2);
    }

    #[test]
    fn test_presets_and_overrides() {
        assert_eq!("arctic".parse::<SnowPreset>().unwrap(), SnowPreset::Arctic);
        assert!("tropical".parse::<SnowPreset>().is_err());
        assert_eq!(SnowPreset::Default.params(), SnowParams::default());
        assert!(SnowPreset::Maritime.params().r_max < SnowPreset::Continental.params().r_max);

        let overrides = SnowOverrides {
            r_max: Some(20.0),
            ..Default::default()
        };
        let p = overrides.apply(SnowPreset::Maritime.params());
        assert_eq!(p.r_max, 20.0);
        assert_eq!(p.gamma, 0.25);
    }

    #[test]
    fn test_derive_snow_depth_per_member() {
        let mut t = table(
            2,
            &[
                (
                    Variable::Temperature2m,
                    Model::GemGlobal,
                    vec![vec![Some(-4.0), Some(-4.0)], vec![Some(-12.0), Some(-4.0)]],
                ),
                (
                    Variable::RelativeHumidity2m,
                    Model::GemGlobal,
                    vec![vec![Some(85.0), Some(85.0)], vec![Some(50.0), None]],
                ),
                (
                    Variable::Precipitation,
                    Model::GemGlobal,
                    vec![vec![Some(10.0), Some(-3.0)], vec![Some(5.0), Some(1.0)]],
                ),
                // no humidity: no snow depth for this model
                (
                    Variable::Temperature2m,
                    Model::EcmwfAifs025,
                    vec![vec![Some(-4.0), Some(-4.0)]],
                ),
                (
                    Variable::Precipitation,
                    Model::EcmwfAifs025,
                    vec![vec![Some(1.0), Some(1.0)]],
                ),
            ],
        );
        let invalid = apply_snow_depth(&mut t, &SnowParams::default()).unwrap();
        assert_eq!(invalid, 1);
        assert_eq!(t.models_for(Variable::SnowDepth), vec![Model::GemGlobal]);
        let cols = t.columns(Variable::SnowDepth, Model::GemGlobal).unwrap();
        // hourly axis: duration 1 h, so the rate factor differs from the 12 h case
        let expected =
            calculate_snowfall(&input(-4.0, 85.0, 10.0, Some(1.0)), &SnowParams::default())
                .unwrap()
                .snowfall_cm;
        assert!((cols[0].at(0).unwrap() - expected).abs() < 1e-12);
        assert_eq!(cols[0].at(1), None); // negative precipitation
        assert!(cols[1].at(0).unwrap() > 0.0);
        assert_eq!(cols[1].at(1), None); // humidity missing
    }
}

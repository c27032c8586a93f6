//! Run configuration loaded from an optional TOML file.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration:
//!
//! ```toml
//! models = ["gfs_seamless", "ecmwf_ifs025"]
//! forecast_days = 7
//!
//! [snow]
//! preset = "maritime"
//!
//! [snow.overrides]
//! r_max = 14.0
//!
//! [rating.wind]
//! fair = 40.0
//! poor = 60.0
//!
//! [alerts]
//! heavy_snow_cm = 30.0
//! ```

use anyhow::{anyhow, bail};
use mwf_data::comparison::AgreementLevel;
use mwf_data::snow::{SnowOverrides, SnowParams, SnowPreset};
use mwf_data::statistics::DEFAULT_TREND_WINDOW;
use mwf_ensemble::Model;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const MIN_FORECAST_DAYS: u32 = 1;
pub const MAX_FORECAST_DAYS: u32 = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Models to keep; all models in the payload when absent.
    pub models: Option<Vec<Model>>,
    pub forecast_days: u32,
    pub trend_window: usize,
    pub snow: SnowConfig,
    pub rating: RatingTable,
    pub alerts: AlertThresholds,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ForecastConfig {
            models: None,
            forecast_days: 7,
            trend_window: DEFAULT_TREND_WINDOW,
            snow: SnowConfig::default(),
            rating: RatingTable::default(),
            alerts: AlertThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnowConfig {
    pub preset: SnowPreset,
    pub overrides: SnowOverrides,
}

impl SnowConfig {
    /// Preset parameters with the overrides applied.
    pub fn params(&self) -> SnowParams {
        self.overrides.apply(self.preset.params())
    }
}

/// Values above `fair` grade a rule fair, above `poor` grade it poor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub fair: f64,
    pub poor: f64,
}

/// Agreement levels that grade the model-agreement rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgreementRule {
    pub fair: AgreementLevel,
    pub poor: AgreementLevel,
}

/// Rules behind the GOOD/FAIR/POOR operational rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingTable {
    /// Snowfall total over the rated window, cm.
    pub snowfall: Threshold,
    /// Strongest resolved wind over the rated window, km/h.
    pub wind: Threshold,
    /// Prevailing temperature agreement over the rated window.
    pub agreement: AgreementRule,
}

impl Default for RatingTable {
    fn default() -> Self {
        RatingTable {
            snowfall: Threshold {
                fair: 10.0,
                poor: 30.0,
            },
            wind: Threshold {
                fair: 40.0,
                poor: 60.0,
            },
            agreement: AgreementRule {
                fair: AgreementLevel::Moderate,
                poor: AgreementLevel::Low,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub window_hours: usize,
    pub heavy_snow_cm: f64,
    pub high_wind_kmh: f64,
    pub freezing_level_change_m: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        AlertThresholds {
            window_hours: 24,
            heavy_snow_cm: 30.0,
            high_wind_kmh: 80.0,
            freezing_level_change_m: 500.0,
        }
    }
}

impl ForecastConfig {
    pub fn from_toml(contents: &str) -> anyhow::Result<ForecastConfig> {
        let config: ForecastConfig =
            toml::from_str(contents).map_err(|e| anyhow!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> anyhow::Result<ForecastConfig> {
        let contents = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;
        ForecastConfig::from_toml(&contents)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(MIN_FORECAST_DAYS..=MAX_FORECAST_DAYS).contains(&self.forecast_days) {
            bail!(
                "forecast_days must be between {} and {}, got {}",
                MIN_FORECAST_DAYS,
                MAX_FORECAST_DAYS,
                self.forecast_days
            );
        }
        if self.trend_window < 2 {
            bail!("trend_window must be at least 2, got {}", self.trend_window);
        }
        if self.alerts.window_hours == 0 {
            bail!("alerts.window_hours must be positive");
        }
        for (name, t) in [("snowfall", self.rating.snowfall), ("wind", self.rating.wind)] {
            if t.fair > t.poor {
                bail!(
                    "rating.{}: fair threshold {} exceeds poor threshold {}",
                    name,
                    t.fair,
                    t.poor
                );
            }
        }
        let p = self.snow.params();
        if p.sigma <= 0.0 || p.r_min < 0.0 || p.r_max < p.r_min {
            bail!("snow parameters out of range: {:?}", p);
        }
        Ok(())
    }
}

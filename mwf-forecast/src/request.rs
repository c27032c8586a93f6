use anyhow::bail;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ForecastConfig;

/// Forecast location; elevation is carried as metadata only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
}

impl Location {
    pub fn new(
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        elevation: Option<f64>,
    ) -> anyhow::Result<Location> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            bail!("Latitude must be between -90 and 90, got {}", latitude);
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            bail!("Longitude must be between -180 and 180, got {}", longitude);
        }
        if let Some(e) = elevation {
            if !e.is_finite() {
                bail!("Elevation must be a finite number of meters");
            }
        }
        Ok(Location {
            name: name.into(),
            latitude,
            longitude,
            elevation,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    #[default]
    Full,
    Simplified,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Full => f.write_str("full"),
            OutputMode::Simplified => f.write_str("simplified"),
        }
    }
}

impl FromStr for OutputMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "full" => Ok(OutputMode::Full),
            "simplified" => Ok(OutputMode::Simplified),
            other => bail!("Unknown output mode '{}', expected full or simplified", other),
        }
    }
}

/// Everything one pipeline run needs besides the payload.
///
/// `generated_at` is supplied by the caller so that identical input
/// produces identical output.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub location: Location,
    pub config: ForecastConfig,
    pub mode: OutputMode,
    pub generated_at: DateTime<Utc>,
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Time resolution of a series table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Hourly,
    Daily,
}

/// A weather variable carried by the ensemble payload.
///
/// Names match the payload keys exactly; lookup is by whole name only.
/// `SnowDepth` is produced by the snow engine and is never accepted from
/// a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Variable {
    #[serde(rename = "temperature_2m")]
    Temperature2m,
    #[serde(rename = "relative_humidity_2m")]
    RelativeHumidity2m,
    #[serde(rename = "dew_point_2m")]
    DewPoint2m,
    #[serde(rename = "precipitation")]
    Precipitation,
    #[serde(rename = "snowfall")]
    Snowfall,
    #[serde(rename = "cloud_cover")]
    CloudCover,
    #[serde(rename = "surface_pressure")]
    SurfacePressure,
    #[serde(rename = "temperature_850hPa")]
    Temperature850hPa,
    #[serde(rename = "freezing_level_height")]
    FreezingLevelHeight,
    #[serde(rename = "wind_speed_10m")]
    WindSpeed10m,
    #[serde(rename = "wind_direction_10m")]
    WindDirection10m,
    #[serde(rename = "wind_speed_80m")]
    WindSpeed80m,
    #[serde(rename = "wind_direction_80m")]
    WindDirection80m,
    #[serde(rename = "wind_gusts_10m")]
    WindGusts10m,
    #[serde(rename = "temperature_2m_min")]
    Temperature2mMin,
    #[serde(rename = "temperature_2m_max")]
    Temperature2mMax,
    #[serde(rename = "temperature_2m_mean")]
    Temperature2mMean,
    #[serde(rename = "precipitation_sum")]
    PrecipitationSum,
    #[serde(rename = "wind_speed_10m_mean")]
    WindSpeed10mMean,
    #[serde(rename = "wind_direction_10m_dominant")]
    WindDirection10mDominant,
    #[serde(rename = "wind_gusts_10m_mean")]
    WindGusts10mMean,
    #[serde(rename = "relative_humidity_2m_mean")]
    RelativeHumidity2mMean,
    #[serde(rename = "snow_depth")]
    SnowDepth,
}

impl Variable {
    /// Hourly variables accepted from a payload.
    pub const HOURLY: [Variable; 14] = [
        Variable::Temperature2m,
        Variable::RelativeHumidity2m,
        Variable::DewPoint2m,
        Variable::Precipitation,
        Variable::Snowfall,
        Variable::CloudCover,
        Variable::SurfacePressure,
        Variable::Temperature850hPa,
        Variable::FreezingLevelHeight,
        Variable::WindSpeed10m,
        Variable::WindDirection10m,
        Variable::WindSpeed80m,
        Variable::WindDirection80m,
        Variable::WindGusts10m,
    ];

    /// Daily variables accepted from a payload.
    pub const DAILY: [Variable; 8] = [
        Variable::Temperature2mMin,
        Variable::Temperature2mMax,
        Variable::Temperature2mMean,
        Variable::PrecipitationSum,
        Variable::WindSpeed10mMean,
        Variable::WindDirection10mDominant,
        Variable::WindGusts10mMean,
        Variable::RelativeHumidity2mMean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variable::Temperature2m => "temperature_2m",
            Variable::RelativeHumidity2m => "relative_humidity_2m",
            Variable::DewPoint2m => "dew_point_2m",
            Variable::Precipitation => "precipitation",
            Variable::Snowfall => "snowfall",
            Variable::CloudCover => "cloud_cover",
            Variable::SurfacePressure => "surface_pressure",
            Variable::Temperature850hPa => "temperature_850hPa",
            Variable::FreezingLevelHeight => "freezing_level_height",
            Variable::WindSpeed10m => "wind_speed_10m",
            Variable::WindDirection10m => "wind_direction_10m",
            Variable::WindSpeed80m => "wind_speed_80m",
            Variable::WindDirection80m => "wind_direction_80m",
            Variable::WindGusts10m => "wind_gusts_10m",
            Variable::Temperature2mMin => "temperature_2m_min",
            Variable::Temperature2mMax => "temperature_2m_max",
            Variable::Temperature2mMean => "temperature_2m_mean",
            Variable::PrecipitationSum => "precipitation_sum",
            Variable::WindSpeed10mMean => "wind_speed_10m_mean",
            Variable::WindDirection10mDominant => "wind_direction_10m_dominant",
            Variable::WindGusts10mMean => "wind_gusts_10m_mean",
            Variable::RelativeHumidity2mMean => "relative_humidity_2m_mean",
            Variable::SnowDepth => "snow_depth",
        }
    }

    pub fn resolution(&self) -> Resolution {
        if Variable::DAILY.contains(self) {
            Resolution::Daily
        } else {
            Resolution::Hourly
        }
    }

    /// Produced inside the pipeline rather than read from a payload.
    pub fn is_derived(&self) -> bool {
        matches!(self, Variable::SnowDepth)
    }

    /// Directions are angles; linear statistics on them are not meaningful.
    pub fn is_direction(&self) -> bool {
        matches!(
            self,
            Variable::WindDirection10m
                | Variable::WindDirection80m
                | Variable::WindDirection10mDominant
        )
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Variable::Temperature2m
            | Variable::DewPoint2m
            | Variable::Temperature850hPa
            | Variable::Temperature2mMin
            | Variable::Temperature2mMax
            | Variable::Temperature2mMean => "°C",
            Variable::RelativeHumidity2m
            | Variable::CloudCover
            | Variable::RelativeHumidity2mMean => "%",
            Variable::Precipitation | Variable::PrecipitationSum => "mm",
            Variable::Snowfall | Variable::SnowDepth => "cm",
            Variable::SurfacePressure => "hPa",
            Variable::FreezingLevelHeight => "m",
            Variable::WindSpeed10m
            | Variable::WindSpeed80m
            | Variable::WindGusts10m
            | Variable::WindSpeed10mMean
            | Variable::WindGusts10mMean => "km/h",
            Variable::WindDirection10m
            | Variable::WindDirection80m
            | Variable::WindDirection10mDominant => "°",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a payload key names no known input variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariable(pub String);

impl fmt::Display for UnknownVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown variable: {}", self.0)
    }
}

impl std::error::Error for UnknownVariable {}

impl FromStr for Variable {
    type Err = UnknownVariable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variable::HOURLY
            .iter()
            .chain(Variable::DAILY.iter())
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownVariable(s.to_string()))
    }
}

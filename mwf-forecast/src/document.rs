//! Forecast document model.
//!
//! All structs derive `Serialize`; maps are `BTreeMap` so field order in the
//! JSON output is stable from run to run.

use mwf_data::comparison::ModelAgreement;
use mwf_data::derived::{DerivedValue, ResolvedWind};
use mwf_data::probability::Event;
use mwf_data::snow::{SnowParams, SnowPreset};
use mwf_data::statistics::VariableStatistics;
use mwf_ensemble::quality::DataQualityNote;
use mwf_ensemble::Variable;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::alerts::Alert;
use crate::rating::OperationalConditions;
use crate::request::Location;

/// The full forecast for one location and run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDocument {
    pub metadata: Metadata,
    pub summary: ExecutiveSummary,
    pub hourly: Vec<HourlyRecord>,
    pub daily: Vec<DailyRecord>,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub location: Location,
    /// Model display names, e.g. "GFS".
    pub models: Vec<String>,
    pub ensemble_members: usize,
    pub generated_at: String,
    pub forecast_start: Option<String>,
    pub forecast_end: Option<String>,
    pub forecast_days: u32,
    pub snow_parameters: SnowParameters,
    pub capability_table_version: String,
    pub data_quality: DataQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SnowParameters {
    pub preset: SnowPreset,
    #[serde(flatten)]
    pub params: SnowParams,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQuality {
    /// "high" above 100 members, else "moderate".
    pub confidence: &'static str,
    pub invalid_snow_cells: usize,
    /// Hourly cells with exactly one valid member, summed over variables.
    pub single_member_cells: usize,
    pub notes: Vec<DataQualityNote>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutiveSummary {
    pub text: String,
    pub key_concerns: Vec<String>,
    pub operational_conditions: OperationalConditions,
    pub trends_6h: Trends,
    pub mountain: MountainTotals,
}

/// Plain-language trends over the first hours of the forecast. A field is
/// absent when its inputs are.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trends {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sky: Option<&'static str>,
}

/// Totals over the first one and two days that mountain operations watch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MountainTotals {
    pub snow_24h: Option<f64>,
    pub snow_48h: Option<f64>,
    pub max_wind_24h: Option<f64>,
    pub freezing_trend: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyRecord {
    pub time: String,
    pub statistics: BTreeMap<Variable, VariableStatistics>,
    pub probabilities: BTreeMap<Event, Option<f64>>,
    pub wind: ResolvedWind,
    pub freezing_level: DerivedValue,
    pub snow_level: DerivedValue,
    pub model_agreement: BTreeMap<Variable, ModelAgreement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecord {
    pub date: String,
    pub day_of_week: &'static str,
    pub statistics: BTreeMap<Variable, VariableStatistics>,
    pub temperature: TemperatureRange,
    pub precipitation_total: Option<f64>,
    pub snowfall: DailySnow,
    pub wind: DailyWind,
    pub freezing_level: DerivedValue,
    pub conditions: OperationalConditions,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TemperatureRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Mean across members of each member's day sum / largest hourly value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DailySnow {
    pub total: Option<f64>,
    pub max_hourly: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyWind {
    /// Strongest resolved hourly mean speed of the day.
    pub max_speed: DerivedValue,
    pub direction: Option<f64>,
}

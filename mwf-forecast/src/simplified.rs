//! Compact projection of a [`ForecastDocument`].
//!
//! Percentiles, standard deviations and model agreement are dropped; every
//! other value is copied from the full document as is.

use mwf_data::derived::Provenance;
use mwf_data::probability::Event;
use mwf_ensemble::Variable;
use serde::Serialize;

use crate::alerts::{AlertType, Severity};
use crate::document::{DailyRecord, ForecastDocument, HourlyRecord, MountainTotals, Trends};
use crate::rating::Rating;
use crate::request::OutputMode;

const HOURLY_STEPS: usize = 6;
const DAILY_STEPS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimplifiedForecast {
    pub location: String,
    pub updated: String,
    pub conditions: Rating,
    pub summary: String,
    pub key_concerns: Vec<String>,
    pub current: Option<CurrentConditions>,
    pub hourly_6h: Vec<SimpleHour>,
    pub daily_3d: Vec<SimpleDay>,
    pub trends_6h: Trends,
    pub mountain: MountainTotals,
    pub alerts: Vec<SimpleAlert>,
    pub data_quality: SimpleQuality,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub time: String,
    pub temperature: Option<f64>,
    pub temperature_range: [Option<f64>; 2],
    pub precipitation: Option<f64>,
    pub precipitation_probability: Option<f64>,
    pub snowfall: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_max: Option<f64>,
    pub wind_direction: Option<f64>,
    pub wind_source: &'static str,
    pub freezing_level: Option<f64>,
    pub freezing_level_estimated: bool,
    pub snow_level: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimpleHour {
    pub time: String,
    pub temp: Option<f64>,
    pub precip: Option<f64>,
    pub snow: Option<f64>,
    pub wind: Option<f64>,
    pub snow_probability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimpleDay {
    pub date: String,
    pub day: &'static str,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub precipitation: Option<f64>,
    pub snow: Option<f64>,
    pub precipitation_type: &'static str,
    pub wind_max: Option<f64>,
    pub wind_direction: Option<f64>,
    pub freezing_level: Option<f64>,
    pub rating: Rating,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimpleAlert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimpleQuality {
    pub models: usize,
    pub members: usize,
    pub confidence: &'static str,
}

/// Either shape of the serialized forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ForecastOutput {
    Full(Box<ForecastDocument>),
    Simplified(Box<SimplifiedForecast>),
}

impl ForecastOutput {
    pub fn new(document: ForecastDocument, mode: OutputMode) -> ForecastOutput {
        match mode {
            OutputMode::Full => ForecastOutput::Full(Box::new(document)),
            OutputMode::Simplified => ForecastOutput::Simplified(Box::new(simplify(&document))),
        }
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

fn mean_of(record: &HourlyRecord, variable: Variable) -> Option<f64> {
    record.statistics.get(&variable).and_then(|s| s.mean)
}

fn probability(record: &HourlyRecord, event: Event) -> Option<f64> {
    record.probabilities.get(&event).copied().flatten()
}

fn current(record: &HourlyRecord) -> CurrentConditions {
    let temperature = record.statistics.get(&Variable::Temperature2m);
    CurrentConditions {
        time: record.time.clone(),
        temperature: temperature.and_then(|s| s.mean),
        temperature_range: [temperature.and_then(|s| s.min), temperature.and_then(|s| s.max)],
        precipitation: mean_of(record, Variable::Precipitation),
        precipitation_probability: probability(record, Event::PrecipitationMeasurable),
        snowfall: mean_of(record, Variable::SnowDepth),
        wind_speed: record.wind.speed.value,
        wind_max: record.wind.max_speed,
        wind_direction: record.wind.direction,
        wind_source: record.wind.source.as_str(),
        freezing_level: record.freezing_level.value,
        freezing_level_estimated: record.freezing_level.provenance == Provenance::Estimated,
        snow_level: record.snow_level.value,
    }
}

fn simple_hour(record: &HourlyRecord) -> SimpleHour {
    SimpleHour {
        time: record.time.clone(),
        temp: mean_of(record, Variable::Temperature2m),
        precip: mean_of(record, Variable::Precipitation),
        snow: mean_of(record, Variable::SnowDepth),
        wind: record.wind.speed.value,
        snow_probability: probability(record, Event::SnowPresent),
    }
}

fn simple_day(day: &DailyRecord) -> SimpleDay {
    let snow = day.snowfall.total;
    let precipitation_type = if snow.unwrap_or(0.0) > 1.0 {
        "snow"
    } else if day.precipitation_total.unwrap_or(0.0) > 0.0 {
        "rain"
    } else {
        "none"
    };
    SimpleDay {
        date: day.date.clone(),
        day: day.day_of_week,
        temp_min: day.temperature.min,
        temp_max: day.temperature.max,
        precipitation: day.precipitation_total,
        snow,
        precipitation_type,
        wind_max: day.wind.max_speed.value,
        wind_direction: day.wind.direction,
        freezing_level: day.freezing_level.value,
        rating: day.conditions.rating,
        summary: day.summary.clone(),
    }
}

pub fn simplify(doc: &ForecastDocument) -> SimplifiedForecast {
    SimplifiedForecast {
        location: doc.metadata.location.name.clone(),
        updated: doc.metadata.generated_at.clone(),
        conditions: doc.summary.operational_conditions.rating,
        summary: doc.summary.text.clone(),
        key_concerns: doc.summary.key_concerns.clone(),
        current: doc.hourly.first().map(current),
        hourly_6h: doc.hourly.iter().take(HOURLY_STEPS).map(simple_hour).collect(),
        daily_3d: doc.daily.iter().take(DAILY_STEPS).map(simple_day).collect(),
        trends_6h: doc.summary.trends_6h.clone(),
        mountain: doc.summary.mountain.clone(),
        alerts: doc
            .alerts
            .iter()
            .map(|a| SimpleAlert {
                alert_type: a.alert_type,
                severity: a.severity,
                message: a.message.clone(),
            })
            .collect(),
        data_quality: SimpleQuality {
            models: doc.metadata.models.len(),
            members: doc.metadata.ensemble_members,
            confidence: doc.metadata.data_quality.confidence,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::run_pipeline;
    use crate::config::ForecastConfig;
    use crate::request::{Location, RunRequest};
    use chrono::{TimeZone, Utc};
    use mwf_ensemble::payload::RawEnsembleResponse;

    fn document() -> ForecastDocument {
        let raw =
            RawEnsembleResponse::from_json(include_str!("../../fixtures/ensemble_sample.json"))
                .unwrap();
        let request = RunRequest {
            location: Location::new("Stevens Pass", 47.74, -121.09, None).unwrap(),
            config: ForecastConfig::default(),
            mode: OutputMode::Simplified,
            generated_at: Utc.with_ymd_and_hms(2025, 1, 15, 6, 0, 0).unwrap(),
        };
        run_pipeline(&raw, &request).unwrap()
    }

    #[test]
    fn test_simplify_copies_values() {
        let doc = document();
        let s = simplify(&doc);
        assert_eq!(s.location, "Stevens Pass");
        assert_eq!(s.updated, "2025-01-15T06:00:00Z");
        assert_eq!(s.hourly_6h.len(), 6);
        assert_eq!(s.daily_3d.len(), 2);
        assert_eq!(s.data_quality.models, 3);
        assert_eq!(s.data_quality.members, 9);

        let current = s.current.as_ref().unwrap();
        let first = &doc.hourly[0];
        assert_eq!(current.temperature, first.statistics[&Variable::Temperature2m].mean);
        assert_eq!(current.wind_speed, first.wind.speed.value);
        assert_eq!(current.wind_source, "80m");
        assert!(!current.freezing_level_estimated);
        assert_eq!(s.daily_3d[0].snow, doc.daily[0].snowfall.total);
        assert_eq!(s.daily_3d[0].precipitation_type, "snow");
    }

    #[test]
    fn test_simplified_json_drops_spread() {
        let output = ForecastOutput::new(document(), OutputMode::Simplified);
        let json = output.to_json(false).unwrap();
        assert!(!json.contains("p90"));
        assert!(!json.contains("std_dev"));
        assert!(!json.contains("model_agreement"));

        let full = ForecastOutput::new(document(), OutputMode::Full).to_json(false).unwrap();
        assert!(full.contains("p90"));
        assert!(full.contains("model_agreement"));
    }
}

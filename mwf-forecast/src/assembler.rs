//! Merge every pipeline stage into a [`ForecastDocument`].
//!
//! After ingestion and the per-member snow pass, statistics, event
//! probabilities, model comparison and the fallback resolver run as
//! independent rayon tasks over the hourly table; `rayon::join` is the
//! barrier before records are assembled.

use chrono::{NaiveDate, SecondsFormat};
use log::{info, warn};
use mwf_data::comparison::{compare_variables, ModelAgreement};
use mwf_data::derived::{resolve_all, DerivedValue, Provenance, ResolvedHour};
use mwf_data::probability::{all_events, Event};
use mwf_data::snow::apply_snow_depth;
use mwf_data::statistics::{table_statistics, VariableStatistics};
use mwf_ensemble::capability::CAPABILITY_TABLE_VERSION;
use mwf_ensemble::ingest::{ingest, IngestOptions};
use mwf_ensemble::payload::RawEnsembleResponse;
use mwf_ensemble::quality::{DataQualityNote, NoteKind};
use mwf_ensemble::{EnsembleSeries, SeriesTable, Variable};
use std::collections::BTreeMap;
use std::ops::Range;

use crate::alerts::evaluate_alerts;
use crate::document::{
    DailyRecord, DailyWind, DataQuality, ExecutiveSummary, ForecastDocument, HourlyRecord,
    Metadata, SnowParameters, TemperatureRange,
};
use crate::rating::{prevailing_agreement, rate, RatingInputs};
use crate::request::RunRequest;
use crate::summary::{
    daily_summary, executive_text, key_concerns, mountain_totals, trends, TREND_HOURS,
};
use crate::window::{leading, max_member_speed, snow_window};

/// Variables whose inter-model agreement is reported every hour.
pub const AGREEMENT_VARIABLES: [Variable; 3] = [
    Variable::Temperature2m,
    Variable::Precipitation,
    Variable::WindSpeed10m,
];

/// Above this many members the document reports high confidence.
pub const HIGH_CONFIDENCE_MEMBERS: usize = 100;

type StatsByVariable = BTreeMap<Variable, Vec<VariableStatistics>>;

/// Ingest a raw payload and assemble the forecast document.
pub fn run_pipeline(
    raw: &RawEnsembleResponse,
    request: &RunRequest,
) -> anyhow::Result<ForecastDocument> {
    request.config.validate()?;
    let options = IngestOptions {
        models: request.config.models.clone(),
        forecast_days: Some(request.config.forecast_days),
    };
    let series = ingest(raw, &options)?;
    Ok(assemble(series, request))
}

/// Assemble a document from an already ingested series.
pub fn assemble(mut series: EnsembleSeries, request: &RunRequest) -> ForecastDocument {
    let config = &request.config;
    let params = config.snow.params();
    let mut notes = std::mem::take(&mut series.notes);

    let invalid_snow_cells = match apply_snow_depth(&mut series.hourly, &params) {
        Ok(n) => n,
        Err(e) => {
            warn!("Snow depth derivation failed: {}", e);
            notes.push(
                DataQualityNote::new(NoteKind::SchemaError, e.to_string())
                    .with_variable("snow_depth"),
            );
            0
        }
    };
    if invalid_snow_cells > 0 {
        notes.push(
            DataQualityNote::new(
                NoteKind::InvalidSnowInput,
                format!("{} member cells had physically invalid snow inputs", invalid_snow_cells),
            )
            .with_variable("snow_depth"),
        );
    }

    let hourly = &series.hourly;
    let window = config.trend_window;
    let ((stats, events), (agreement, resolved)) = rayon::join(
        || rayon::join(|| table_statistics(hourly, window), || all_events(hourly)),
        || {
            rayon::join(
                || compare_variables(hourly, &AGREEMENT_VARIABLES),
                || resolve_all(hourly),
            )
        },
    );
    let daily_stats = table_statistics(&series.daily, window);
    let (single_member_cells, degraded) = single_member_notes(hourly, &stats);
    notes.extend(degraded);

    let hourly_records = hourly_records(hourly, &stats, &events, &agreement, &resolved);
    let daily_records = daily_records(
        hourly,
        &series.daily,
        &stats,
        &daily_stats,
        &agreement,
        &resolved,
        request,
    );
    let alerts = evaluate_alerts(hourly, &resolved, &config.alerts);

    let first_day = leading(hourly.len(), 24);
    let max_hourly_snow = stats
        .get(&Variable::SnowDepth)
        .and_then(|s| s[first_day.clone()].iter().filter_map(|v| v.max).reduce(f64::max));
    let conditions = rate(
        &RatingInputs {
            snowfall_cm: snow_window(hourly, first_day.clone()).total,
            max_wind_kmh: max_member_speed(&resolved[first_day.clone()]),
            agreement: agreement_over(&agreement, first_day.clone()),
        },
        &config.rating,
    );
    let summary = ExecutiveSummary {
        text: executive_text(&daily_records),
        key_concerns: key_concerns(max_hourly_snow, max_member_speed(&resolved[first_day])),
        operational_conditions: conditions,
        trends_6h: trends(&hourly_records, TREND_HOURS),
        mountain: mountain_totals(hourly, &resolved),
    };

    let members = series.member_count();
    let span_table = if hourly.is_empty() { &series.daily } else { hourly };
    let metadata = Metadata {
        location: request.location.clone(),
        models: series
            .models()
            .iter()
            .map(|m| m.display_name().to_string())
            .collect(),
        ensemble_members: members,
        generated_at: request
            .generated_at
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        forecast_start: span_table.axis().first().map(mwf_utils::times::format_hour),
        forecast_end: span_table.axis().last().map(mwf_utils::times::format_hour),
        forecast_days: config.forecast_days,
        snow_parameters: SnowParameters {
            preset: config.snow.preset,
            params,
        },
        capability_table_version: CAPABILITY_TABLE_VERSION.to_string(),
        data_quality: DataQuality {
            confidence: if members > HIGH_CONFIDENCE_MEMBERS {
                "high"
            } else {
                "moderate"
            },
            invalid_snow_cells,
            single_member_cells,
            notes,
        },
    };

    info!(
        "Assembled forecast for {}: {} hourly, {} daily records, {} alerts, rating {}",
        request.location.name,
        hourly_records.len(),
        daily_records.len(),
        alerts.len(),
        summary.operational_conditions.rating
    );

    ForecastDocument {
        metadata,
        summary,
        hourly: hourly_records,
        daily: daily_records,
        alerts,
    }
}

/// Cells backed by a single valid member: a mean, but no spread measures.
/// One note per affected variable; returns the total cell count as well.
fn single_member_notes(
    table: &SeriesTable,
    stats: &StatsByVariable,
) -> (usize, Vec<DataQualityNote>) {
    let mut total = 0;
    let mut notes = Vec::new();
    for (variable, series) in stats {
        if variable.is_direction() {
            continue;
        }
        let cells = series.iter().filter(|s| s.member_count == 1).count();
        if cells == 0 {
            continue;
        }
        total += cells;
        let message = if table.member_count(*variable) == 1 {
            "single member: standard deviation and percentiles unavailable".to_string()
        } else {
            format!(
                "{} of {} timesteps had a single valid member: no spread measures",
                cells,
                series.len()
            )
        };
        notes.push(
            DataQualityNote::new(NoteKind::InsufficientMembers, message)
                .with_variable(variable.as_str()),
        );
    }
    (total, notes)
}

fn hourly_records(
    table: &SeriesTable,
    stats: &StatsByVariable,
    events: &BTreeMap<Event, Vec<Option<f64>>>,
    agreement: &BTreeMap<Variable, Vec<ModelAgreement>>,
    resolved: &[ResolvedHour],
) -> Vec<HourlyRecord> {
    table
        .axis()
        .iter()
        .zip(resolved)
        .enumerate()
        .map(|(idx, (time, r))| HourlyRecord {
            time: mwf_utils::times::format_hour(time),
            statistics: stats.iter().map(|(v, s)| (*v, s[idx].clone())).collect(),
            probabilities: events.iter().map(|(e, p)| (*e, p[idx])).collect(),
            wind: r.wind,
            freezing_level: r.freezing_level,
            snow_level: r.snow_level,
            model_agreement: agreement
                .iter()
                .map(|(v, a)| (*v, a[idx].clone()))
                .collect(),
        })
        .collect()
}

/// Contiguous hourly index ranges per calendar date.
fn day_ranges(table: &SeriesTable) -> Vec<(NaiveDate, Range<usize>)> {
    let mut ranges: Vec<(NaiveDate, Range<usize>)> = Vec::new();
    for (idx, t) in table.axis().iter().enumerate() {
        match ranges.last_mut() {
            Some((date, range)) if *date == t.date() => range.end = idx + 1,
            _ => ranges.push((t.date(), idx..idx + 1)),
        }
    }
    ranges
}

fn agreement_over(
    agreement: &BTreeMap<Variable, Vec<ModelAgreement>>,
    range: Range<usize>,
) -> Option<mwf_data::comparison::AgreementLevel> {
    let series = agreement.get(&Variable::Temperature2m)?;
    prevailing_agreement(series.get(range)?.iter().map(|a| a.agreement))
}

fn stat_mean(stats: &StatsByVariable, variable: Variable, idx: usize) -> Option<f64> {
    stats.get(&variable)?.get(idx)?.mean
}

fn daily_records(
    hourly: &SeriesTable,
    daily: &SeriesTable,
    hourly_stats: &StatsByVariable,
    daily_stats: &StatsByVariable,
    agreement: &BTreeMap<Variable, Vec<ModelAgreement>>,
    resolved: &[ResolvedHour],
    request: &RunRequest,
) -> Vec<DailyRecord> {
    let hour_ranges: BTreeMap<NaiveDate, Range<usize>> = day_ranges(hourly).into_iter().collect();
    let dates: Vec<(NaiveDate, Option<usize>)> = if daily.is_empty() {
        hour_ranges.keys().map(|d| (*d, None)).collect()
    } else {
        daily
            .axis()
            .iter()
            .enumerate()
            .map(|(i, t)| (t.date(), Some(i)))
            .collect()
    };

    dates
        .into_iter()
        .map(|(date, daily_idx)| {
            let hours = hour_ranges.get(&date).cloned().unwrap_or(0..0);
            let day_resolved = &resolved[hours.clone()];

            let statistics: BTreeMap<Variable, VariableStatistics> = match daily_idx {
                Some(i) => daily_stats.iter().map(|(v, s)| (*v, s[i].clone())).collect(),
                None => BTreeMap::new(),
            };

            let hourly_temps: Vec<f64> = hours
                .clone()
                .filter_map(|i| stat_mean(hourly_stats, Variable::Temperature2m, i))
                .collect();
            let temperature = TemperatureRange {
                min: daily_idx
                    .and_then(|i| stat_mean(daily_stats, Variable::Temperature2mMin, i))
                    .or_else(|| hourly_temps.iter().copied().reduce(f64::min)),
                max: daily_idx
                    .and_then(|i| stat_mean(daily_stats, Variable::Temperature2mMax, i))
                    .or_else(|| hourly_temps.iter().copied().reduce(f64::max)),
            };

            let hourly_precip: Vec<f64> = hours
                .clone()
                .filter_map(|i| stat_mean(hourly_stats, Variable::Precipitation, i))
                .collect();
            let precipitation_total = daily_idx
                .and_then(|i| stat_mean(daily_stats, Variable::PrecipitationSum, i))
                .or_else(|| (!hourly_precip.is_empty()).then(|| hourly_precip.iter().sum()));

            let snowfall = snow_window(hourly, hours.clone());
            let wind = daily_wind(day_resolved);
            let freezing_level = daily_freezing_level(day_resolved);
            let conditions = rate(
                &RatingInputs {
                    snowfall_cm: snowfall.total,
                    max_wind_kmh: max_member_speed(day_resolved),
                    agreement: agreement_over(agreement, hours),
                },
                &request.config.rating,
            );
            let summary = daily_summary(&temperature, precipitation_total, snowfall.total);
            let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();

            DailyRecord {
                date: mwf_utils::times::format_date(&midnight),
                day_of_week: mwf_utils::times::day_of_week(&midnight),
                statistics,
                temperature,
                precipitation_total,
                snowfall,
                wind,
                freezing_level,
                conditions,
                summary,
            }
        })
        .collect()
}

/// The strongest resolved hour of the day, with its provenance and direction.
fn daily_wind(hours: &[ResolvedHour]) -> DailyWind {
    hours
        .iter()
        .filter(|h| h.wind.speed.is_available())
        .max_by(|a, b| {
            let (x, y) = (a.wind.speed.value, b.wind.speed.value);
            x.unwrap_or(f64::MIN).total_cmp(&y.unwrap_or(f64::MIN))
        })
        .map(|h| DailyWind {
            max_speed: h.wind.speed,
            direction: h.wind.direction,
        })
        .unwrap_or(DailyWind {
            max_speed: DerivedValue::unavailable(),
            direction: None,
        })
}

/// Mean of the resolved hourly freezing levels; estimated if any
/// contributing hour was.
fn daily_freezing_level(hours: &[ResolvedHour]) -> DerivedValue {
    let available: Vec<&DerivedValue> = hours
        .iter()
        .map(|h| &h.freezing_level)
        .filter(|f| f.is_available())
        .collect();
    let values: Vec<f64> = available.iter().filter_map(|f| f.value).collect();
    match mwf_data::statistics::mean(&values) {
        Some(m) if available.iter().any(|f| f.provenance == Provenance::Estimated) => {
            DerivedValue::estimated(m)
        }
        Some(m) => DerivedValue::direct(m),
        None => DerivedValue::unavailable(),
    }
}

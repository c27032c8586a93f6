//! Hourly CSV export of a forecast document.

use anyhow::anyhow;
use log::info;
use mwf_data::probability::Event;
use mwf_ensemble::Variable;
use mwf_forecast::document::HourlyRecord;
use mwf_forecast::{ForecastDocument, OutputMode};
use mwf_utils::rounding::round_opt;
use std::io;

use crate::forecast::{build_request, load_payload, run_blocking};
use crate::RunArgs;

const HEADER: [&str; 14] = [
    "time",
    "temperature_mean",
    "temperature_min",
    "temperature_max",
    "precipitation_mean",
    "precipitation_probability",
    "snow_mean",
    "snow_p90",
    "wind_speed",
    "wind_source",
    "wind_direction",
    "freezing_level",
    "freezing_level_source",
    "snow_level",
];

fn cell(value: Option<f64>) -> String {
    round_opt(value, 2).map(|v| v.to_string()).unwrap_or_default()
}

fn row(record: &HourlyRecord) -> Vec<String> {
    let stat = |v: Variable| record.statistics.get(&v);
    let temp = stat(Variable::Temperature2m);
    let snow = stat(Variable::SnowDepth);
    vec![
        record.time.clone(),
        cell(temp.and_then(|s| s.mean)),
        cell(temp.and_then(|s| s.min)),
        cell(temp.and_then(|s| s.max)),
        cell(stat(Variable::Precipitation).and_then(|s| s.mean)),
        cell(
            record
                .probabilities
                .get(&Event::PrecipitationMeasurable)
                .copied()
                .flatten(),
        ),
        cell(snow.and_then(|s| s.mean)),
        cell(snow.and_then(|s| s.p90)),
        cell(record.wind.speed.value),
        record.wind.source.as_str().to_string(),
        cell(record.wind.direction),
        cell(record.freezing_level.value),
        record.freezing_level.provenance.as_str().to_string(),
        cell(record.snow_level.value),
    ]
}

/// Write one row per hourly record, with a header line.
pub fn write_hourly_csv<W: io::Write>(
    document: &ForecastDocument,
    writer: W,
) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;
    for record in &document.hourly {
        wtr.write_record(row(record))?;
    }
    wtr.flush()?;
    Ok(())
}

pub async fn run_hourly_csv(run: &RunArgs, output_csv: &str) -> anyhow::Result<()> {
    let request = build_request(run, OutputMode::Full)?;
    let raw = load_payload(&run.input).await?;
    let document = run_blocking(raw, request, run.timeout_secs).await?;

    let file = std::fs::File::create(output_csv)
        .map_err(|e| anyhow!("Failed to create {}: {}", output_csv, e))?;
    write_hourly_csv(&document, file)?;
    info!("Wrote {} hourly rows to {}", document.hourly.len(), output_csv);
    Ok(())
}

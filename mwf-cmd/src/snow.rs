//! Single-scenario snow formula evaluation.

use anyhow::anyhow;
use log::info;
use mwf_data::snow::{calculate_snowfall, SnowEstimate, SnowInput, SnowPreset};

pub fn evaluate(
    temperature: f64,
    humidity: f64,
    precipitation: f64,
    hours: Option<f64>,
    preset: &str,
) -> anyhow::Result<SnowEstimate> {
    let preset: SnowPreset = preset.parse().map_err(|e| anyhow!("{}", e))?;
    let input = SnowInput {
        temperature,
        relative_humidity: humidity,
        precipitation,
        duration_hours: hours,
    };
    calculate_snowfall(&input, &preset.params()).map_err(|e| anyhow!("Invalid snow inputs: {}", e))
}

pub fn run_snow(
    temperature: f64,
    humidity: f64,
    precipitation: f64,
    hours: Option<f64>,
    preset: &str,
) -> anyhow::Result<()> {
    let estimate = evaluate(temperature, humidity, precipitation, hours, preset)?;
    info!(
        "{} preset: {:.1}°C, {:.0}% RH, {:.1} mm -> {:.2} cm",
        preset, temperature, humidity, precipitation, estimate.snowfall_cm
    );
    println!("{}", serde_json::to_string_pretty(&estimate)?);
    Ok(())
}

//! Forecast command: payload in, forecast document out.

use anyhow::{anyhow, bail};
use chrono::{DateTime, Utc};
use log::info;
use mwf_ensemble::payload::RawEnsembleResponse;
use mwf_ensemble::Model;
use mwf_forecast::{
    ForecastConfig, ForecastDocument, ForecastOutput, Location, OutputMode, RunRequest,
};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncReadExt;

use crate::RunArgs;

/// Read a payload from a file, or from stdin when `input` is "-".
pub async fn load_payload(input: &str) -> anyhow::Result<RawEnsembleResponse> {
    let body = if input == "-" {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        tokio::fs::read_to_string(input)
            .await
            .map_err(|e| anyhow!("Failed to read {}: {}", input, e))?
    };
    RawEnsembleResponse::from_json(&body)
        .map_err(|e| anyhow!("Failed to parse payload {}: {}", input, e))
}

/// Merge the config file with command-line overrides.
pub fn build_request(run: &RunArgs, mode: OutputMode) -> anyhow::Result<RunRequest> {
    let mut config = match &run.config {
        Some(path) => ForecastConfig::load(Path::new(path))?,
        None => ForecastConfig::default(),
    };
    if let Some(days) = run.days {
        config.forecast_days = days;
    }
    if let Some(models) = &run.models {
        let parsed = models
            .iter()
            .map(|m| m.parse::<Model>().map_err(|e| anyhow!("{}", e)))
            .collect::<anyhow::Result<Vec<Model>>>()?;
        if parsed.is_empty() {
            bail!("--models needs at least one model");
        }
        config.models = Some(parsed);
    }
    config.validate()?;

    let generated_at = match &run.generated_at {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map_err(|e| anyhow!("Invalid --generated-at '{}': {}", s, e))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    Ok(RunRequest {
        location: Location::new(run.name.clone(), run.lat, run.lon, run.elevation)?,
        config,
        mode,
        generated_at,
    })
}

/// Run the pipeline on a blocking thread, optionally bounded by a timeout.
/// On timeout nothing is returned and the command fails.
pub async fn run_blocking(
    raw: RawEnsembleResponse,
    request: RunRequest,
    timeout_secs: Option<u64>,
) -> anyhow::Result<ForecastDocument> {
    let task = tokio::task::spawn_blocking(move || mwf_forecast::run_pipeline(&raw, &request));
    let document = match timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), task)
            .await
            .map_err(|_| anyhow!("Forecast pipeline timed out after {} seconds", secs))???,
        None => task.await??,
    };
    Ok(document)
}

pub async fn run_forecast(
    run: &RunArgs,
    simplified: bool,
    output: Option<&str>,
    pretty: bool,
) -> anyhow::Result<()> {
    let mode = if simplified {
        OutputMode::Simplified
    } else {
        OutputMode::Full
    };
    let request = build_request(run, mode)?;
    let raw = load_payload(&run.input).await?;
    info!(
        "Forecasting {} ({}, {}) from {} models in {} mode",
        request.location.name,
        request.location.latitude,
        request.location.longitude,
        raw.models.len(),
        mode
    );

    let document = run_blocking(raw, request, run.timeout_secs).await?;
    let json = ForecastOutput::new(document, mode).to_json(pretty)?;

    match output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .map_err(|e| anyhow!("Failed to write {}: {}", path, e))?;
            info!("Forecast written to {}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../../fixtures/ensemble_sample.json");

    fn args() -> RunArgs {
        RunArgs {
            input: "-".to_string(),
            config: None,
            name: "Alta".to_string(),
            lat: 40.59,
            lon: -111.64,
            elevation: Some(2600.0),
            days: None,
            models: None,
            generated_at: Some("2025-01-15T06:00:00Z".to_string()),
            timeout_secs: None,
        }
    }

    #[test]
    fn test_build_request_overrides() {
        let mut run = args();
        run.days = Some(2);
        run.models = Some(vec!["gem_global".to_string(), "60".to_string()]);
        let request = build_request(&run, OutputMode::Full).unwrap();
        assert_eq!(request.config.forecast_days, 2);
        assert_eq!(
            request.config.models,
            Some(vec![Model::GemGlobal, Model::EcmwfIfs025])
        );
        assert_eq!(request.generated_at.to_rfc3339(), "2025-01-15T06:00:00+00:00");
    }

    #[test]
    fn test_build_request_rejects_bad_input() {
        let mut run = args();
        run.models = Some(vec!["gfs".to_string()]);
        assert!(build_request(&run, OutputMode::Full).is_err());

        let mut run = args();
        run.days = Some(30);
        assert!(build_request(&run, OutputMode::Full).is_err());

        let mut run = args();
        run.lat = 95.0;
        assert!(build_request(&run, OutputMode::Full).is_err());
    }

    #[tokio::test]
    async fn test_run_blocking() {
        let raw = RawEnsembleResponse::from_json(SAMPLE).unwrap();
        let request = build_request(&args(), OutputMode::Full).unwrap();
        let doc = run_blocking(raw, request, Some(60)).await.unwrap();
        assert_eq!(doc.hourly.len(), 48);
        assert_eq!(doc.metadata.location.name, "Alta");
    }
}

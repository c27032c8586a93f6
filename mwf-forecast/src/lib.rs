//! Forecast assembly for mountain ensemble forecasts.
//!
//! [`assembler::run_pipeline`] takes a raw payload and a [`RunRequest`]
//! through ingestion, snow derivation, statistics, probabilities, model
//! comparison and the fallback resolver, and returns a
//! [`ForecastDocument`] with ratings, summaries and alerts attached.

pub mod alerts;
pub mod assembler;
pub mod config;
pub mod document;
pub mod rating;
pub mod request;
pub mod simplified;
pub mod summary;
pub mod window;

pub use assembler::{assemble, run_pipeline};
pub use config::ForecastConfig;
pub use document::ForecastDocument;
pub use request::{Location, OutputMode, RunRequest};
pub use simplified::{simplify, ForecastOutput, SimplifiedForecast};

use mwf_ensemble::payload::RawEnsembleResponse;

/// Run the pipeline and shape the result for the request's output mode.
pub fn forecast(
    raw: &RawEnsembleResponse,
    request: &RunRequest,
) -> anyhow::Result<ForecastOutput> {
    let document = run_pipeline(raw, request)?;
    Ok(ForecastOutput::new(document, request.mode))
}

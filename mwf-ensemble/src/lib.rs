//! Core types for multi-model ensemble forecasts.
//!
//! Raw payloads arrive keyed by model identifier with per-member arrays for
//! each variable. [`ingest::ingest`] resolves them against the static
//! [`capability`] table into a columnar [`series::EnsembleSeries`].

pub mod capability;
pub mod error;
pub mod ingest;
pub mod model;
pub mod payload;
pub mod quality;
pub mod series;
pub mod variable;

pub use error::{EnsembleError, Result};
pub use model::Model;
pub use series::{EnsembleSeries, MemberColumn, SeriesTable};
pub use variable::{Resolution, Variable};

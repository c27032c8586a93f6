//! Command implementations for the mountain weather forecast CLI.
//!
//! Each subcommand reads an ensemble payload (a file, or stdin via `-`),
//! runs the pipeline off the async runtime and writes JSON or CSV.

use clap::{Args, Subcommand};

pub mod export;
pub mod forecast;
pub mod snow;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Ensemble payload JSON file, or "-" for stdin
    #[arg(short, long)]
    pub input: String,

    /// TOML configuration file (models, snow preset, rating table, alerts)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Location name shown in the forecast
    #[arg(long, default_value = "Unnamed location")]
    pub name: String,

    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Elevation in meters (metadata only)
    #[arg(long)]
    pub elevation: Option<f64>,

    /// Forecast days to keep, overrides the config file
    #[arg(short, long)]
    pub days: Option<u32>,

    /// Comma-separated model identifiers, overrides the config file
    #[arg(short, long, value_delimiter = ',')]
    pub models: Option<Vec<String>>,

    /// Generation time (RFC 3339); defaults to now
    #[arg(long)]
    pub generated_at: Option<String>,

    /// Abort the pipeline after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build a forecast document from an ensemble payload
    Forecast {
        #[command(flatten)]
        run: RunArgs,

        /// Emit the compact projection instead of the full document
        #[arg(long)]
        simplified: bool,

        /// Output path for the JSON document (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,

        #[arg(long)]
        pretty: bool,
    },

    /// Write the hourly summary table of a forecast as CSV
    HourlyCsv {
        #[command(flatten)]
        run: RunArgs,

        /// Output path for the CSV table
        #[arg(short, long)]
        output_csv: String,
    },

    /// Evaluate the snow formula for a single set of inputs
    Snow {
        /// Air temperature in °C
        #[arg(short, long, allow_hyphen_values = true)]
        temperature: f64,

        /// Relative humidity in %
        #[arg(short = 'r', long)]
        humidity: f64,

        /// Liquid precipitation in mm
        #[arg(short, long)]
        precipitation: f64,

        /// Accumulation period in hours
        #[arg(long)]
        hours: Option<f64>,

        /// default, maritime, continental or arctic
        #[arg(long, default_value = "default")]
        preset: String,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Forecast {
            run,
            simplified,
            output,
            pretty,
        } => forecast::run_forecast(&run, simplified, output.as_deref(), pretty).await,
        Command::HourlyCsv { run, output_csv } => export::run_hourly_csv(&run, &output_csv).await,
        Command::Snow {
            temperature,
            humidity,
            precipitation,
            hours,
            preset,
        } => snow::run_snow(temperature, humidity, precipitation, hours, &preset),
    }
}

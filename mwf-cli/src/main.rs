//! MWF CLI - Command line tool for mountain ensemble weather forecasts.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "mwf-cli",
    version,
    about = "Mountain ensemble weather forecast toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: mwf_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    mwf_cmd::run(cli.command).await
}

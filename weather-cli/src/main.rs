//! Binary crate for the `weather` command-line client.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Talking to the weather backend
//! - Keeping the per-run search session
//! - Human-friendly output formatting

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod api;
mod cli;
mod render;
mod session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr so they never mix with rendered output.
    let filter = EnvFilter::try_from_env("WEATHER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}

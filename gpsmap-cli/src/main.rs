//! Binary crate for the `gpsmap` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive date picking and configuration
//! - Writing rendered maps and human-friendly summaries

use clap::Parser;
use tracing_subscriber::filter::EnvFilter;

mod cli;
mod prompt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("GPSMAP_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}

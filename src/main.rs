use anyhow::Context;
use clap::Parser;
use log::{error, info};
use std::process;

use etf_compare::cli::Cli;
use etf_compare::config::Config;
use etf_compare::pipeline;

#[tokio::main]
async fn main() {
    // Initialize the logger
    env_logger::init();
    info!("Logger initialized. Starting the ETF comparison...");

    let cli = Cli::parse();
    if let Err(e) = run(&cli).await {
        error!("Run failed: {:#}", e);
        eprintln!("Błąd: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli
        .apply(Config::from_env().context("Failed to load configuration")?)
        .context("Invalid command line")?;
    let summary = pipeline::run(&config).await.context("Failed to generate ETF chart")?;
    info!("Done: {} tickers, chart at {}", summary.finals.len(), summary.output.display());
    Ok(())
}

// src/bin/gem_chart.rs
use etf_compare::config::{Config, ADAPTIVE_OUTPUT};
use etf_compare::pipeline;
use etf_compare::services::layout::ScaleMode;
use log::{error, info};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    info!("Generating adaptive-scale ETF chart...");

    let config = Config {
        scale: ScaleMode::adaptive(),
        align_start: true,
        output_path: PathBuf::from(ADAPTIVE_OUTPUT),
        ..Config::from_env()?
    };

    match pipeline::run(&config).await {
        Ok(summary) => {
            info!("SUCCESS: chart written to {}", summary.output.display());
        }
        Err(e) => {
            error!("ERROR: Failed to generate chart: {}", e);
            eprintln!("Błąd: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}

// src/bin/test_yahoo_history.rs
use chrono::Utc;
use etf_compare::config::Config;
use etf_compare::services::market_data::fetch_price_table;
use log::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::from_env()?;
    let (start, end) = config.window(Utc::now());
    info!("Testing Yahoo Finance daily history from {} to {}", start, end);

    let table = fetch_price_table(&config, start, end).await?;
    println!("Dates: {} ({:?} .. {:?})", table.len(), table.dates.first(), table.dates.last());
    for (ticker, values) in &table.columns {
        let present = values.iter().filter(|v| v.is_some()).count();
        let first = values.iter().flatten().next();
        let last = values.iter().rev().flatten().next();
        println!(
            "{:<10} present {:>3}/{:<3} first {:?} last {:?}",
            ticker,
            present,
            values.len(),
            first,
            last
        );
    }
    Ok(())
}

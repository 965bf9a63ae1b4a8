// src/pipeline.rs
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::info;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::models::{FinalReturn, PriceTable};
use crate::services::layout::ChartLayout;
use crate::services::market_data::fetch_price_table;
use crate::services::returns::{compute_returns, final_returns, max_return};
use crate::services::{report, writer};

#[derive(Debug)]
pub struct RunSummary {
    pub output: PathBuf,
    pub finals: Vec<FinalReturn>,
}

/// Normalizes the prices and lays the chart out. No I/O.
pub fn prepare(config: &Config, prices: &PriceTable, now: DateTime<Tz>) -> Result<(Vec<FinalReturn>, ChartLayout)> {
    let returns = compute_returns(prices, config.align_start)?;
    let finals = final_returns(&returns, &config.colors);
    let layout = ChartLayout::build(&returns, &finals, config.scale, max_return(&returns), now);
    info!(
        "Prepared {} series over {} dates, y range {:?}",
        layout.series.len(),
        returns.dates.len(),
        layout.y_range
    );
    Ok((finals, layout))
}

/// Fetch, normalize, report, render and write.
pub async fn run(config: &Config) -> Result<RunSummary> {
    let (start, end) = config.window(Utc::now());
    info!("Fetching {} tickers from {} to {}", config.colors.len(), start, end);
    let prices = fetch_price_table(config, start, end).await?;

    let (finals, layout) = prepare(config, &prices, end)?;
    report::print_report(&finals);

    let output = writer::write_chart(&layout, &config.output_path)?;
    println!("Wykres zapisany jako: {}", output.display());
    Ok(RunSummary { output, finals })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChartError;
    use crate::models::Ticker;
    use crate::services::layout::{AxisSide, ScaleMode};
    use chrono::{NaiveDate, TimeZone};

    fn prices() -> PriceTable {
        let first = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
        let dates = (0..4).map(|i| first + chrono::Duration::days(i)).collect();
        PriceTable {
            dates,
            columns: vec![
                (Ticker::new("EIMI.L"), vec![None, Some(40.0), Some(44.0), Some(52.0)]),
                (Ticker::new("CNDX.L"), vec![Some(1000.0), Some(1010.0), None, Some(950.0)]),
                (Ticker::new("CBU0.L"), vec![Some(100.0), Some(100.0), Some(101.0), Some(102.0)]),
                (Ticker::new("IB01.L"), vec![Some(110.0), Some(110.1), Some(110.2), Some(110.3)]),
            ],
        }
    }

    fn now() -> DateTime<Tz> {
        chrono_tz::Europe::Warsaw.with_ymd_and_hms(2025, 10, 23, 20, 0, 0).unwrap()
    }

    #[test]
    fn fixed_run_rejects_missing_baseline() {
        let config = Config::default();
        let err = prepare(&config, &prices(), now()).unwrap_err();
        assert!(matches!(err, ChartError::Normalization { ref ticker, .. } if ticker == "EIMI.L"));
    }

    #[test]
    fn adaptive_run_aligns_start_and_annotates() {
        let config = Config {
            scale: ScaleMode::adaptive(),
            align_start: true,
            ..Config::default()
        };
        let (finals, layout) = prepare(&config, &prices(), now()).unwrap();

        let tickers: Vec<String> = finals.iter().map(|f| f.ticker.to_string()).collect();
        assert_eq!(tickers, vec!["EIMI.L", "CNDX.L", "CBU0.L", "IB01.L"]);
        assert!((finals[0].value - 30.0).abs() < 1e-9);
        assert!((finals[1].value - (950.0 / 1010.0 - 1.0) * 100.0).abs() < 1e-9);

        assert_eq!(layout.y_axis, AxisSide::Right);
        assert!((layout.y_range.1 - (30.0 + 55.0 * 0.15)).abs() < 1e-9);
        assert_eq!(layout.annotations.len(), 4);
        assert_eq!(layout.series[0].points.len(), 3);
        assert_eq!(layout.series[0].label, "EIMI.L: +30.00%");
    }
}

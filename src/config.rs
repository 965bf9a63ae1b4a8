// src/config.rs
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use log::info;
use std::env;
use std::path::PathBuf;

use crate::error::{ChartError, Result};
use crate::models::{ColorMap, Ticker};
use crate::services::layout::ScaleMode;

pub const WINDOW_DAYS: i64 = 365;
pub const DEFAULT_OUTPUT: &str = "etfs_rok.png";
pub const ADAPTIVE_OUTPUT: &str = "gem.png";
pub const DEFAULT_YAHOO_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
pub const DEFAULT_TIMEZONE: &str = "Europe/Warsaw";
const DEFAULT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Clone)]
pub struct Config {
    pub colors: ColorMap,
    pub timezone: Tz,
    pub output_path: PathBuf,
    pub scale: ScaleMode,
    pub align_start: bool,
    pub yahoo_url: String,
    pub timeout: std::time::Duration,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            colors: ColorMap::default(),
            timezone: chrono_tz::Europe::Warsaw,
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            scale: ScaleMode::default(),
            align_start: false,
            yahoo_url: DEFAULT_YAHOO_URL.to_string(),
            timeout: std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Defaults overridden by `ETF_CHART_OUTPUT`, `ETF_CHART_TZ`,
    /// `YAHOO_CHART_URL` and `YAHOO_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(path) = lookup("ETF_CHART_OUTPUT").filter(|v| !v.trim().is_empty()) {
            config.output_path = PathBuf::from(path.trim());
        }

        if let Some(tz) = lookup("ETF_CHART_TZ") {
            config.timezone = tz
                .trim()
                .parse::<Tz>()
                .map_err(|e| ChartError::Config(format!("invalid ETF_CHART_TZ '{}': {}", tz, e)))?;
        }

        if let Some(url) = lookup("YAHOO_CHART_URL") {
            config.yahoo_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(secs) = lookup("YAHOO_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| ChartError::Config(format!("YAHOO_TIMEOUT_SECS must be a number, got '{}'", secs)))?;
            if secs == 0 {
                return Err(ChartError::Config("YAHOO_TIMEOUT_SECS must be positive".into()));
            }
            config.timeout = std::time::Duration::from_secs(secs);
        }

        info!(
            "Config: {} tickers, tz {}, output {}",
            config.colors.len(),
            config.timezone,
            config.output_path.display()
        );
        Ok(config)
    }

    pub fn tickers(&self) -> Vec<Ticker> {
        self.colors.tickers()
    }

    /// Trailing one-year window ending at `now`, expressed in the chart timezone.
    pub fn window(&self, now: DateTime<Utc>) -> (DateTime<Tz>, DateTime<Tz>) {
        let end = now.with_timezone(&self.timezone);
        (end - Duration::days(WINDOW_DAYS), end)
    }
}

// src/services/market_data.rs
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use log::{info, warn};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::Config;
use crate::error::{ChartError, Result};
use crate::models::{CloseSeries, PriceTable, Ticker};

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Turns a Yahoo v8 chart payload into dated closes in `tz`.
/// `null` and non-finite closes become missing values.
pub fn parse_close_series(ticker: &Ticker, body: &str, tz: Tz) -> Result<CloseSeries> {
    let payload: ChartResponse = serde_json::from_str(body)
        .map_err(|e| ChartError::unavailable(ticker.as_str(), format!("malformed response: {}", e)))?;

    if let Some(api_error) = payload.chart.error {
        let reason = match (api_error.code, api_error.description) {
            (Some(code), Some(desc)) => format!("{}: {}", code, desc),
            (Some(code), None) => code,
            (None, Some(desc)) => desc,
            (None, None) => "provider returned an error".to_string(),
        };
        return Err(ChartError::unavailable(ticker.as_str(), reason));
    }

    let result = payload
        .chart
        .result
        .and_then(|mut results| if results.is_empty() { None } else { Some(results.remove(0)) })
        .ok_or_else(|| ChartError::unavailable(ticker.as_str(), "no results"))?;

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    if result.timestamp.is_empty() || closes.is_empty() {
        return Err(ChartError::unavailable(ticker.as_str(), "no price data"));
    }
    if closes.len() != result.timestamp.len() {
        return Err(ChartError::unavailable(
            ticker.as_str(),
            format!("{} timestamps but {} closes", result.timestamp.len(), closes.len()),
        ));
    }

    let mut points = Vec::with_capacity(closes.len());
    for (ts, close) in result.timestamp.iter().zip(closes) {
        let Some(instant) = Utc.timestamp_opt(*ts, 0).single() else {
            return Err(ChartError::unavailable(ticker.as_str(), format!("invalid timestamp {}", ts)));
        };
        let date = instant.with_timezone(&tz).date_naive();
        points.push((date, close.filter(|v| v.is_finite())));
    }

    if points.iter().all(|(_, v)| v.is_none()) {
        return Err(ChartError::unavailable(ticker.as_str(), "every close is missing"));
    }

    Ok(CloseSeries {
        ticker: ticker.clone(),
        points,
    })
}

/// Builds the shared date index (union of all dates) and lines every
/// ticker up against it. Later observations on the same date win.
pub fn align_series(series: &[CloseSeries]) -> PriceTable {
    let dates: Vec<NaiveDate> = series
        .iter()
        .flat_map(|s| s.points.iter().map(|(d, _)| *d))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let columns = series
        .iter()
        .map(|s| {
            let mut by_date: BTreeMap<NaiveDate, Option<f64>> = BTreeMap::new();
            for (date, value) in &s.points {
                let slot = by_date.entry(*date).or_insert(None);
                if value.is_some() {
                    *slot = *value;
                }
            }
            let values: Vec<Option<f64>> = dates
                .iter()
                .map(|d| by_date.get(d).copied().flatten())
                .collect();
            let gaps = values.iter().filter(|v| v.is_none()).count();
            if gaps > 0 {
                warn!("{} has {} missing closes out of {}", s.ticker, gaps, values.len());
            }
            (s.ticker.clone(), values)
        })
        .collect();

    PriceTable { dates, columns }
}

pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChartError::unavailable("yahoo", e))?;
        Ok(YahooClient {
            client,
            base_url: config.yahoo_url.clone(),
        })
    }

    pub fn chart_url(&self, ticker: &Ticker, start: DateTime<Tz>, end: DateTime<Tz>) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ChartError::Config(format!("invalid Yahoo URL '{}': {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ChartError::Config(format!("Yahoo URL '{}' cannot take a path", self.base_url)))?
            .push(ticker.as_str());
        url.query_pairs_mut()
            .append_pair("period1", &start.timestamp().to_string())
            .append_pair("period2", &end.timestamp().to_string())
            .append_pair("interval", "1d")
            .append_pair("events", "history")
            .append_pair("includeAdjustedClose", "true");
        Ok(url)
    }

    pub async fn fetch_close_series(
        &self,
        ticker: &Ticker,
        start: DateTime<Tz>,
        end: DateTime<Tz>,
    ) -> Result<CloseSeries> {
        let url = self.chart_url(ticker, start, end)?;
        info!("Fetching daily closes for {} from URL: {}", ticker, url);

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ChartError::unavailable(ticker.as_str(), e))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(ChartError::unavailable(ticker.as_str(), format!("yahoo status {}", status)));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ChartError::unavailable(ticker.as_str(), e))?;

        let series = parse_close_series(ticker, &body, start.timezone())?;
        info!("Received {} daily points for {}", series.points.len(), ticker);
        Ok(series)
    }
}

/// Fetches every configured ticker, one request after another, and aligns
/// them by date.
pub async fn fetch_price_table(config: &Config, start: DateTime<Tz>, end: DateTime<Tz>) -> Result<PriceTable> {
    let client = YahooClient::new(config)?;
    let mut series = Vec::with_capacity(config.colors.len());
    for ticker in config.tickers() {
        series.push(client.fetch_close_series(&ticker, start, end).await?);
    }
    let table = align_series(&series);
    info!("Aligned {} tickers over {} dates", table.columns.len(), table.len());
    Ok(table)
}

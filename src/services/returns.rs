// src/services/returns.rs
use log::{info, warn};

use crate::error::{ChartError, Result};
use crate::models::{ColorMap, FinalReturn, PriceTable, ReturnTable};

/// Replaces each gap with the last value seen before it. Leading gaps stay.
pub fn forward_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last = None;
    values
        .iter()
        .map(|v| {
            if v.is_some() {
                last = *v;
            }
            last
        })
        .collect()
}

pub fn forward_fill_table(table: &PriceTable) -> PriceTable {
    PriceTable {
        dates: table.dates.clone(),
        columns: table
            .columns
            .iter()
            .map(|(ticker, values)| (ticker.clone(), forward_fill(values)))
            .collect(),
    }
}

/// Drops leading rows until every ticker has a price.
pub fn trim_to_common_start(table: &PriceTable) -> Result<PriceTable> {
    let start = (0..table.len())
        .find(|&i| table.columns.iter().all(|(_, values)| values[i].is_some()))
        .ok_or_else(|| {
            let ticker = table
                .columns
                .iter()
                .find(|(_, values)| values.iter().all(|v| v.is_none()))
                .map(|(t, _)| t.to_string())
                .unwrap_or_else(|| "all".to_string());
            ChartError::normalization(ticker, "no date where every ticker has a price")
        })?;

    if start > 0 {
        info!("Skipping {} leading rows without a complete set of prices", start);
    }

    Ok(PriceTable {
        dates: table.dates[start..].to_vec(),
        columns: table
            .columns
            .iter()
            .map(|(ticker, values)| (ticker.clone(), values[start..].to_vec()))
            .collect(),
    })
}

/// `(v / v0 - 1) * 100` against the first row. The column must already be
/// forward-filled; a missing or zero baseline is an error, not NaN output.
pub fn normalize_column(ticker: &str, values: &[Option<f64>]) -> Result<Vec<f64>> {
    let base = match values.first() {
        Some(Some(base)) => *base,
        Some(None) => return Err(ChartError::normalization(ticker, "first price is missing")),
        None => return Err(ChartError::normalization(ticker, "no prices")),
    };
    if base == 0.0 || !base.is_finite() {
        return Err(ChartError::normalization(ticker, format!("unusable baseline {}", base)));
    }

    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let v = v.ok_or_else(|| ChartError::normalization(ticker, format!("price missing at row {}", i)))?;
            let ret = (v / base - 1.0) * 100.0;
            if ret.is_finite() {
                Ok(ret)
            } else {
                Err(ChartError::normalization(ticker, format!("non-finite return at row {}", i)))
            }
        })
        .collect()
}

/// Forward-fills, optionally trims to the first complete row, then
/// normalizes every column.
pub fn compute_returns(prices: &PriceTable, align_start: bool) -> Result<ReturnTable> {
    if prices.is_empty() {
        warn!("Price table is empty");
        return Err(ChartError::normalization("all", "no prices"));
    }

    let filled = forward_fill_table(prices);
    let filled = if align_start { trim_to_common_start(&filled)? } else { filled };

    let columns = filled
        .columns
        .iter()
        .map(|(ticker, values)| Ok((ticker.clone(), normalize_column(ticker.as_str(), values)?)))
        .collect::<Result<Vec<_>>>()?;

    Ok(ReturnTable {
        dates: filled.dates,
        columns,
    })
}

/// Last return per ticker, in color-map order.
pub fn final_returns(returns: &ReturnTable, colors: &ColorMap) -> Vec<FinalReturn> {
    colors
        .iter()
        .filter_map(|(ticker, color)| {
            let column = returns.column(ticker)?;
            let value = *column.last()?;
            Some(FinalReturn {
                ticker: ticker.clone(),
                color: *color,
                value,
            })
        })
        .collect()
}

pub fn max_return(returns: &ReturnTable) -> Option<f64> {
    returns
        .columns
        .iter()
        .flat_map(|(_, values)| values.iter().copied())
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EtfColor, Ticker};
    use chrono::NaiveDate;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let first = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        (0..n).map(|i| first + chrono::Duration::days(i as i64)).collect()
    }

    fn table(columns: Vec<(&str, Vec<Option<f64>>)>) -> PriceTable {
        let n = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        PriceTable {
            dates: dates(n),
            columns: columns
                .into_iter()
                .map(|(t, v)| (Ticker::new(t), v))
                .collect(),
        }
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{} != {}", a, e);
        }
    }

    #[test]
    fn simple_series_normalizes() {
        let ret = normalize_column("X", &[Some(100.0), Some(110.0), Some(90.0)]).unwrap();
        assert_close(&ret, &[0.0, 10.0, -10.0]);
    }

    #[test]
    fn gap_is_filled_before_normalizing() {
        let filled = forward_fill(&[Some(100.0), None, Some(120.0)]);
        assert_eq!(filled, vec![Some(100.0), Some(100.0), Some(120.0)]);
        let ret = normalize_column("X", &filled).unwrap();
        assert_close(&ret, &[0.0, 0.0, 20.0]);
    }

    #[test]
    fn forward_fill_is_idempotent_and_keeps_leading_gaps() {
        let raw = vec![None, None, Some(5.0), None, Some(7.0), None];
        let once = forward_fill(&raw);
        assert_eq!(once, vec![None, None, Some(5.0), Some(5.0), Some(7.0), Some(7.0)]);
        assert_eq!(forward_fill(&once), once);
    }

    #[test]
    fn every_return_column_starts_at_zero() {
        let prices = table(vec![
            ("A", vec![Some(50.0), Some(55.0), None, Some(40.0)]),
            ("B", vec![Some(2.0), None, Some(3.0), Some(4.0)]),
        ]);
        let returns = compute_returns(&prices, false).unwrap();
        for (_, column) in &returns.columns {
            assert_eq!(column[0], 0.0);
        }
        // Rows without fills follow the plain formula.
        let a = returns.column(&Ticker::new("A")).unwrap();
        assert!((a[1] - (55.0 / 50.0 - 1.0) * 100.0).abs() < 1e-9);
        assert!((a[3] - (40.0 / 50.0 - 1.0) * 100.0).abs() < 1e-9);
        assert!((a[2] - a[1]).abs() < 1e-9);
    }

    #[test]
    fn missing_first_price_is_an_error() {
        let prices = table(vec![
            ("A", vec![Some(1.0), Some(2.0)]),
            ("B", vec![None, Some(2.0)]),
        ]);
        let err = compute_returns(&prices, false).unwrap_err();
        match err {
            ChartError::Normalization { ticker, .. } => assert_eq!(ticker, "B"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn zero_baseline_is_an_error() {
        assert!(matches!(
            normalize_column("Z", &[Some(0.0), Some(1.0)]),
            Err(ChartError::Normalization { .. })
        ));
    }

    #[test]
    fn aligned_start_skips_incomplete_rows() {
        let prices = table(vec![
            ("A", vec![Some(10.0), Some(11.0), Some(12.0)]),
            ("B", vec![None, Some(100.0), Some(150.0)]),
        ]);
        let returns = compute_returns(&prices, true).unwrap();
        assert_eq!(returns.dates.len(), 2);
        assert_eq!(returns.dates[0], prices.dates[1]);
        assert_close(returns.column(&Ticker::new("A")).unwrap(), &[0.0, 12.0 / 11.0 * 100.0 - 100.0]);
        assert_close(returns.column(&Ticker::new("B")).unwrap(), &[0.0, 50.0]);
    }

    #[test]
    fn aligned_start_without_complete_row_fails() {
        let prices = table(vec![("A", vec![Some(1.0), Some(2.0)]), ("B", vec![None, None])]);
        let err = compute_returns(&prices, true).unwrap_err();
        assert!(matches!(err, ChartError::Normalization { ref ticker, .. } if ticker == "B"));
    }

    #[test]
    fn final_and_max_returns() {
        let prices = table(vec![
            ("EIMI.L", vec![Some(100.0), Some(130.0), Some(112.345)]),
            ("IB01.L", vec![Some(100.0), Some(101.0), Some(102.0)]),
        ]);
        let returns = compute_returns(&prices, false).unwrap();
        let colors = ColorMap::new(vec![
            (Ticker::new("IB01.L"), EtfColor::Red),
            (Ticker::new("EIMI.L"), EtfColor::Blue),
        ]);
        let finals = final_returns(&returns, &colors);
        assert_eq!(finals.len(), 2);
        assert_eq!(finals[0].ticker, Ticker::new("IB01.L"));
        assert_eq!(finals[0].color, EtfColor::Red);
        assert!((finals[1].value - 12.345).abs() < 1e-9);
        assert!((max_return(&returns).unwrap() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn empty_table_is_an_error() {
        let prices = PriceTable {
            dates: vec![],
            columns: vec![],
        };
        assert!(compute_returns(&prices, false).is_err());
    }
}

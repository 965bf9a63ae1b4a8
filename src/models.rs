// src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticker(String);

impl Ticker {
    pub fn new(symbol: impl Into<String>) -> Self {
        Ticker(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // pad() so width/alignment flags apply in the console report
        f.pad(&self.0)
    }
}

/// Display colors used for both the plotted lines and the text reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EtfColor {
    Blue,
    Orange,
    Green,
    Red,
}

impl EtfColor {
    pub fn name(self) -> &'static str {
        match self {
            EtfColor::Blue => "niebieski",
            EtfColor::Orange => "pomarańczowy",
            EtfColor::Green => "zielony",
            EtfColor::Red => "czerwony",
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            EtfColor::Blue => (0x00, 0x00, 0xFF),
            EtfColor::Orange => (0xFF, 0xA5, 0x00),
            EtfColor::Green => (0x00, 0x80, 0x00),
            EtfColor::Red => (0xFF, 0x00, 0x00),
        }
    }
}

/// Ordered ticker → color assignment. Order drives plotting and legend order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    entries: Vec<(Ticker, EtfColor)>,
}

impl ColorMap {
    pub fn new(entries: Vec<(Ticker, EtfColor)>) -> Self {
        ColorMap { entries }
    }

    pub fn tickers(&self) -> Vec<Ticker> {
        self.entries.iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Ticker, EtfColor)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ColorMap {
    fn default() -> Self {
        ColorMap::new(vec![
            (Ticker::new("EIMI.L"), EtfColor::Blue),
            (Ticker::new("CNDX.L"), EtfColor::Orange),
            (Ticker::new("CBU0.L"), EtfColor::Green),
            (Ticker::new("IB01.L"), EtfColor::Red),
        ])
    }
}

/// Raw close prices for one ticker as returned by the provider.
#[derive(Debug, Clone)]
pub struct CloseSeries {
    pub ticker: Ticker,
    pub points: Vec<(NaiveDate, Option<f64>)>,
}

/// Date-aligned close prices, one column per ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<(Ticker, Vec<Option<f64>>)>,
}

impl PriceTable {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Percentage return since the first row, one column per ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnTable {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<(Ticker, Vec<f64>)>,
}

impl ReturnTable {
    pub fn column(&self, ticker: &Ticker) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(t, _)| t == ticker)
            .map(|(_, values)| values.as_slice())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinalReturn {
    pub ticker: Ticker,
    pub color: EtfColor,
    pub value: f64,
}

impl FinalReturn {
    pub fn legend_label(&self) -> String {
        format!("{}: {:+.2}%", self.ticker, self.value)
    }

    /// Short form used next to the right-hand axis.
    pub fn annotation_label(&self) -> String {
        format!("{} {:+.2}%", self.ticker, self.value)
    }
}

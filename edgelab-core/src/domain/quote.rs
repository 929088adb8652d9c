//! Quote and Stock: the enriched market data the engine walks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily price snapshot for a single symbol with precomputed indicators.
///
/// Indicators are computed upstream; the engine never derives them. Fields
/// missing from an input file deserialize to neutral values so a sparse
/// quote is still usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub open: f64,
    #[serde(default)]
    pub high: f64,
    #[serde(default)]
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: u64,

    // ── Indicators ──
    #[serde(default)]
    pub atr: f64,
    #[serde(default)]
    pub adx: f64,
    #[serde(default)]
    pub ema_10: f64,
    #[serde(default)]
    pub ema_20: f64,
    #[serde(default)]
    pub ema_50: f64,
    #[serde(default)]
    pub ema_200: f64,
    #[serde(default)]
    pub donchian_upper: f64,
    #[serde(default)]
    pub donchian_lower: f64,

    // ── Signals ──
    #[serde(default)]
    pub in_uptrend: bool,
    #[serde(default)]
    pub buy_signal: bool,
    #[serde(default)]
    pub sell_signal: bool,

    // ── Breadth snapshot (bull percentage, 0-100) ──
    #[serde(default)]
    pub market_breadth: Option<f64>,
    #[serde(default)]
    pub sector_breadth: Option<f64>,
}

impl Quote {
    /// Minimal quote with only a close and ATR set. Everything else neutral.
    pub fn new(symbol: impl Into<String>, date: NaiveDate, close: f64, atr: f64) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
            atr,
            adx: 0.0,
            ema_10: 0.0,
            ema_20: 0.0,
            ema_50: 0.0,
            ema_200: 0.0,
            donchian_upper: 0.0,
            donchian_lower: 0.0,
            in_uptrend: false,
            buy_signal: false,
            sell_signal: false,
            market_breadth: None,
            sector_breadth: None,
        }
    }

    /// ATR as a percentage of the close. Zero when the close is zero.
    pub fn atr_percent(&self) -> f64 {
        if self.close == 0.0 {
            return 0.0;
        }
        self.atr / self.close * 100.0
    }
}

/// A symbol with its quote history.
///
/// Quotes are kept sorted ascending by date with one quote per date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stock {
    pub symbol: String,
    pub sector: Option<String>,
    quotes: Vec<Quote>,
}

impl Stock {
    /// Build a stock, sorting quotes by date and dropping duplicate dates
    /// (the first occurrence in input order wins).
    pub fn new(symbol: impl Into<String>, sector: Option<String>, mut quotes: Vec<Quote>) -> Self {
        quotes.sort_by_key(|q| q.date);
        quotes.dedup_by_key(|q| q.date);
        Self {
            symbol: symbol.into(),
            sector,
            quotes,
        }
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Index of the quote on `date`, if any.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.quotes.binary_search_by_key(&date, |q| q.date).ok()
    }

    pub fn quote_on(&self, date: NaiveDate) -> Option<&Quote> {
        self.index_of(date).map(|i| &self.quotes[i])
    }

    /// Quotes strictly after `date`, ascending.
    pub fn quotes_after(&self, date: NaiveDate) -> &[Quote] {
        let start = self.quotes.partition_point(|q| q.date <= date);
        &self.quotes[start..]
    }

    /// Quotes within `[from, to]`, ascending.
    pub fn quotes_between(&self, from: NaiveDate, to: NaiveDate) -> &[Quote] {
        let start = self.quotes.partition_point(|q| q.date < from);
        let end = self.quotes.partition_point(|q| q.date <= to);
        if start >= end {
            return &[];
        }
        &self.quotes[start..end]
    }

    pub fn sector_name(&self) -> &str {
        self.sector.as_deref().unwrap_or("")
    }
}

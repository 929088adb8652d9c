//! Backtest options.

use super::BacktestError;
use crate::domain::Stock;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestOptions {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Maximum simultaneous positions. `None` means unlimited.
    #[serde(default)]
    pub max_positions: Option<usize>,
    /// Evaluate signals on a mapped underlying while trading the original symbol.
    #[serde(default)]
    pub use_underlying_assets: bool,
    /// Trading symbol → strategy (underlying) symbol.
    #[serde(default)]
    pub underlying_map: HashMap<String, String>,
    /// Trading days a symbol stays blocked after its exit. The exit date itself
    /// is always blocked.
    #[serde(default)]
    pub cooldown_days: usize,
    /// Trading days between the signal and the actual entry.
    #[serde(default)]
    pub entry_delay_days: usize,
}

impl Default for BacktestOptions {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::MIN,
            end_date: NaiveDate::MAX,
            max_positions: None,
            use_underlying_assets: false,
            underlying_map: HashMap::new(),
            cooldown_days: 0,
            entry_delay_days: 0,
        }
    }
}

impl BacktestOptions {
    pub fn between(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            ..Self::default()
        }
    }

    /// Symbol whose signals drive trades of `trading_symbol`.
    pub fn strategy_symbol<'a>(&'a self, trading_symbol: &'a str) -> &'a str {
        if !self.use_underlying_assets {
            return trading_symbol;
        }
        self.underlying_map
            .get(trading_symbol)
            .map(String::as_str)
            .unwrap_or(trading_symbol)
    }

    /// Underlyings that no mapping trades are loaded for their signals only.
    /// Mapping a symbol to itself keeps it tradeable.
    pub fn is_signal_only(&self, symbol: &str) -> bool {
        self.use_underlying_assets
            && !self.underlying_map.contains_key(symbol)
            && self.underlying_map.values().any(|u| u == symbol)
    }

    /// Reject configurations that cannot run against `stocks`.
    pub fn validate(&self, stocks: &[Stock]) -> Result<(), BacktestError> {
        if self.start_date > self.end_date {
            return Err(BacktestError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if self.use_underlying_assets {
            let known: HashSet<&str> = stocks.iter().map(|s| s.symbol.as_str()).collect();
            let missing: BTreeSet<String> = stocks
                .iter()
                .map(|s| self.strategy_symbol(&s.symbol))
                .filter(|sym| !known.contains(sym))
                .map(str::to_string)
                .collect();
            if !missing.is_empty() {
                return Err(BacktestError::MissingUnderlying {
                    symbols: missing.into_iter().collect(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn inverted_range_rejected() {
        let opts = BacktestOptions::between(d(10), d(1));
        assert_eq!(
            opts.validate(&[]),
            Err(BacktestError::InvalidDateRange {
                start: d(10),
                end: d(1)
            })
        );
    }

    #[test]
    fn strategy_symbol_only_maps_in_underlying_mode() {
        let mut opts = BacktestOptions::between(d(1), d(10));
        opts.underlying_map.insert("TQQQ".into(), "QQQ".into());
        assert_eq!(opts.strategy_symbol("TQQQ"), "TQQQ");
        opts.use_underlying_assets = true;
        assert_eq!(opts.strategy_symbol("TQQQ"), "QQQ");
        assert_eq!(opts.strategy_symbol("SPY"), "SPY");
    }

    #[test]
    fn mapped_underlyings_are_signal_only() {
        let mut opts = BacktestOptions::between(d(1), d(10));
        opts.underlying_map.insert("TQQQ".into(), "QQQ".into());
        assert!(!opts.is_signal_only("QQQ"));
        opts.use_underlying_assets = true;
        assert!(opts.is_signal_only("QQQ"));
        assert!(!opts.is_signal_only("TQQQ"));
        assert!(!opts.is_signal_only("SPY"));
        opts.underlying_map.insert("QQQ".into(), "QQQ".into());
        assert!(!opts.is_signal_only("QQQ"));
    }

    #[test]
    fn missing_underlying_lists_symbols() {
        let mut opts = BacktestOptions::between(d(1), d(10));
        opts.use_underlying_assets = true;
        opts.underlying_map.insert("TQQQ".into(), "QQQ".into());
        opts.underlying_map.insert("SOXL".into(), "SOXX".into());
        let stocks = vec![
            Stock::new("TQQQ", None, vec![]),
            Stock::new("SOXL", None, vec![]),
        ];
        let err = opts.validate(&stocks).unwrap_err();
        assert_eq!(
            err,
            BacktestError::MissingUnderlying {
                symbols: vec!["QQQ".into(), "SOXX".into()]
            }
        );
        assert_eq!(
            err.to_string(),
            "Underlying assets not found in stock universe: QQQ, SOXX"
        );
    }
}

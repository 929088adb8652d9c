//! Backtesting engine: date-ordered replay of entry/exit predicates.
//!
//! The engine walks the distinct trading dates of the universe in ascending
//! order. On each date it:
//!
//! 1. Releases positions whose exit date has been reached
//! 2. Drops candidates that are already open or in cooldown
//! 3. Applies the optional entry delay
//! 4. Ranks the rest and fills the free position slots
//! 5. Scans each opened position forward to its exit
//!
//! Signals that lose the slot race are simulated as missed trades.

pub mod backtest;
pub mod exit_scan;
pub mod options;

pub use backtest::run_backtest;
pub use options::BacktestOptions;

use chrono::NaiveDate;

/// Configuration errors. A backtest either runs completely or not at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BacktestError {
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("Underlying assets not found in stock universe: {}", .symbols.join(", "))]
    MissingUnderlying { symbols: Vec<String> },
    #[error("Unknown ranker: '{0}'")]
    UnknownRanker(String),
}

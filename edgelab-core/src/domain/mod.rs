//! Domain types: quotes, stocks, trades, backtest reports.

pub mod quote;
pub mod report;
pub mod trade;

pub use quote::{Quote, Stock};
pub use report::BacktestReport;
pub use trade::{ExitReason, Trade};

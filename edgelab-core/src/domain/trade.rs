//! Trade: a completed round-trip from entry quote to exit quote.

use super::quote::Quote;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a trade was closed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    /// The exit predicate fired; carries its reason text.
    Signal(String),
    /// Forced close on the last available quote. The one look-ahead exception.
    EndOfData,
}

impl ExitReason {
    pub fn is_forced(&self) -> bool {
        matches!(self, ExitReason::EndOfData)
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Signal(reason) => f.write_str(reason),
            ExitReason::EndOfData => f.write_str("end of data"),
        }
    }
}

/// A completed trade.
///
/// `quotes` holds the traded instrument's quotes strictly after the entry,
/// up to and including the exit quote (always the last element).
/// `profit` is absolute per share: exit price minus entry close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Identification ──
    pub symbol: String,
    /// Strategy stock whose signals drove the trade, when different from `symbol`.
    pub underlying_symbol: Option<String>,
    pub sector: String,

    // ── Entry / exit ──
    pub entry_quote: Quote,
    pub exit_reason: ExitReason,
    pub quotes: Vec<Quote>,

    // ── PnL ──
    pub profit: f64,
}

impl Trade {
    pub fn entry_date(&self) -> NaiveDate {
        self.entry_quote.date
    }

    pub fn entry_price(&self) -> f64 {
        self.entry_quote.close
    }

    /// Last quote of the trade. Falls back to the entry quote for a trade
    /// without subsequent quotes.
    pub fn exit_quote(&self) -> &Quote {
        self.quotes.last().unwrap_or(&self.entry_quote)
    }

    pub fn exit_date(&self) -> NaiveDate {
        self.exit_quote().date
    }

    pub fn exit_price(&self) -> f64 {
        self.entry_quote.close + self.profit
    }

    /// `(exit_price / entry_close - 1) * 100`. Zero when the entry close is zero.
    pub fn profit_percentage(&self) -> f64 {
        if self.entry_quote.close == 0.0 {
            return 0.0;
        }
        self.profit / self.entry_quote.close * 100.0
    }

    pub fn is_winner(&self) -> bool {
        self.profit > 0.0
    }

    /// Calendar days from entry to exit.
    pub fn holding_days(&self) -> i64 {
        (self.exit_date() - self.entry_date()).num_days()
    }

    /// Number of quotes after entry.
    pub fn trading_days(&self) -> usize {
        self.quotes.len()
    }

    /// Whether `[entry, exit]` contains `date`.
    pub fn spans(&self, date: NaiveDate) -> bool {
        self.entry_date() <= date && date <= self.exit_date()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sample_trade(profit: f64) -> Trade {
        Trade {
            symbol: "AAPL".into(),
            underlying_symbol: None,
            sector: "XLK".into(),
            entry_quote: Quote::new("AAPL", d(2), 100.0, 2.0),
            exit_reason: ExitReason::Signal("sell signal".into()),
            quotes: vec![
                Quote::new("AAPL", d(3), 104.0, 2.0),
                Quote::new("AAPL", d(8), 100.0 + profit, 2.0),
            ],
            profit,
        }
    }

    #[test]
    fn profit_percentage_is_relative_to_entry_close() {
        let t = sample_trade(10.0);
        assert!((t.profit_percentage() - 10.0).abs() < 1e-12);
        assert!((t.exit_price() - 110.0).abs() < 1e-12);
    }

    #[test]
    fn zero_profit_is_not_a_winner() {
        assert!(!sample_trade(0.0).is_winner());
        assert!(sample_trade(0.01).is_winner());
    }

    #[test]
    fn holding_and_trading_days() {
        let t = sample_trade(5.0);
        assert_eq!(t.exit_date(), d(8));
        assert_eq!(t.holding_days(), 6);
        assert_eq!(t.trading_days(), 2);
        assert!(t.spans(d(2)) && t.spans(d(8)));
        assert!(!t.spans(d(9)));
    }

    #[test]
    fn exit_reason_display() {
        assert_eq!(ExitReason::EndOfData.to_string(), "end of data");
        assert_eq!(ExitReason::Signal("stop loss".into()).to_string(), "stop loss");
        assert!(ExitReason::EndOfData.is_forced());
    }

    #[test]
    fn exit_reason_serde_roundtrip() {
        let json = serde_json::to_string(&ExitReason::EndOfData).unwrap();
        assert_eq!(json, r#"{"type":"END_OF_DATA"}"#);
        let back: ExitReason = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ExitReason::EndOfData);
    }
}

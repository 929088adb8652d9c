//! BacktestReport: the trade ledger and its derived metrics.
//!
//! Only the partition is stored. Every metric is recomputed from it on
//! each call, so a report can never disagree with its own trades.

use super::trade::Trade;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub winning_trades: Vec<Trade>,
    pub losing_trades: Vec<Trade>,
    /// Valid signals that did not get a position slot, simulated as if taken.
    #[serde(default)]
    pub missed_trades: Vec<Trade>,
}

impl BacktestReport {
    /// Partition `trades` into winners (`profit > 0`) and losers.
    pub fn from_trades(trades: Vec<Trade>, missed_trades: Vec<Trade>) -> Self {
        let (winning_trades, losing_trades) = trades.into_iter().partition(Trade::is_winner);
        Self {
            winning_trades,
            losing_trades,
            missed_trades,
        }
    }

    pub fn total_trades(&self) -> usize {
        self.winning_trades.len() + self.losing_trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_trades() == 0
    }

    /// Fraction of trades that won, in `[0, 1]`.
    pub fn win_rate(&self) -> f64 {
        let total = self.total_trades();
        if total == 0 {
            return 0.0;
        }
        self.winning_trades.len() as f64 / total as f64
    }

    pub fn loss_rate(&self) -> f64 {
        let total = self.total_trades();
        if total == 0 {
            return 0.0;
        }
        self.losing_trades.len() as f64 / total as f64
    }

    pub fn average_win_percent(&self) -> f64 {
        average(self.winning_trades.iter().map(Trade::profit_percentage))
    }

    /// Average loss percentage as a positive magnitude.
    pub fn average_loss_percent(&self) -> f64 {
        average(self.losing_trades.iter().map(Trade::profit_percentage)).abs()
    }

    pub fn average_win_amount(&self) -> f64 {
        average(self.winning_trades.iter().map(|t| t.profit))
    }

    /// Average loss per share as a positive magnitude.
    pub fn average_loss_amount(&self) -> f64 {
        average(self.losing_trades.iter().map(|t| t.profit)).abs()
    }

    /// Expected profit percentage per trade:
    /// `win_rate * avg_win% - loss_rate * avg_loss%`.
    pub fn edge(&self) -> f64 {
        self.win_rate() * self.average_win_percent()
            - self.loss_rate() * self.average_loss_percent()
    }

    /// Gross profit over gross loss. `None` when there is no loss to divide by.
    pub fn profit_factor(&self) -> Option<f64> {
        let gross_loss: f64 = self.losing_trades.iter().map(|t| t.profit).sum::<f64>().abs();
        if gross_loss == 0.0 {
            return None;
        }
        let gross_profit: f64 = self.winning_trades.iter().map(|t| t.profit).sum();
        Some(gross_profit / gross_loss)
    }

    /// All trades ordered by entry date, ties by symbol.
    pub fn trades(&self) -> Vec<&Trade> {
        let mut all: Vec<&Trade> = self
            .winning_trades
            .iter()
            .chain(self.losing_trades.iter())
            .collect();
        all.sort_by(|a, b| {
            a.entry_date()
                .cmp(&b.entry_date())
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        all
    }

    /// Trade count per exit reason label.
    pub fn exit_reason_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for trade in self.winning_trades.iter().chain(self.losing_trades.iter()) {
            *counts.entry(trade.exit_reason.to_string()).or_insert(0) += 1;
        }
        counts
    }
}

fn average(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        return 0.0;
    }
    sum / count as f64
}

//! One synthetic scenario: a reordered or redrawn ledger and its path metrics.

use chrono::NaiveDate;
use edgelab_core::domain::Trade;
use edgelab_core::stats::max_drawdown_pct;
use serde::{Deserialize, Serialize};

use crate::sizing::{calculate_shares, PositionSizingConfig};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEquityPoint {
    /// 1-based position within the scenario.
    pub trade_number: usize,
    /// Exit date of the trade at this position.
    pub date: NaiveDate,
    pub cumulative_return_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloScenario {
    pub scenario_number: usize,
    /// Positions into the entry-ordered ledger, in scenario order.
    pub trade_indices: Vec<usize>,
    pub equity_curve: Vec<ScenarioEquityPoint>,
    pub total_return_pct: f64,
    /// Fraction of trades with a positive profit percentage.
    pub win_rate: f64,
    pub edge: f64,
    pub max_drawdown_pct: f64,
    pub winning_trades: usize,
    pub losing_trades: usize,
}

impl MonteCarloScenario {
    /// Score `trade_indices` over `ledger`.
    ///
    /// Without sizing, equity compounds `(1 + pp/100)` per trade. With sizing,
    /// each trade is ATR-sized sequentially from the running capital and the
    /// curve tracks portfolio return.
    pub fn evaluate(
        scenario_number: usize,
        trade_indices: Vec<usize>,
        ledger: &[&Trade],
        sizing: Option<&PositionSizingConfig>,
    ) -> Self {
        let trades: Vec<&Trade> = trade_indices.iter().map(|&i| ledger[i]).collect();
        let balances = match sizing {
            Some(config) => sized_balances(&trades, config),
            None => compounded_balances(&trades),
        };

        let equity_curve: Vec<ScenarioEquityPoint> = trades
            .iter()
            .zip(&balances)
            .enumerate()
            .map(|(i, (trade, balance))| ScenarioEquityPoint {
                trade_number: i + 1,
                date: trade.exit_date(),
                cumulative_return_pct: (balance - 1.0) * 100.0,
            })
            .collect();

        // Drawdown includes the starting balance of 1.0.
        let mut path = Vec::with_capacity(balances.len() + 1);
        path.push(1.0);
        path.extend_from_slice(&balances);

        let PathStats {
            win_rate,
            edge,
            winning_trades,
            losing_trades,
        } = path_stats(&trades);

        Self {
            scenario_number,
            trade_indices,
            total_return_pct: equity_curve
                .last()
                .map_or(0.0, |p| p.cumulative_return_pct),
            equity_curve,
            win_rate,
            edge,
            max_drawdown_pct: max_drawdown_pct(&path),
            winning_trades,
            losing_trades,
        }
    }
}

/// Balance after each trade, starting from 1.0, compounding profit percentages.
pub fn compounded_balances(trades: &[&Trade]) -> Vec<f64> {
    trades
        .iter()
        .scan(1.0_f64, |balance, trade| {
            *balance *= 1.0 + trade.profit_percentage() / 100.0;
            Some(*balance)
        })
        .collect()
}

/// Portfolio value relative to starting capital after each sequentially sized trade.
pub fn sized_balances(trades: &[&Trade], config: &PositionSizingConfig) -> Vec<f64> {
    let start = config.starting_capital;
    trades
        .iter()
        .scan(start, |capital, trade| {
            let shares = calculate_shares(*capital, trade.entry_quote.atr, config);
            *capital += shares as f64 * trade.profit;
            Some(if start > 0.0 { *capital / start } else { 1.0 })
        })
        .collect()
}

pub(crate) struct PathStats {
    pub win_rate: f64,
    pub edge: f64,
    pub winning_trades: usize,
    pub losing_trades: usize,
}

pub(crate) fn path_stats(trades: &[&Trade]) -> PathStats {
    let (mut wins, mut win_sum, mut losses, mut loss_sum) = (0usize, 0.0, 0usize, 0.0);
    for trade in trades {
        let pp = trade.profit_percentage();
        if pp > 0.0 {
            wins += 1;
            win_sum += pp;
        } else {
            losses += 1;
            loss_sum += pp.abs();
        }
    }
    let total = wins + losses;
    if total == 0 {
        return PathStats {
            win_rate: 0.0,
            edge: 0.0,
            winning_trades: 0,
            losing_trades: 0,
        };
    }
    let win_rate = wins as f64 / total as f64;
    let loss_rate = losses as f64 / total as f64;
    let avg_win = if wins > 0 { win_sum / wins as f64 } else { 0.0 };
    let avg_loss = if losses > 0 { loss_sum / losses as f64 } else { 0.0 };
    PathStats {
        win_rate,
        edge: win_rate * avg_win - loss_rate * avg_loss,
        winning_trades: wins,
        losing_trades: losses,
    }
}

//! Report analytics: pure functions that slice a trade ledger.
//!
//! Everything here is derived from `BacktestReport::trades()` and nothing
//! else: no engine state, no sizing. Win/loss classification follows the
//! report (profit > 0 wins, everything else loses) so the numbers agree with
//! the headline metrics.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use edgelab_core::domain::{BacktestReport, Trade};
use edgelab_core::stats::mean;
use serde::{Deserialize, Serialize};

/// All ledger breakdowns for one report.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportAnalytics {
    /// One entry per trade, in ledger order.
    pub excursions: Vec<TradeExcursion>,
    pub exit_reasons: Vec<ExitReasonStats>,
    pub sectors: Vec<SectorPerformance>,
    pub stocks: Vec<StockPerformance>,
    pub yearly: BTreeMap<i32, PeriodStats>,
}

impl ReportAnalytics {
    pub fn compute(report: &BacktestReport) -> Self {
        let trades = report.trades();
        Self {
            excursions: trades.iter().map(|t| TradeExcursion::of(t)).collect(),
            exit_reasons: exit_reason_stats(&trades),
            sectors: sector_performance(&trades),
            stocks: stock_performance(&trades),
            yearly: yearly_stats(&trades),
        }
    }
}

// ─── Excursions ─────────────────────────────────────────────────────

/// How far a trade ran for and against the entry, measured on closes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExcursionMetrics {
    /// Highest close-to-entry gain in percent. Never negative.
    pub mfe_pct: f64,
    /// The same move in entry-ATR units.
    pub mfe_atr: f64,
    /// Deepest close-to-entry loss in percent. Never positive.
    pub mae_pct: f64,
    /// Depth of that loss in entry-ATR units, as a positive number.
    pub mae_atr: f64,
    /// Whether the trade ever closed above entry.
    pub mfe_reached: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeExcursion {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub profit_percentage: f64,
    pub metrics: ExcursionMetrics,
}

impl TradeExcursion {
    pub fn of(trade: &Trade) -> Self {
        Self {
            symbol: trade.symbol.clone(),
            entry_date: trade.entry_date(),
            profit_percentage: trade.profit_percentage(),
            metrics: excursion(trade),
        }
    }
}

/// MFE/MAE over the trade's held quotes. Zero ATR leaves the ATR units at 0.
pub fn excursion(trade: &Trade) -> ExcursionMetrics {
    let entry = trade.entry_price();
    if entry <= 0.0 {
        return ExcursionMetrics::default();
    }
    let atr = trade.entry_quote.atr;
    let in_atr = |move_: f64| if atr > 0.0 { move_ / atr } else { 0.0 };

    let mut metrics = ExcursionMetrics::default();
    for quote in &trade.quotes {
        let move_ = quote.close - entry;
        let pct = move_ / entry * 100.0;
        if pct > metrics.mfe_pct {
            metrics.mfe_pct = pct;
            metrics.mfe_atr = in_atr(move_);
        }
        if pct < metrics.mae_pct {
            metrics.mae_pct = pct;
            metrics.mae_atr = in_atr(move_).abs();
        }
    }
    metrics.mfe_reached = metrics.mfe_pct > 0.0;
    metrics
}

// ─── Grouped stats ──────────────────────────────────────────────────

/// Win/loss summary shared by every grouping below.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupStats {
    pub trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub average_win_percent: f64,
    /// Positive magnitude.
    pub average_loss_percent: f64,
    pub edge: f64,
    pub total_profit_percentage: f64,
    pub average_profit_percentage: f64,
    /// Held quotes per trade.
    pub average_holding_days: f64,
}

impl GroupStats {
    pub fn of(trades: &[&Trade]) -> Self {
        if trades.is_empty() {
            return Self::default();
        }
        let (winners, losers): (Vec<&Trade>, Vec<&Trade>) =
            trades.iter().copied().partition(|t| t.is_winner());
        let pct = |ts: &[&Trade]| -> Vec<f64> { ts.iter().map(|t| t.profit_percentage()).collect() };
        let all = pct(trades);

        let win_rate = winners.len() as f64 / trades.len() as f64;
        let average_win_percent = mean(&pct(&winners));
        let average_loss_percent = mean(&pct(&losers)).abs();
        let holding: Vec<f64> = trades.iter().map(|t| t.trading_days() as f64).collect();

        Self {
            trades: trades.len(),
            winning_trades: winners.len(),
            losing_trades: losers.len(),
            win_rate,
            average_win_percent,
            average_loss_percent,
            edge: win_rate * average_win_percent - (1.0 - win_rate) * average_loss_percent,
            total_profit_percentage: all.iter().sum(),
            average_profit_percentage: mean(&all),
            average_holding_days: mean(&holding),
        }
    }
}

/// Peak-to-trough decline of cumulative (summed) profit percentage, trades
/// taken in entry order. Starts from a peak of zero.
pub fn cumulative_drawdown(trades: &[&Trade]) -> f64 {
    let mut ordered: Vec<&Trade> = trades.to_vec();
    ordered.sort_by_key(|t| t.entry_date());
    let (mut cumulative, mut peak, mut worst) = (0.0_f64, 0.0_f64, 0.0_f64);
    for trade in ordered {
        cumulative += trade.profit_percentage();
        peak = peak.max(cumulative);
        worst = worst.max(peak - cumulative);
    }
    worst
}

fn group_by<'a, K: Ord>(
    trades: &[&'a Trade],
    key: impl Fn(&Trade) -> K,
) -> BTreeMap<K, Vec<&'a Trade>> {
    let mut groups: BTreeMap<K, Vec<&'a Trade>> = BTreeMap::new();
    for &trade in trades {
        groups.entry(key(trade)).or_default().push(trade);
    }
    groups
}

fn by_edge_desc(a: f64, b: f64) -> std::cmp::Ordering {
    b.total_cmp(&a)
}

// ─── Exit reasons ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitReasonStats {
    pub reason: String,
    pub count: usize,
    pub average_profit_percentage: f64,
    pub average_holding_days: f64,
    pub win_rate: f64,
}

/// Most frequent reason first; ties by reason text.
pub fn exit_reason_stats(trades: &[&Trade]) -> Vec<ExitReasonStats> {
    let mut stats: Vec<ExitReasonStats> = group_by(trades, |t| t.exit_reason.to_string())
        .into_iter()
        .map(|(reason, group)| {
            let g = GroupStats::of(&group);
            ExitReasonStats {
                reason,
                count: g.trades,
                average_profit_percentage: g.average_profit_percentage,
                average_holding_days: g.average_holding_days,
                win_rate: g.win_rate,
            }
        })
        .collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.reason.cmp(&b.reason)));
    stats
}

// ─── Sectors ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorPerformance {
    pub sector: String,
    pub stats: GroupStats,
    pub max_drawdown_pct: f64,
}

/// Best edge first.
pub fn sector_performance(trades: &[&Trade]) -> Vec<SectorPerformance> {
    let mut sectors: Vec<SectorPerformance> = group_by(trades, |t| t.sector.clone())
        .into_iter()
        .map(|(sector, group)| SectorPerformance {
            sector,
            stats: GroupStats::of(&group),
            max_drawdown_pct: cumulative_drawdown(&group),
        })
        .collect();
    sectors.sort_by(|a, b| by_edge_desc(a.stats.edge, b.stats.edge));
    sectors
}

// ─── Stocks ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPerformance {
    pub symbol: String,
    pub stats: GroupStats,
    /// Gross profit over gross loss in dollars per share; `None` without losses.
    pub profit_factor: Option<f64>,
    pub max_drawdown_pct: f64,
}

/// Best edge first.
pub fn stock_performance(trades: &[&Trade]) -> Vec<StockPerformance> {
    let mut stocks: Vec<StockPerformance> = group_by(trades, |t| t.symbol.clone())
        .into_iter()
        .map(|(symbol, group)| {
            let gross_profit: f64 = group.iter().filter(|t| t.is_winner()).map(|t| t.profit).sum();
            let gross_loss: f64 = group
                .iter()
                .filter(|t| !t.is_winner())
                .map(|t| t.profit.abs())
                .sum();
            StockPerformance {
                symbol,
                stats: GroupStats::of(&group),
                profit_factor: (gross_loss > 0.0).then(|| gross_profit / gross_loss),
                max_drawdown_pct: cumulative_drawdown(&group),
            }
        })
        .collect();
    stocks.sort_by(|a, b| by_edge_desc(a.stats.edge, b.stats.edge));
    stocks
}

// ─── Periods ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub stats: GroupStats,
    pub exit_reasons: BTreeMap<String, usize>,
}

/// Keyed by entry year.
pub fn yearly_stats(trades: &[&Trade]) -> BTreeMap<i32, PeriodStats> {
    group_by(trades, |t| t.entry_date().year())
        .into_iter()
        .map(|(year, group)| {
            let mut exit_reasons = BTreeMap::new();
            for trade in &group {
                *exit_reasons.entry(trade.exit_reason.to_string()).or_insert(0) += 1;
            }
            (
                year,
                PeriodStats {
                    stats: GroupStats::of(&group),
                    exit_reasons,
                },
            )
        })
        .collect()
}

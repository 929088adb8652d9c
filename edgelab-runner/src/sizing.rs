//! ATR position sizing: converts a percentage ledger into a dollar equity curve.
//!
//! Trades are replayed as entry and exit events against a single running
//! portfolio value. Shares are fixed at entry from the portfolio value at
//! that moment; profit lands on the portfolio at exit. Pure and deterministic.

use chrono::NaiveDate;
use edgelab_core::domain::Trade;
use serde::{Deserialize, Serialize};

// ─── Configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSizingConfig {
    #[serde(default = "default_starting_capital")]
    pub starting_capital: f64,
    /// Percent of current portfolio value risked per trade.
    #[serde(default = "default_risk_percentage")]
    pub risk_percentage: f64,
    /// Stop distance in ATR units.
    #[serde(default = "default_n_atr")]
    pub n_atr: f64,
    /// Cap on open notional relative to portfolio value. `None` means uncapped.
    #[serde(default)]
    pub leverage_ratio: Option<f64>,
}

fn default_starting_capital() -> f64 {
    100_000.0
}

fn default_risk_percentage() -> f64 {
    1.5
}

fn default_n_atr() -> f64 {
    2.0
}

impl Default for PositionSizingConfig {
    fn default() -> Self {
        Self {
            starting_capital: default_starting_capital(),
            risk_percentage: default_risk_percentage(),
            n_atr: default_n_atr(),
            leverage_ratio: None,
        }
    }
}

// ─── Results ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSizedTrade {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub shares: u64,
    pub dollar_profit: f64,
    pub portfolio_value_at_entry: f64,
    pub portfolio_return_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioEquityPoint {
    pub date: NaiveDate,
    pub portfolio_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSizingResult {
    pub starting_capital: f64,
    pub final_capital: f64,
    pub total_return_pct: f64,
    pub max_drawdown_pct: f64,
    pub max_drawdown_dollars: f64,
    pub peak_capital: f64,
    /// Sized trades in exit-event order.
    pub trades: Vec<PositionSizedTrade>,
    /// Starting point at the first event date, then one point per exit.
    pub equity_curve: Vec<PortfolioEquityPoint>,
}

impl PositionSizingResult {
    fn empty(config: &PositionSizingConfig) -> Self {
        Self {
            starting_capital: config.starting_capital,
            final_capital: config.starting_capital,
            total_return_pct: 0.0,
            max_drawdown_pct: 0.0,
            max_drawdown_dollars: 0.0,
            peak_capital: config.starting_capital,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }
}

// ─── Sizing ──────────────────────────────────────────────────────────

/// `floor(portfolio_value * risk% / (n_atr * atr))`.
///
/// Zero when ATR or portfolio value is non-positive, or the stop distance is
/// degenerate. Never negative.
pub fn calculate_shares(portfolio_value: f64, atr: f64, config: &PositionSizingConfig) -> u64 {
    if atr <= 0.0 || portfolio_value <= 0.0 {
        return 0;
    }
    let stop_distance = config.n_atr * atr;
    if stop_distance <= 0.0 {
        return 0;
    }
    let risk_dollars = portfolio_value * config.risk_percentage / 100.0;
    let shares = (risk_dollars / stop_distance).floor();
    if shares.is_finite() && shares >= 1.0 {
        shares as u64
    } else {
        0
    }
}

/// Cap `shares` so total open notional stays within `capital * leverage_ratio`.
fn cap_by_leverage(
    shares: u64,
    entry_price: f64,
    portfolio_value: f64,
    open_notional: f64,
    leverage_ratio: f64,
) -> u64 {
    if shares == 0 || entry_price <= 0.0 {
        return shares;
    }
    let available = portfolio_value * leverage_ratio - open_notional;
    if available <= 0.0 {
        return 0;
    }
    shares.min((available / entry_price).floor() as u64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    Entry,
    Exit,
}

struct Event {
    date: NaiveDate,
    kind: EventKind,
    trade: usize,
}

struct OpenPosition {
    shares: u64,
    entry_price: f64,
    portfolio_value_at_entry: f64,
}

/// Replay `trades` against `config`.
///
/// Events are ordered by date with entries before exits on the same date and
/// ledger order breaking the remaining ties.
pub fn apply_position_sizing<'a>(
    trades: impl IntoIterator<Item = &'a Trade>,
    config: &PositionSizingConfig,
) -> PositionSizingResult {
    let trades: Vec<&Trade> = trades.into_iter().collect();
    if trades.is_empty() {
        return PositionSizingResult::empty(config);
    }

    let mut events: Vec<Event> = trades
        .iter()
        .enumerate()
        .flat_map(|(i, t)| {
            [
                Event {
                    date: t.entry_date(),
                    kind: EventKind::Entry,
                    trade: i,
                },
                Event {
                    date: t.exit_date(),
                    kind: EventKind::Exit,
                    trade: i,
                },
            ]
        })
        .collect();
    events.sort_by_key(|e| (e.date, e.kind, e.trade));

    let mut portfolio_value = config.starting_capital;
    let mut peak_capital = config.starting_capital;
    let mut max_drawdown_dollars = 0.0_f64;
    let mut max_drawdown_pct = 0.0_f64;
    let mut open_notional = 0.0_f64;
    let mut open: Vec<Option<OpenPosition>> = trades.iter().map(|_| None).collect();
    let mut sized = Vec::with_capacity(trades.len());
    let mut equity_curve = Vec::with_capacity(trades.len() + 1);
    equity_curve.push(PortfolioEquityPoint {
        date: events[0].date,
        portfolio_value,
    });

    for event in &events {
        let trade = trades[event.trade];
        match event.kind {
            EventKind::Entry => {
                let entry_price = trade.entry_price();
                let mut shares = calculate_shares(portfolio_value, trade.entry_quote.atr, config);
                if let Some(ratio) = config.leverage_ratio {
                    shares =
                        cap_by_leverage(shares, entry_price, portfolio_value, open_notional, ratio);
                }
                open_notional += shares as f64 * entry_price;
                open[event.trade] = Some(OpenPosition {
                    shares,
                    entry_price,
                    portfolio_value_at_entry: portfolio_value,
                });
            }
            EventKind::Exit => {
                let Some(position) = open[event.trade].take() else {
                    continue;
                };
                open_notional -= position.shares as f64 * position.entry_price;
                let dollar_profit = position.shares as f64 * trade.profit;
                portfolio_value += dollar_profit;

                let portfolio_return_pct = if position.portfolio_value_at_entry > 0.0 {
                    dollar_profit / position.portfolio_value_at_entry * 100.0
                } else {
                    0.0
                };
                sized.push(PositionSizedTrade {
                    symbol: trade.symbol.clone(),
                    entry_date: trade.entry_date(),
                    exit_date: trade.exit_date(),
                    entry_price: position.entry_price,
                    exit_price: trade.exit_price(),
                    shares: position.shares,
                    dollar_profit,
                    portfolio_value_at_entry: position.portfolio_value_at_entry,
                    portfolio_return_pct,
                });

                peak_capital = peak_capital.max(portfolio_value);
                let drawdown = peak_capital - portfolio_value;
                max_drawdown_dollars = max_drawdown_dollars.max(drawdown);
                if peak_capital > 0.0 {
                    max_drawdown_pct = max_drawdown_pct.max(drawdown / peak_capital * 100.0);
                }
                equity_curve.push(PortfolioEquityPoint {
                    date: event.date,
                    portfolio_value,
                });
            }
        }
    }

    let total_return_pct = if config.starting_capital > 0.0 {
        (portfolio_value / config.starting_capital - 1.0) * 100.0
    } else {
        0.0
    };

    PositionSizingResult {
        starting_capital: config.starting_capital,
        final_capital: portfolio_value,
        total_return_pct,
        max_drawdown_pct,
        max_drawdown_dollars,
        peak_capital,
        trades: sized,
        equity_curve,
    }
}

//! Integration tests for ATR position sizing over trade ledgers.
//!
//! Tests:
//! 1. Single trade end-to-end: shares, dollar profit, final capital, return
//! 2. Capital compounds into the next trade's size
//! 3. Overlapping trades are both sized from the same portfolio value
//! 4. Same-day exit and entry: the entry is sized before the exit lands
//! 5. Leverage cap clamps the third concurrent entry
//! 6. Exhausted leverage gives zero shares
//! 7. Zero ATR gives zero shares and leaves capital untouched
//! 8. Drawdown in dollars and percent

use chrono::NaiveDate;
use edgelab_core::domain::{BacktestReport, ExitReason, Quote, Trade};
use edgelab_runner::sizing::{apply_position_sizing, PositionSizingConfig};

// ─── Fixtures ────────────────────────────────────────────────────────

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn trade(
    symbol: &str,
    entry_day: u32,
    exit_day: u32,
    entry_close: f64,
    exit_close: f64,
    atr: f64,
) -> Trade {
    Trade {
        symbol: symbol.into(),
        underlying_symbol: None,
        sector: "Technology".into(),
        entry_quote: Quote::new(symbol, day(entry_day), entry_close, atr),
        exit_reason: ExitReason::Signal("Sell signal".into()),
        quotes: vec![Quote::new(symbol, day(exit_day), exit_close, atr)],
        profit: exit_close - entry_close,
    }
}

fn leveraged(ratio: f64) -> PositionSizingConfig {
    PositionSizingConfig {
        leverage_ratio: Some(ratio),
        ..PositionSizingConfig::default()
    }
}

// ─── Basic sizing ────────────────────────────────────────────────────

#[test]
fn single_trade_end_to_end() {
    let ledger = [trade("AAPL", 1, 6, 100.0, 110.0, 2.0)];
    let result = apply_position_sizing(&ledger, &PositionSizingConfig::default());

    assert_eq!(result.trades.len(), 1);
    let sized = &result.trades[0];
    assert_eq!(sized.shares, 375);
    assert!((sized.dollar_profit - 3_750.0).abs() < 1e-9);
    assert_eq!(sized.portfolio_value_at_entry, 100_000.0);
    assert!((sized.portfolio_return_pct - 3.75).abs() < 1e-9);

    assert!((result.final_capital - 103_750.0).abs() < 1e-9);
    assert!((result.total_return_pct - 3.75).abs() < 1e-9);
    assert_eq!(result.peak_capital, result.final_capital);
    assert_eq!(result.max_drawdown_pct, 0.0);

    assert_eq!(result.equity_curve.len(), 2);
    assert_eq!(result.equity_curve[0].date, day(1));
    assert_eq!(result.equity_curve[0].portfolio_value, 100_000.0);
    assert_eq!(result.equity_curve[1].date, day(6));
}

#[test]
fn capital_compounds_into_next_trade() {
    let ledger = [
        trade("AAPL", 1, 6, 100.0, 110.0, 2.0),
        trade("MSFT", 8, 10, 100.0, 100.0, 2.0),
    ];
    let result = apply_position_sizing(&ledger, &PositionSizingConfig::default());
    // 103_750 * 1.5% = 1556.25; / 4 = 389.06
    assert_eq!(result.trades[1].shares, 389);
    assert_eq!(result.trades[1].portfolio_value_at_entry, 103_750.0);
}

#[test]
fn overlapping_trades_share_the_entry_value() {
    let ledger = [
        trade("AAPL", 1, 5, 100.0, 97.0, 2.0),
        trade("MSFT", 2, 8, 50.0, 51.0, 0.5),
    ];
    let result = apply_position_sizing(&ledger, &PositionSizingConfig::default());

    assert_eq!(result.trades[0].shares, 375);
    assert!((result.trades[0].dollar_profit - -1_125.0).abs() < 1e-9);
    // Sized at entry, before the AAPL loss landed: 1500 / (2 * 0.5).
    assert_eq!(result.trades[1].shares, 1_500);
    assert_eq!(result.trades[1].portfolio_value_at_entry, 100_000.0);

    assert!((result.final_capital - 100_375.0).abs() < 1e-9);
    let values: Vec<f64> = result
        .equity_curve
        .iter()
        .map(|p| p.portfolio_value)
        .collect();
    assert_eq!(values, vec![100_000.0, 98_875.0, 100_375.0]);
}

#[test]
fn same_day_entry_is_sized_before_exit() {
    let ledger = [
        trade("AAPL", 1, 6, 100.0, 110.0, 2.0),
        trade("MSFT", 6, 9, 100.0, 101.0, 2.0),
    ];
    let result = apply_position_sizing(&ledger, &PositionSizingConfig::default());
    assert_eq!(result.trades[1].symbol, "MSFT");
    assert_eq!(result.trades[1].portfolio_value_at_entry, 100_000.0);
    assert_eq!(result.trades[1].shares, 375);
}

// ─── Leverage ────────────────────────────────────────────────────────

#[test]
fn leverage_cap_clamps_third_entry() {
    let ledger = [
        trade("A", 1, 10, 100.0, 100.0, 2.0),
        trade("B", 2, 11, 100.0, 100.0, 2.0),
        trade("C", 3, 12, 80.0, 80.0, 2.0),
    ];
    let result = apply_position_sizing(&ledger, &leveraged(1.0));
    let shares: Vec<u64> = result.trades.iter().map(|t| t.shares).collect();
    // $25 000 left / $80 = 312.5
    assert_eq!(shares, vec![375, 375, 312]);
}

#[test]
fn exhausted_leverage_gives_zero_shares() {
    let ledger = [
        trade("A", 1, 10, 200.0, 200.0, 2.0),
        trade("B", 2, 11, 100.0, 100.0, 2.0),
        trade("C", 3, 12, 100.0, 101.0, 2.0),
    ];
    let result = apply_position_sizing(&ledger, &leveraged(1.0));
    let shares: Vec<u64> = result.trades.iter().map(|t| t.shares).collect();
    // First notional $75 000; second gets $25 000 / $100; third nothing.
    assert_eq!(shares, vec![375, 250, 0]);
    assert_eq!(result.trades[2].dollar_profit, 0.0);
    assert_eq!(result.final_capital, 100_000.0);
}

#[test]
fn capacity_returns_after_exit() {
    let ledger = [
        trade("A", 1, 3, 200.0, 200.0, 2.0),
        trade("B", 2, 11, 100.0, 100.0, 2.0),
        trade("C", 4, 12, 100.0, 100.0, 2.0),
    ];
    let result = apply_position_sizing(&ledger, &leveraged(1.0));
    // A exits on day 3, freeing $75 000 before C enters.
    let c = result.trades.iter().find(|t| t.symbol == "C").unwrap();
    assert_eq!(c.shares, 375);
}

// ─── Degenerate inputs ───────────────────────────────────────────────

#[test]
fn zero_atr_gives_zero_shares() {
    let ledger = [trade("AAPL", 1, 6, 100.0, 110.0, 0.0)];
    let result = apply_position_sizing(&ledger, &PositionSizingConfig::default());
    assert_eq!(result.trades[0].shares, 0);
    assert_eq!(result.trades[0].dollar_profit, 0.0);
    assert_eq!(result.final_capital, 100_000.0);
    assert_eq!(result.total_return_pct, 0.0);
}

#[test]
fn drawdown_dollars_and_percent() {
    let ledger = [
        trade("A", 1, 3, 100.0, 110.0, 2.0),
        trade("B", 5, 7, 100.0, 90.0, 2.0),
    ];
    let result = apply_position_sizing(&ledger, &PositionSizingConfig::default());
    // Peak 103 750; B is sized at 389 shares and loses $10 each.
    let loss = 389.0 * 10.0;
    assert!((result.max_drawdown_dollars - loss).abs() < 1e-9);
    assert!((result.max_drawdown_pct - loss / 103_750.0 * 100.0).abs() < 1e-9);
    assert_eq!(result.peak_capital, 103_750.0);
}

#[test]
fn sizes_a_report_ledger() {
    let report = BacktestReport::from_trades(
        vec![
            trade("B", 5, 7, 100.0, 90.0, 2.0),
            trade("A", 1, 3, 100.0, 110.0, 2.0),
        ],
        Vec::new(),
    );
    let result = apply_position_sizing(report.trades(), &PositionSizingConfig::default());
    assert_eq!(result.trades[0].symbol, "A");
    assert_eq!(result.trades[1].shares, 389);
}

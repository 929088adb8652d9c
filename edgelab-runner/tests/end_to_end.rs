//! End-to-end pipeline test: TOML config + CSV quotes on disk → artifacts.
//!
//! Two symbols over ten trading days with one position slot:
//! - AAA: buy signal day 1 at $100 (ATR 2), sell signal day 6 at $110
//! - BBB: buy signal day 2 while the slot is taken → missed trade
//!
//! Tests:
//! 1. Config loads with relative data paths
//! 2. Backtest, sizing and Monte Carlo results match hand-computed values
//! 3. Artifact directory contains every file and reloads losslessly

use std::fmt::Write as _;
use std::path::Path;

use chrono::NaiveDate;
use edgelab_runner::config::RunConfig;
use edgelab_runner::export::{load_artifacts, save_artifacts};
use edgelab_runner::runner::run;

const CONFIG: &str = r#"
[data]
quotes = "quotes.csv"
sectors = "sectors.toml"

[backtest]
entry = "buy_signal"
exit = "sell_signal"
max_positions = 1
ranker = "volatility"

[position_sizing]
starting_capital = 100000.0
risk_percentage = 1.5
n_atr = 2.0

[monte_carlo]
technique = "trade_shuffling"
iterations = 100
seed = 42
"#;

const SECTORS: &str = r#"
[sectors]
Technology = ["AAA"]
Energy = ["BBB"]
"#;

fn quotes_csv() -> String {
    let mut csv = String::from("symbol,date,close,atr,buy_signal,sell_signal\n");
    for day in 1..=10u32 {
        let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let aaa = 100.0 + 2.0 * (day - 1) as f64;
        writeln!(csv, "AAA,{date},{aaa},2.0,{},{}", day == 1, day == 6).unwrap();
        let bbb = 50.0 + (day - 1) as f64;
        writeln!(csv, "BBB,{date},{bbb},1.0,{},{}", day == 2, day == 8).unwrap();
    }
    csv
}

fn write_inputs(dir: &Path) -> std::path::PathBuf {
    std::fs::write(dir.join("quotes.csv"), quotes_csv()).unwrap();
    std::fs::write(dir.join("sectors.toml"), SECTORS).unwrap();
    let config = dir.join("run.toml");
    std::fs::write(&config, CONFIG).unwrap();
    config
}

#[test]
fn pipeline_from_disk_to_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig::from_file(&write_inputs(dir.path())).unwrap();
    let output = run(&config).unwrap();

    // ── Backtest ──
    assert_eq!(output.symbol_count, 2);
    let trades = output.report.trades();
    assert_eq!(trades.len(), 1);
    let trade = trades[0];
    assert_eq!(trade.symbol, "AAA");
    assert_eq!(trade.sector, "Technology");
    assert!((trade.profit - 10.0).abs() < 1e-9);
    assert_eq!(trade.exit_reason.to_string(), "Sell signal");

    assert_eq!(output.report.missed_trades.len(), 1);
    assert_eq!(output.report.missed_trades[0].symbol, "BBB");
    assert_eq!(output.report.missed_trades[0].sector, "Energy");

    // ── Sizing ──
    let sizing = output.position_sizing.as_ref().unwrap();
    assert_eq!(sizing.trades[0].shares, 375);
    assert!((sizing.trades[0].dollar_profit - 3_750.0).abs() < 1e-9);
    assert!((sizing.final_capital - 103_750.0).abs() < 1e-9);
    assert!((sizing.total_return_pct - 3.75).abs() < 1e-9);

    // ── Monte Carlo ──
    let mc = output.monte_carlo.as_ref().unwrap();
    assert_eq!(mc.iterations, 100);
    assert!((mc.original_return_pct - 3.75).abs() < 1e-9);
    assert!((mc.statistics.probability_of_profit - 100.0).abs() < 1e-12);

    // ── Analytics ──
    assert_eq!(output.analytics.sectors.len(), 1);
    assert_eq!(output.analytics.exit_reasons[0].reason, "Sell signal");

    // ── Artifacts ──
    let out_dir = dir.path().join("out");
    let written = save_artifacts(&output, &out_dir).unwrap();
    assert_eq!(written.len(), 4);
    for name in ["report.json", "trades.csv", "equity.csv", "monte_carlo.json"] {
        assert!(out_dir.join(name).exists(), "missing {name}");
    }
    let equity = std::fs::read_to_string(out_dir.join("equity.csv")).unwrap();
    assert!(equity.lines().last().unwrap().ends_with("103750.00"));

    let reloaded = load_artifacts(&out_dir).unwrap();
    assert_eq!(reloaded.report, output.report);
    assert_eq!(reloaded.position_sizing, output.position_sizing);
}

#[test]
fn missing_quote_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_inputs(dir.path());
    std::fs::remove_file(dir.path().join("quotes.csv")).unwrap();
    let config = RunConfig::from_file(&config_path).unwrap();
    let err = run(&config).unwrap_err();
    assert!(err.to_string().contains("quotes.csv"));
}

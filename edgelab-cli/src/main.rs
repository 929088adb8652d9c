//! EdgeLab CLI: run, strategies and monte-carlo commands.
//!
//! Commands:
//! - `run`: execute the full pipeline from a TOML config file
//! - `strategies`: list built-in entry/exit strategies, rankers and techniques
//! - `monte-carlo`: re-run Monte Carlo validation on a saved report

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use edgelab_core::ranker::RankerKind;
use edgelab_core::strategy::StrategyRegistry;
use edgelab_runner::config::ITERATIONS_RANGE;
use edgelab_runner::export::{export_monte_carlo_json, load_artifacts, save_artifacts};
use edgelab_runner::monte_carlo::{
    run_simulation, MonteCarloRequest, MonteCarloResult, MonteCarloTechnique,
};
use edgelab_runner::sizing::PositionSizingConfig;
use edgelab_runner::{run, RunConfig, RunOutput};

#[derive(Parser)]
#[command(
    name = "edgelab",
    about = "EdgeLab CLI: portfolio backtesting, ATR sizing and Monte Carlo validation"
)]
struct Cli {
    /// Debug-level logging.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute the full pipeline from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        out: PathBuf,
    },
    /// List built-in strategies, rankers and Monte Carlo techniques.
    Strategies,
    /// Run Monte Carlo validation on a saved run (directory or report.json).
    MonteCarlo {
        /// Artifact directory or path to its report.json.
        #[arg(long)]
        report: PathBuf,

        /// trade_shuffling or bootstrap_resampling.
        #[arg(long, default_value = "trade_shuffling")]
        technique: String,

        #[arg(long, default_value_t = 10_000)]
        iterations: usize,

        /// Master seed. Drawn from OS entropy when omitted.
        #[arg(long)]
        seed: Option<u64>,

        /// Size trades with default ATR sizing on $100 000.
        #[arg(long, default_value_t = false)]
        sized: bool,

        /// Write the result JSON here instead of only printing a summary.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run { config, out } => run_cmd(&config, &out),
        Commands::Strategies => {
            list_strategies();
            Ok(())
        }
        Commands::MonteCarlo {
            report,
            technique,
            iterations,
            seed,
            sized,
            out,
        } => monte_carlo_cmd(&report, &technique, iterations, seed, sized, out.as_deref()),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(filter)
        .init();
}

// ─── run ─────────────────────────────────────────────────────────────

fn run_cmd(config_path: &Path, out: &Path) -> Result<()> {
    let config = RunConfig::from_file(config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    let output = run(&config).context("pipeline failed")?;

    print_run_summary(&output);
    save_artifacts(&output, out)?;
    println!();
    println!("Artifacts saved to: {}", out.display());
    Ok(())
}

fn print_run_summary(output: &RunOutput) {
    let report = &output.report;
    println!();
    println!("=== Backtest Result ===");
    println!("Entry:          {}", output.entry_description);
    println!("Exit:           {}", output.exit_description);
    println!("Ranker:         {}", output.ranker_description);
    println!("Symbols:        {}", output.symbol_count);
    println!("Trades:         {}", report.total_trades());
    println!("Missed:         {}", report.missed_trades.len());
    println!();
    println!("--- Performance ---");
    println!("Win Rate:       {:.1}%", report.win_rate() * 100.0);
    println!("Avg Win:        {:.2}%", report.average_win_percent());
    println!("Avg Loss:       {:.2}%", report.average_loss_percent());
    println!("Edge:           {:.2}%", report.edge());
    match report.profit_factor() {
        Some(pf) => println!("Profit Factor:  {pf:.2}"),
        None => println!("Profit Factor:  n/a"),
    }

    if !output.analytics.exit_reasons.is_empty() {
        println!();
        println!("--- Exit Reasons ---");
        for stats in &output.analytics.exit_reasons {
            println!(
                "{:<24} {:>5}  avg {:>7.2}%  win {:>5.1}%",
                stats.reason,
                stats.count,
                stats.average_profit_percentage,
                stats.win_rate * 100.0
            );
        }
    }

    if let Some(sizing) = &output.position_sizing {
        println!();
        println!("--- Position Sizing ---");
        println!("Starting:       ${:.2}", sizing.starting_capital);
        println!("Final:          ${:.2}", sizing.final_capital);
        println!("Return:         {:.2}%", sizing.total_return_pct);
        println!(
            "Max Drawdown:   {:.2}% (${:.2})",
            sizing.max_drawdown_pct, sizing.max_drawdown_dollars
        );
    }

    if let Some(mc) = &output.monte_carlo {
        print_monte_carlo_summary(mc);
    }
}

// ─── strategies ──────────────────────────────────────────────────────

fn list_strategies() {
    let registry = StrategyRegistry::with_builtins();

    println!("Entry strategies (comma-separate to require all):");
    for (name, description) in registry.entry_descriptions() {
        println!("  {name:<20} {description}");
    }
    println!();
    println!("Exit strategies (comma-separate to exit on any):");
    for (name, description) in registry.exit_descriptions() {
        println!("  {name:<20} {description}");
    }
    println!();
    println!("Rankers:");
    for kind in RankerKind::ALL {
        println!("  {:<20} {}", kind.name(), kind.build(0).description());
    }
    println!();
    println!("Monte Carlo techniques:");
    for technique in MonteCarloTechnique::ALL {
        println!("  {:<26} {}", technique.name(), technique.description());
    }
}

// ─── monte-carlo ─────────────────────────────────────────────────────

fn monte_carlo_cmd(
    report_path: &Path,
    technique: &str,
    iterations: usize,
    seed: Option<u64>,
    sized: bool,
    out: Option<&Path>,
) -> Result<()> {
    let technique: MonteCarloTechnique = technique.parse().map_err(anyhow::Error::msg)?;
    if !ITERATIONS_RANGE.contains(&iterations) {
        bail!(
            "--iterations must be within {}..={}, got {iterations}",
            ITERATIONS_RANGE.start(),
            ITERATIONS_RANGE.end()
        );
    }

    let dir = if report_path.is_dir() {
        report_path
    } else {
        report_path.parent().unwrap_or(Path::new("."))
    };
    let output = load_artifacts(dir)
        .with_context(|| format!("failed to load saved run from {}", report_path.display()))?;
    info!(trades = output.report.total_trades(), "Loaded saved run");

    let request = MonteCarloRequest {
        technique,
        iterations,
        seed,
        include_all_equity_curves: false,
        position_sizing: sized.then(PositionSizingConfig::default),
    };
    let result = run_simulation(&output.report, &request)?;
    print_monte_carlo_summary(&result);

    if let Some(path) = out {
        std::fs::write(path, export_monte_carlo_json(&result)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!();
        println!("Result saved to: {}", path.display());
    }
    Ok(())
}

fn print_monte_carlo_summary(mc: &MonteCarloResult) {
    let s = &mc.statistics;
    println!();
    println!("--- Monte Carlo ({}, {} iterations) ---", mc.technique, mc.iterations);
    println!("Seed:           {}", mc.seed);
    println!("Original:       {:.2}% return, {:.2}% edge", mc.original_return_pct, mc.original_edge);
    println!("Mean Return:    {:.2}% (median {:.2}%)", s.mean_return_pct, s.median_return_pct);
    println!(
        "95% CI:         [{:.2}%, {:.2}%]",
        s.return_confidence_interval_95.lower, s.return_confidence_interval_95.upper
    );
    println!(
        "Worst / Best:   {:.2}% / {:.2}% (p5 / p95)",
        s.worst_case_return_pct, s.best_case_return_pct
    );
    println!(
        "Max Drawdown:   {:.2}% mean, {:.2}% p95",
        s.mean_max_drawdown_pct, s.drawdown_percentiles.p95
    );
    println!("P(profit):      {:.1}%", s.probability_of_profit);
    println!("Elapsed:        {} ms", mc.execution_time_ms);
}

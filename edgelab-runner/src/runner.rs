//! Pipeline runner: wires data loading, the backtest engine, sizing,
//! analytics and Monte Carlo into one call.
//!
//! Two entry points:
//! - `run()`: loads the universe named in the config, then runs. Used by CLI.
//! - `run_with_stocks()`: takes a pre-loaded universe and a registry. No I/O.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use edgelab_core::domain::{BacktestReport, Stock};
use edgelab_core::engine::{run_backtest, BacktestError};
use edgelab_core::strategy::{RegistryError, StrategyRegistry};

use crate::analytics::ReportAnalytics;
use crate::config::{BacktestConfig, ConfigError, RunConfig};
use crate::data_loader::{load_universe, LoadError};
use crate::monte_carlo::{run_simulation, MonteCarloError, MonteCarloResult};
use crate::sizing::{apply_position_sizing, PositionSizingResult};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("strategy error: {0}")]
    Strategy(#[from] RegistryError),
    #[error("backtest error: {0}")]
    Backtest(#[from] BacktestError),
    #[error("monte carlo error: {0}")]
    MonteCarlo(#[from] MonteCarloError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Backtest section as configured.
    pub backtest: BacktestConfig,
    pub entry_description: String,
    pub exit_description: String,
    pub ranker_description: String,
    pub symbol_count: usize,
    pub report: BacktestReport,
    pub analytics: ReportAnalytics,
    #[serde(default)]
    pub position_sizing: Option<PositionSizingResult>,
    #[serde(default)]
    pub monte_carlo: Option<MonteCarloResult>,
}

/// Load the configured universe and run the full pipeline with built-in strategies.
pub fn run(config: &RunConfig) -> Result<RunOutput, RunError> {
    config.validate()?;
    let stocks = load_universe(&config.data)?;
    run_with_stocks(config, &stocks, &StrategyRegistry::with_builtins())
}

/// Run the pipeline over a pre-loaded universe.
///
/// Monte Carlo is skipped with a warning when the backtest produced no
/// trades; every other failure is returned.
pub fn run_with_stocks(
    config: &RunConfig,
    stocks: &[Stock],
    registry: &StrategyRegistry,
) -> Result<RunOutput, RunError> {
    let bt = &config.backtest;
    let entry = registry.entry(&bt.entry)?;
    let exit = registry.exit(&bt.exit)?;
    let ranker = bt.ranker.build(bt.ranker_seed);
    let options = config.backtest_options();

    info!(
        entry = %entry.description(),
        exit = %exit.description(),
        ranker = %bt.ranker,
        symbols = stocks.len(),
        "Running pipeline"
    );

    let report = run_backtest(entry.as_ref(), exit.as_ref(), stocks, &options, ranker.as_ref())?;
    let analytics = ReportAnalytics::compute(&report);

    let position_sizing = config.position_sizing.as_ref().map(|sizing| {
        let result = apply_position_sizing(report.trades(), sizing);
        info!(
            final_capital = result.final_capital,
            total_return_pct = result.total_return_pct,
            max_drawdown_pct = result.max_drawdown_pct,
            "Position sizing applied"
        );
        result
    });

    let monte_carlo = match config.monte_carlo_request() {
        Some(_) if report.is_empty() => {
            warn!("Skipping Monte Carlo: the backtest produced no trades");
            None
        }
        Some(request) => Some(run_simulation(&report, &request)?),
        None => None,
    };

    Ok(RunOutput {
        schema_version: SCHEMA_VERSION,
        backtest: bt.clone(),
        entry_description: entry.description(),
        exit_description: exit.description(),
        ranker_description: ranker.description(),
        symbol_count: stocks.len(),
        report,
        analytics,
        position_sizing,
        monte_carlo,
    })
}

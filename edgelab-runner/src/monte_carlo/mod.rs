//! Monte Carlo validation: perturbs a trade ledger to estimate the
//! distribution of outcomes.
//!
//! Each scenario owns an RNG stream derived from `(master_seed, scenario)`
//! through the BLAKE3 hierarchy, so scenarios fan out over rayon without
//! shared state and the result is identical for any thread count. All
//! aggregation happens after every scenario has been collected.

pub mod scenario;
pub mod statistics;
pub mod technique;

pub use scenario::{MonteCarloScenario, ScenarioEquityPoint};
pub use statistics::{
    ConfidenceInterval, MonteCarloStatistics, PercentileCurvePoint, PercentileEquityCurves,
    Percentiles,
};
pub use technique::MonteCarloTechnique;

use edgelab_core::domain::{BacktestReport, Trade};
use edgelab_core::rng::RngHierarchy;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::info;

use crate::sizing::PositionSizingConfig;
use scenario::{compounded_balances, sized_balances};

/// RNG stream name for scenario generation.
const SCENARIO_STREAM: &str = "monte-carlo";

// ─── Request / result ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloRequest {
    pub technique: MonteCarloTechnique,
    pub iterations: usize,
    /// Master seed. `None` draws one from OS entropy and reports it back.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Keep every scenario (with its equity curve) in the result.
    #[serde(default)]
    pub include_all_equity_curves: bool,
    /// Size trades sequentially instead of compounding trade percentages.
    #[serde(default)]
    pub position_sizing: Option<PositionSizingConfig>,
}

impl Default for MonteCarloRequest {
    fn default() -> Self {
        Self {
            technique: MonteCarloTechnique::TradeShuffling,
            iterations: 10_000,
            seed: None,
            include_all_equity_curves: false,
            position_sizing: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub technique: MonteCarloTechnique,
    pub iterations: usize,
    /// Master seed actually used.
    pub seed: u64,
    pub statistics: MonteCarloStatistics,
    /// Empty unless requested.
    pub scenarios: Vec<MonteCarloScenario>,
    pub percentile_equity_curves: PercentileEquityCurves,
    pub original_return_pct: f64,
    pub original_edge: f64,
    pub original_win_rate: f64,
    pub execution_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonteCarloError {
    #[error("Cannot run Monte Carlo simulation: the backtest has no trades")]
    EmptyLedger,
    #[error("Iterations must be positive, got {0}")]
    InvalidIterations(usize),
    #[error("Monte Carlo technique '{0}' is not implemented")]
    NotImplemented(MonteCarloTechnique),
}

// ─── Simulation ──────────────────────────────────────────────────────

/// Run `request.iterations` scenarios over the ledger of `report`.
///
/// The ledger is the report's trades in entry order; scenarios refer to it
/// by index.
pub fn run_simulation(
    report: &BacktestReport,
    request: &MonteCarloRequest,
) -> Result<MonteCarloResult, MonteCarloError> {
    if request.iterations == 0 {
        return Err(MonteCarloError::InvalidIterations(request.iterations));
    }
    let ledger: Vec<&Trade> = report.trades();
    if ledger.is_empty() {
        return Err(MonteCarloError::EmptyLedger);
    }
    if !request.technique.is_runnable() {
        return Err(MonteCarloError::NotImplemented(request.technique));
    }

    let start = Instant::now();
    let hierarchy = request
        .seed
        .map_or_else(RngHierarchy::from_entropy, RngHierarchy::new);
    let sizing = request.position_sizing.as_ref();
    info!(
        technique = %request.technique,
        iterations = request.iterations,
        trades = ledger.len(),
        seed = hierarchy.master_seed(),
        sized = sizing.is_some(),
        "Starting Monte Carlo simulation"
    );

    let scenarios = (1..=request.iterations)
        .into_par_iter()
        .map(|number| {
            let mut rng = hierarchy.rng_for(SCENARIO_STREAM, number as u64);
            let indices = request.technique.resample(ledger.len(), &mut rng)?;
            Ok(MonteCarloScenario::evaluate(number, indices, &ledger, sizing))
        })
        .collect::<Result<Vec<_>, MonteCarloError>>()?;

    let statistics = MonteCarloStatistics::from_scenarios(&scenarios);
    let percentile_equity_curves = PercentileEquityCurves::from_scenarios(&scenarios);
    let original_return_pct = original_return(&ledger, sizing);
    let execution_time_ms = start.elapsed().as_millis() as u64;

    info!(
        mean_return_pct = statistics.mean_return_pct,
        probability_of_profit = statistics.probability_of_profit,
        execution_time_ms,
        "Monte Carlo simulation complete"
    );

    Ok(MonteCarloResult {
        technique: request.technique,
        iterations: request.iterations,
        seed: hierarchy.master_seed(),
        statistics,
        scenarios: if request.include_all_equity_curves {
            scenarios
        } else {
            Vec::new()
        },
        percentile_equity_curves,
        original_return_pct,
        original_edge: report.edge(),
        original_win_rate: report.win_rate(),
        execution_time_ms,
    })
}

/// Return of the ledger in entry order, on the same basis as the scenarios.
fn original_return(ledger: &[&Trade], sizing: Option<&PositionSizingConfig>) -> f64 {
    let balances = match sizing {
        Some(config) => sized_balances(ledger, config),
        None => compounded_balances(ledger),
    };
    balances.last().map_or(0.0, |b| (b - 1.0) * 100.0)
}

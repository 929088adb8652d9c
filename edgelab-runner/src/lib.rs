//! EdgeLab Runner: position sizing, Monte Carlo validation and the run pipeline.
//!
//! This crate builds on `edgelab-core` to provide:
//! - ATR position sizing with an optional leverage cap
//! - Monte Carlo validation (trade shuffling, bootstrap resampling)
//! - Ledger analytics (excursions, exit reasons, sectors, stocks, years)
//! - TOML run configuration and CSV/JSON quote loading
//! - JSON/CSV artifact export

pub mod analytics;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod monte_carlo;
pub mod runner;
pub mod sizing;

pub use analytics::ReportAnalytics;
pub use config::{ConfigError, RunConfig};
pub use data_loader::{load_universe, LoadError};
pub use monte_carlo::{
    run_simulation, MonteCarloError, MonteCarloRequest, MonteCarloResult, MonteCarloStatistics,
    MonteCarloTechnique,
};
pub use runner::{run, run_with_stocks, RunError, RunOutput, SCHEMA_VERSION};
pub use sizing::{
    apply_position_sizing, calculate_shares, PositionSizingConfig, PositionSizingResult,
};

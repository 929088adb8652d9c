//! Run configuration: one TOML file describing data, strategy, sizing and
//! Monte Carlo settings for a full pipeline run.

use chrono::NaiveDate;
use edgelab_core::engine::BacktestOptions;
use edgelab_core::ranker::RankerKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::monte_carlo::{MonteCarloRequest, MonteCarloTechnique};
use crate::sizing::PositionSizingConfig;

/// Accepted Monte Carlo iteration counts for a configured run.
pub const ITERATIONS_RANGE: std::ops::RangeInclusive<usize> = 100..=100_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete configuration for a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub data: DataConfig,
    pub backtest: BacktestConfig,
    /// Dollar equity curve; skipped when absent.
    #[serde(default)]
    pub position_sizing: Option<PositionSizingConfig>,
    /// Monte Carlo validation; skipped when absent.
    #[serde(default)]
    pub monte_carlo: Option<MonteCarloConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// CSV or JSON quote file (format chosen by extension).
    pub quotes: PathBuf,
    /// Optional universe TOML with a `[sectors]` table of ticker lists.
    #[serde(default)]
    pub sectors: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Entry strategy name, or a comma-separated list combined with AND.
    pub entry: String,
    /// Exit strategy name, or a comma-separated list combined with OR.
    pub exit: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub max_positions: Option<usize>,
    #[serde(default)]
    pub ranker: RankerKind,
    /// Seed for the random ranker.
    #[serde(default)]
    pub ranker_seed: u64,
    #[serde(default)]
    pub cooldown_days: usize,
    #[serde(default)]
    pub entry_delay_days: usize,
    #[serde(default)]
    pub use_underlying_assets: bool,
    /// Trading symbol → strategy symbol.
    #[serde(default)]
    pub underlying_map: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    #[serde(default = "default_technique")]
    pub technique: MonteCarloTechnique,
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub include_all_equity_curves: bool,
}

fn default_technique() -> MonteCarloTechnique {
    MonteCarloTechnique::TradeShuffling
}

fn default_iterations() -> usize {
    1_000
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            technique: default_technique(),
            iterations: default_iterations(),
            seed: None,
            include_all_equity_curves: false,
        }
    }
}

impl RunConfig {
    /// Load from a file. Relative data paths resolve against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            config.data.resolve_against(base);
        }
        Ok(config)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bt = &self.backtest;
        if bt.entry.trim().is_empty() || bt.exit.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "backtest.entry and backtest.exit must name a strategy".into(),
            ));
        }
        if let (Some(start), Some(end)) = (bt.start_date, bt.end_date) {
            if start > end {
                return Err(ConfigError::Invalid(format!(
                    "backtest.start_date {start} is after end_date {end}"
                )));
            }
        }
        if bt.max_positions == Some(0) {
            return Err(ConfigError::Invalid(
                "backtest.max_positions must be at least 1 (omit it for unlimited)".into(),
            ));
        }
        if let Some(sizing) = &self.position_sizing {
            if sizing.starting_capital <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "position_sizing.starting_capital must be positive, got {}",
                    sizing.starting_capital
                )));
            }
            if sizing.n_atr <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "position_sizing.n_atr must be positive, got {}",
                    sizing.n_atr
                )));
            }
        }
        if let Some(mc) = &self.monte_carlo {
            if !ITERATIONS_RANGE.contains(&mc.iterations) {
                return Err(ConfigError::Invalid(format!(
                    "monte_carlo.iterations must be within {}..={}, got {}",
                    ITERATIONS_RANGE.start(),
                    ITERATIONS_RANGE.end(),
                    mc.iterations
                )));
            }
        }
        Ok(())
    }

    /// Engine options for the configured backtest.
    pub fn backtest_options(&self) -> BacktestOptions {
        let bt = &self.backtest;
        let defaults = BacktestOptions::default();
        BacktestOptions {
            start_date: bt.start_date.unwrap_or(defaults.start_date),
            end_date: bt.end_date.unwrap_or(defaults.end_date),
            max_positions: bt.max_positions,
            use_underlying_assets: bt.use_underlying_assets,
            underlying_map: bt.underlying_map.clone(),
            cooldown_days: bt.cooldown_days,
            entry_delay_days: bt.entry_delay_days,
        }
    }

    /// Monte Carlo request, sized when `[position_sizing]` is present.
    pub fn monte_carlo_request(&self) -> Option<MonteCarloRequest> {
        self.monte_carlo.as_ref().map(|mc| MonteCarloRequest {
            technique: mc.technique,
            iterations: mc.iterations,
            seed: mc.seed,
            include_all_equity_curves: mc.include_all_equity_curves,
            position_sizing: self.position_sizing.clone(),
        })
    }
}

impl DataConfig {
    fn resolve_against(&mut self, base: &Path) {
        if self.quotes.is_relative() {
            self.quotes = base.join(&self.quotes);
        }
        if let Some(sectors) = &self.sectors {
            if sectors.is_relative() {
                self.sectors = Some(base.join(sectors));
            }
        }
    }
}

//! Resampling techniques: how a scenario reorders or redraws the ledger.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::MonteCarloError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonteCarloTechnique {
    /// Permute trade order. Total return is invariant, the path is not.
    TradeShuffling,
    /// Draw `n` trades with replacement from the pooled ledger.
    BootstrapResampling,
    /// Perturb the underlying price paths. Declared, not runnable.
    PricePathRandomization,
}

impl MonteCarloTechnique {
    pub const ALL: [MonteCarloTechnique; 3] = [
        MonteCarloTechnique::TradeShuffling,
        MonteCarloTechnique::BootstrapResampling,
        MonteCarloTechnique::PricePathRandomization,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MonteCarloTechnique::TradeShuffling => "trade_shuffling",
            MonteCarloTechnique::BootstrapResampling => "bootstrap_resampling",
            MonteCarloTechnique::PricePathRandomization => "price_path_randomization",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MonteCarloTechnique::TradeShuffling => {
                "Randomly reorders trades to test if edge holds regardless of sequence"
            }
            MonteCarloTechnique::BootstrapResampling => {
                "Draws trades with replacement to estimate the range of possible outcomes"
            }
            MonteCarloTechnique::PricePathRandomization => {
                "Randomizes price paths around the original series (not implemented)"
            }
        }
    }

    pub fn is_runnable(&self) -> bool {
        !matches!(self, MonteCarloTechnique::PricePathRandomization)
    }

    /// Ledger indices for one scenario over a ledger of `n` trades.
    pub fn resample<R: Rng>(
        &self,
        n: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>, MonteCarloError> {
        match self {
            MonteCarloTechnique::TradeShuffling => {
                let mut indices: Vec<usize> = (0..n).collect();
                indices.shuffle(rng);
                Ok(indices)
            }
            MonteCarloTechnique::BootstrapResampling => {
                if n == 0 {
                    return Ok(Vec::new());
                }
                Ok((0..n).map(|_| rng.gen_range(0..n)).collect())
            }
            MonteCarloTechnique::PricePathRandomization => {
                Err(MonteCarloError::NotImplemented(*self))
            }
        }
    }
}

impl fmt::Display for MonteCarloTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MonteCarloTechnique {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        MonteCarloTechnique::ALL
            .into_iter()
            .find(|t| t.name() == wanted)
            .ok_or_else(|| format!("Unknown Monte Carlo technique: '{s}'"))
    }
}

//! Stock rankers: decide which same-day entry signals get scarce slots.
//!
//! A ranker scores `(stock, quote)` pairs; higher is better. Ordering is a
//! total order: score descending, then symbol ascending, then date ascending.
//! Every ranker is deterministic, including the seeded random baseline.

use crate::domain::{Quote, Stock};
use crate::engine::BacktestError;
use crate::rng::hash_unit;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub trait StockRanker: Send + Sync {
    fn score(&self, stock: &Stock, quote: &Quote) -> f64;

    fn description(&self) -> String;

    /// Order `candidates` best first. Returns indices into `candidates`.
    fn rank(&self, candidates: &[(&Stock, &Quote)]) -> Vec<usize> {
        let scores: Vec<f64> = candidates.iter().map(|(s, q)| self.score(s, q)).collect();
        let mut order: Vec<usize> = (0..candidates.len()).collect();
        order.sort_by(|&a, &b| {
            scores[b]
                .total_cmp(&scores[a])
                .then_with(|| compare_key(candidates[a], candidates[b]))
        });
        order
    }
}

fn compare_key(a: (&Stock, &Quote), b: (&Stock, &Quote)) -> Ordering {
    a.0.symbol
        .cmp(&b.0.symbol)
        .then_with(|| a.1.date.cmp(&b.1.date))
}

// ─── Implementations ─────────────────────────────────────────────────

/// ATR as a percentage of price; more volatile ranks higher.
#[derive(Debug, Clone, Copy, Default)]
pub struct VolatilityRanker;

impl StockRanker for VolatilityRanker {
    fn score(&self, _stock: &Stock, quote: &Quote) -> f64 {
        quote.atr_percent()
    }

    fn description(&self) -> String {
        "ATR as % of price (higher volatility = better)".into()
    }
}

/// Negative absolute distance from the 10 EMA in percent; closer ranks higher.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceFromEmaRanker;

impl StockRanker for DistanceFromEmaRanker {
    fn score(&self, _stock: &Stock, quote: &Quote) -> f64 {
        if quote.ema_10 == 0.0 {
            return 0.0;
        }
        let distance = (quote.close - quote.ema_10) / quote.ema_10 * 100.0;
        -distance.abs()
    }

    fn description(&self) -> String {
        "Distance from 10 EMA (closer = better)".into()
    }
}

/// Sector breadth (bull %) at the entry date. Zero when unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectorStrengthRanker;

impl StockRanker for SectorStrengthRanker {
    fn score(&self, _stock: &Stock, quote: &Quote) -> f64 {
        quote.sector_breadth.unwrap_or(0.0)
    }

    fn description(&self) -> String {
        "Sector strength (bull %)".into()
    }
}

/// Weighted blend of volatility, EMA distance and sector strength, each
/// normalized onto 0-100 over a fixed range.
#[derive(Debug, Clone, Copy)]
pub struct CompositeRanker {
    pub volatility_weight: f64,
    pub distance_weight: f64,
    pub sector_weight: f64,
}

impl Default for CompositeRanker {
    fn default() -> Self {
        Self {
            volatility_weight: 0.4,
            distance_weight: 0.3,
            sector_weight: 0.3,
        }
    }
}

impl StockRanker for CompositeRanker {
    fn score(&self, stock: &Stock, quote: &Quote) -> f64 {
        let volatility = normalize(VolatilityRanker.score(stock, quote), 0.0, 10.0);
        let distance = normalize(DistanceFromEmaRanker.score(stock, quote), -10.0, 0.0);
        let sector = normalize(SectorStrengthRanker.score(stock, quote), 0.0, 100.0);
        volatility * self.volatility_weight
            + distance * self.distance_weight
            + sector * self.sector_weight
    }

    fn description(&self) -> String {
        format!(
            "Composite (Vol {}%, Dist10EMA {}%, Sector {}%)",
            self.volatility_weight * 100.0,
            self.distance_weight * 100.0,
            self.sector_weight * 100.0
        )
    }
}

fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        return 50.0;
    }
    (value - min) / (max - min) * 100.0
}

/// Volatility when market breadth is above 60%, EMA distance otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdaptiveRanker;

const TRENDING_BREADTH: f64 = 60.0;

impl StockRanker for AdaptiveRanker {
    fn score(&self, stock: &Stock, quote: &Quote) -> f64 {
        let trending = quote
            .market_breadth
            .is_some_and(|breadth| breadth > TRENDING_BREADTH);
        if trending {
            VolatilityRanker.score(stock, quote)
        } else {
            DistanceFromEmaRanker.score(stock, quote)
        }
    }

    fn description(&self) -> String {
        "Adaptive (Volatility in trends, DistanceFrom10Ema in chop)".into()
    }
}

/// Baseline ranker. Scores hash `(seed, symbol, date)` into `[0, 100)`, so
/// the result is reproducible and independent of call order.
#[derive(Debug, Clone, Copy)]
pub struct RandomRanker {
    pub seed: u64,
}

impl StockRanker for RandomRanker {
    fn score(&self, stock: &Stock, quote: &Quote) -> f64 {
        let date = quote.date.to_string();
        hash_unit(self.seed, &[stock.symbol.as_bytes(), date.as_bytes()]) * 100.0
    }

    fn description(&self) -> String {
        "Random (baseline)".into()
    }
}

// ─── Selection by name ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankerKind {
    Volatility,
    DistanceFromEma,
    SectorStrength,
    #[default]
    Composite,
    Adaptive,
    Random,
}

impl RankerKind {
    pub const ALL: [RankerKind; 6] = [
        RankerKind::Volatility,
        RankerKind::DistanceFromEma,
        RankerKind::SectorStrength,
        RankerKind::Composite,
        RankerKind::Adaptive,
        RankerKind::Random,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RankerKind::Volatility => "volatility",
            RankerKind::DistanceFromEma => "distance_from_ema",
            RankerKind::SectorStrength => "sector_strength",
            RankerKind::Composite => "composite",
            RankerKind::Adaptive => "adaptive",
            RankerKind::Random => "random",
        }
    }

    /// Construct the ranker. `seed` only affects [`RandomRanker`].
    pub fn build(&self, seed: u64) -> Box<dyn StockRanker> {
        match self {
            RankerKind::Volatility => Box::new(VolatilityRanker),
            RankerKind::DistanceFromEma => Box::new(DistanceFromEmaRanker),
            RankerKind::SectorStrength => Box::new(SectorStrengthRanker),
            RankerKind::Composite => Box::new(CompositeRanker::default()),
            RankerKind::Adaptive => Box::new(AdaptiveRanker),
            RankerKind::Random => Box::new(RandomRanker { seed }),
        }
    }
}

impl fmt::Display for RankerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RankerKind {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        RankerKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| BacktestError::UnknownRanker(s.to_string()))
    }
}

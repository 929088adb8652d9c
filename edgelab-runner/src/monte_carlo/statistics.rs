//! Aggregate statistics across scenarios.
//!
//! Percentiles use linear interpolation between closest ranks on
//! `p/100 * (n-1)`. Standard deviation is the population form. Confidence
//! intervals are two-sided percentile intervals.

use edgelab_core::stats::{mean, percentile_sorted, sorted, std_dev};
use serde::{Deserialize, Serialize};

use super::scenario::MonteCarloScenario;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Percentiles {
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

impl Percentiles {
    pub fn from_sorted(sorted: &[f64]) -> Self {
        Self {
            p5: percentile_sorted(sorted, 5.0),
            p25: percentile_sorted(sorted, 25.0),
            p50: percentile_sorted(sorted, 50.0),
            p75: percentile_sorted(sorted, 75.0),
            p95: percentile_sorted(sorted, 95.0),
        }
    }

    pub fn is_monotonic(&self) -> bool {
        self.p5 <= self.p25 && self.p25 <= self.p50 && self.p50 <= self.p75 && self.p75 <= self.p95
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    /// Two-sided 95% interval: `[p2.5, p97.5]`.
    pub fn ninety_five(sorted: &[f64]) -> Self {
        Self {
            lower: percentile_sorted(sorted, 2.5),
            upper: percentile_sorted(sorted, 97.5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonteCarloStatistics {
    // ── Return ──
    pub mean_return_pct: f64,
    pub median_return_pct: f64,
    pub std_dev_return_pct: f64,
    pub return_percentiles: Percentiles,
    pub return_confidence_interval_95: ConfidenceInterval,

    // ── Drawdown ──
    pub mean_max_drawdown_pct: f64,
    pub median_max_drawdown_pct: f64,
    pub std_dev_max_drawdown_pct: f64,
    pub drawdown_percentiles: Percentiles,
    pub drawdown_confidence_interval_95: ConfidenceInterval,

    // ── Win rate / edge ──
    pub mean_win_rate: f64,
    pub median_win_rate: f64,
    pub std_dev_win_rate: f64,
    pub win_rate_percentiles: Percentiles,
    pub mean_edge: f64,
    pub median_edge: f64,
    pub std_dev_edge: f64,
    pub edge_percentiles: Percentiles,

    /// Percent of scenarios with a positive total return.
    pub probability_of_profit: f64,
    pub best_case_return_pct: f64,
    pub worst_case_return_pct: f64,
}

impl MonteCarloStatistics {
    pub fn from_scenarios(scenarios: &[MonteCarloScenario]) -> Self {
        if scenarios.is_empty() {
            return Self::default();
        }
        let collect = |f: fn(&MonteCarloScenario) -> f64| -> Vec<f64> {
            scenarios.iter().map(f).collect()
        };
        let returns = collect(|s| s.total_return_pct);
        let drawdowns = collect(|s| s.max_drawdown_pct);
        let win_rates = collect(|s| s.win_rate);
        let edges = collect(|s| s.edge);

        let returns_sorted = sorted(&returns);
        let drawdowns_sorted = sorted(&drawdowns);
        let win_rates_sorted = sorted(&win_rates);
        let edges_sorted = sorted(&edges);

        let return_percentiles = Percentiles::from_sorted(&returns_sorted);
        let drawdown_percentiles = Percentiles::from_sorted(&drawdowns_sorted);
        let win_rate_percentiles = Percentiles::from_sorted(&win_rates_sorted);
        let edge_percentiles = Percentiles::from_sorted(&edges_sorted);

        let profitable = returns.iter().filter(|&&r| r > 0.0).count();

        Self {
            mean_return_pct: mean(&returns),
            median_return_pct: return_percentiles.p50,
            std_dev_return_pct: std_dev(&returns),
            return_percentiles,
            return_confidence_interval_95: ConfidenceInterval::ninety_five(&returns_sorted),

            mean_max_drawdown_pct: mean(&drawdowns),
            median_max_drawdown_pct: drawdown_percentiles.p50,
            std_dev_max_drawdown_pct: std_dev(&drawdowns),
            drawdown_percentiles,
            drawdown_confidence_interval_95: ConfidenceInterval::ninety_five(&drawdowns_sorted),

            mean_win_rate: mean(&win_rates),
            median_win_rate: win_rate_percentiles.p50,
            std_dev_win_rate: std_dev(&win_rates),
            win_rate_percentiles,
            mean_edge: mean(&edges),
            median_edge: edge_percentiles.p50,
            std_dev_edge: std_dev(&edges),
            edge_percentiles,

            probability_of_profit: profitable as f64 / scenarios.len() as f64 * 100.0,
            best_case_return_pct: return_percentiles.p95,
            worst_case_return_pct: return_percentiles.p5,
        }
    }
}

// ─── Percentile equity curves ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileCurvePoint {
    pub trade_number: usize,
    pub cumulative_return_pct: f64,
}

/// Point-wise percentile bands: at each trade position, the percentile of
/// cumulative return across all scenarios.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PercentileEquityCurves {
    pub p5: Vec<PercentileCurvePoint>,
    pub p25: Vec<PercentileCurvePoint>,
    pub p50: Vec<PercentileCurvePoint>,
    pub p75: Vec<PercentileCurvePoint>,
    pub p95: Vec<PercentileCurvePoint>,
}

impl PercentileEquityCurves {
    pub fn from_scenarios(scenarios: &[MonteCarloScenario]) -> Self {
        let length = scenarios
            .iter()
            .map(|s| s.equity_curve.len())
            .min()
            .unwrap_or(0);
        let mut curves = Self::default();
        let mut column = Vec::with_capacity(scenarios.len());
        for k in 0..length {
            column.clear();
            column.extend(scenarios.iter().map(|s| s.equity_curve[k].cumulative_return_pct));
            column.sort_by(f64::total_cmp);
            let p = Percentiles::from_sorted(&column);
            let trade_number = k + 1;
            let point = |v: f64| PercentileCurvePoint {
                trade_number,
                cumulative_return_pct: v,
            };
            curves.p5.push(point(p.p5));
            curves.p25.push(point(p.p25));
            curves.p50.push(point(p.p50));
            curves.p75.push(point(p.p75));
            curves.p95.push(point(p.p95));
        }
        curves
    }
}

//! Built-in predicates over the precomputed quote fields, plus combinators.

use super::{EntryStrategy, ExitSignal, ExitStrategy};
use crate::domain::{Quote, Stock};

// ─── Entries ─────────────────────────────────────────────────────────

/// Enters while the quote is flagged as in an uptrend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uptrend;

impl EntryStrategy for Uptrend {
    fn test(&self, _stock: &Stock, quote: &Quote) -> bool {
        quote.in_uptrend
    }

    fn description(&self) -> String {
        "Stock is in uptrend".into()
    }
}

/// Enters on the precomputed buy signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuySignal;

impl EntryStrategy for BuySignal {
    fn test(&self, _stock: &Stock, quote: &Quote) -> bool {
        quote.buy_signal
    }

    fn description(&self) -> String {
        "Buy signal".into()
    }
}

/// Enters when the close reaches the upper Donchian band.
#[derive(Debug, Clone, Copy, Default)]
pub struct DonchianBreakout;

impl EntryStrategy for DonchianBreakout {
    fn test(&self, _stock: &Stock, quote: &Quote) -> bool {
        quote.donchian_upper > 0.0 && quote.close >= quote.donchian_upper
    }

    fn description(&self) -> String {
        "Close at or above upper Donchian band".into()
    }
}

/// Enters while the close is above the 20 EMA.
#[derive(Debug, Clone, Copy, Default)]
pub struct AboveEma20;

impl EntryStrategy for AboveEma20 {
    fn test(&self, _stock: &Stock, quote: &Quote) -> bool {
        quote.ema_20 > 0.0 && quote.close > quote.ema_20
    }

    fn description(&self) -> String {
        "Price above 20 EMA".into()
    }
}

/// Enters only when every inner entry holds.
pub struct AllOf(pub Vec<Box<dyn EntryStrategy>>);

impl EntryStrategy for AllOf {
    fn test(&self, stock: &Stock, quote: &Quote) -> bool {
        !self.0.is_empty() && self.0.iter().all(|e| e.test(stock, quote))
    }

    fn description(&self) -> String {
        self.0
            .iter()
            .map(|e| e.description())
            .collect::<Vec<_>>()
            .join(" and ")
    }
}

// ─── Exits ───────────────────────────────────────────────────────────

/// Exits on the precomputed sell signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct SellSignal;

impl ExitStrategy for SellSignal {
    fn evaluate(&self, _stock: &Stock, _entry: &Quote, quote: &Quote) -> Option<ExitSignal> {
        quote
            .sell_signal
            .then(|| ExitSignal::at_close("Sell signal", quote))
    }

    fn description(&self) -> String {
        "Sell signal".into()
    }
}

/// Exits when the close falls below the 20 EMA.
#[derive(Debug, Clone, Copy, Default)]
pub struct BelowEma20;

impl ExitStrategy for BelowEma20 {
    fn evaluate(&self, _stock: &Stock, _entry: &Quote, quote: &Quote) -> Option<ExitSignal> {
        (quote.ema_20 > 0.0 && quote.close < quote.ema_20)
            .then(|| ExitSignal::at_close("Price below 20 EMA", quote))
    }

    fn description(&self) -> String {
        "Price below 20 EMA".into()
    }
}

/// Exits when the close drops `atr_multiplier` entry ATRs below the entry close.
#[derive(Debug, Clone, Copy)]
pub struct StopLoss {
    pub atr_multiplier: f64,
}

impl Default for StopLoss {
    fn default() -> Self {
        Self { atr_multiplier: 2.0 }
    }
}

impl ExitStrategy for StopLoss {
    fn evaluate(&self, _stock: &Stock, entry: &Quote, quote: &Quote) -> Option<ExitSignal> {
        let stop = entry.close - self.atr_multiplier * entry.atr;
        (quote.close < stop).then(|| ExitSignal::at_close("Stop loss", quote))
    }

    fn description(&self) -> String {
        format!("Stop loss ({} ATR)", self.atr_multiplier)
    }
}

/// Exits when the close rises `atr_multiplier` entry ATRs above the entry close.
#[derive(Debug, Clone, Copy)]
pub struct ProfitTarget {
    pub atr_multiplier: f64,
}

impl Default for ProfitTarget {
    fn default() -> Self {
        Self { atr_multiplier: 3.0 }
    }
}

impl ExitStrategy for ProfitTarget {
    fn evaluate(&self, _stock: &Stock, entry: &Quote, quote: &Quote) -> Option<ExitSignal> {
        let target = entry.close + self.atr_multiplier * entry.atr;
        (quote.close >= target).then(|| ExitSignal::at_close("Profit target", quote))
    }

    fn description(&self) -> String {
        format!("Profit target ({} ATR)", self.atr_multiplier)
    }
}

/// Exits on the first inner exit that matches, in declaration order.
pub struct AnyOf(pub Vec<Box<dyn ExitStrategy>>);

impl ExitStrategy for AnyOf {
    fn evaluate(&self, stock: &Stock, entry: &Quote, quote: &Quote) -> Option<ExitSignal> {
        self.0.iter().find_map(|e| e.evaluate(stock, entry, quote))
    }

    fn description(&self) -> String {
        self.0
            .iter()
            .map(|e| e.description())
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

//! Strategy predicates: entry and exit contracts the engine drives.
//!
//! Predicates are side-effect-free: they see the strategy stock and quotes,
//! never portfolio or position state. The engine treats them as black boxes.

pub mod builtin;
pub mod registry;

use crate::domain::{Quote, Stock};
use serde::{Deserialize, Serialize};

pub use builtin::{
    AboveEma20, AllOf, AnyOf, BelowEma20, BuySignal, DonchianBreakout, ProfitTarget, SellSignal,
    StopLoss, Uptrend,
};
pub use registry::{RegistryError, StrategyKind, StrategyRegistry};

/// A matched exit: the reason text and the price the trade exits at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitSignal {
    pub reason: String,
    pub price: f64,
}

impl ExitSignal {
    /// Exit at the quote's close.
    pub fn at_close(reason: impl Into<String>, quote: &Quote) -> Self {
        Self {
            reason: reason.into(),
            price: quote.close,
        }
    }
}

/// Decides whether `quote` of `stock` is an entry.
pub trait EntryStrategy: Send + Sync {
    fn test(&self, stock: &Stock, quote: &Quote) -> bool;

    fn description(&self) -> String;
}

/// Decides whether a position opened at `entry_quote` exits on `quote`.
///
/// `quote` is always strictly after `entry_quote`.
pub trait ExitStrategy: Send + Sync {
    fn evaluate(&self, stock: &Stock, entry_quote: &Quote, quote: &Quote) -> Option<ExitSignal>;

    fn description(&self) -> String;
}

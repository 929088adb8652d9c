//! Explicit strategy registry: name to constructor, built once.
//!
//! A name may list several registered strategies separated by commas.
//! Entries combine with [`AllOf`], exits with [`AnyOf`] (first match wins).

use super::builtin::{
    AboveEma20, AllOf, AnyOf, BelowEma20, BuySignal, DonchianBreakout, ProfitTarget, SellSignal,
    StopLoss, Uptrend,
};
use super::{EntryStrategy, ExitStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

type EntryCtor = Box<dyn Fn() -> Box<dyn EntryStrategy> + Send + Sync>;
type ExitCtor = Box<dyn Fn() -> Box<dyn ExitStrategy> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Entry,
    Exit,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Entry => f.write_str("entry"),
            StrategyKind::Exit => f.write_str("exit"),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown {kind} strategy: '{name}'")]
    UnknownStrategy { kind: StrategyKind, name: String },
}

/// Name → constructor tables for entry and exit strategies.
pub struct StrategyRegistry {
    entries: BTreeMap<String, EntryCtor>,
    exits: BTreeMap<String, ExitCtor>,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl StrategyRegistry {
    /// Registry with no strategies.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
            exits: BTreeMap::new(),
        }
    }

    /// Registry pre-loaded with the built-in predicates.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register_entry("uptrend", || Box::new(Uptrend));
        registry.register_entry("buy_signal", || Box::new(BuySignal));
        registry.register_entry("donchian_breakout", || Box::new(DonchianBreakout));
        registry.register_entry("above_ema_20", || Box::new(AboveEma20));

        registry.register_exit("sell_signal", || Box::new(SellSignal));
        registry.register_exit("below_ema_20", || Box::new(BelowEma20));
        registry.register_exit("stop_loss", || Box::new(StopLoss::default()));
        registry.register_exit("profit_target", || Box::new(ProfitTarget::default()));
        registry
    }

    pub fn register_entry<F>(&mut self, name: impl Into<String>, ctor: F)
    where
        F: Fn() -> Box<dyn EntryStrategy> + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Box::new(ctor));
    }

    pub fn register_exit<F>(&mut self, name: impl Into<String>, ctor: F)
    where
        F: Fn() -> Box<dyn ExitStrategy> + Send + Sync + 'static,
    {
        self.exits.insert(name.into(), Box::new(ctor));
    }

    /// Resolve an entry name (or comma-separated list) into a predicate.
    pub fn entry(&self, names: &str) -> Result<Box<dyn EntryStrategy>, RegistryError> {
        let mut parts = split_names(names)
            .map(|name| {
                self.entries
                    .get(name)
                    .map(|ctor| ctor())
                    .ok_or_else(|| unknown(StrategyKind::Entry, name))
            })
            .collect::<Result<Vec<_>, _>>()?;
        match parts.len() {
            0 => Err(unknown(StrategyKind::Entry, names)),
            1 => Ok(parts.remove(0)),
            _ => Ok(Box::new(AllOf(parts))),
        }
    }

    /// Resolve an exit name (or comma-separated list) into a predicate.
    pub fn exit(&self, names: &str) -> Result<Box<dyn ExitStrategy>, RegistryError> {
        let mut parts = split_names(names)
            .map(|name| {
                self.exits
                    .get(name)
                    .map(|ctor| ctor())
                    .ok_or_else(|| unknown(StrategyKind::Exit, name))
            })
            .collect::<Result<Vec<_>, _>>()?;
        match parts.len() {
            0 => Err(unknown(StrategyKind::Exit, names)),
            1 => Ok(parts.remove(0)),
            _ => Ok(Box::new(AnyOf(parts))),
        }
    }

    /// Registered entry names with their descriptions, sorted by name.
    pub fn entry_descriptions(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(name, ctor)| (name.clone(), ctor().description()))
            .collect()
    }

    /// Registered exit names with their descriptions, sorted by name.
    pub fn exit_descriptions(&self) -> Vec<(String, String)> {
        self.exits
            .iter()
            .map(|(name, ctor)| (name.clone(), ctor().description()))
            .collect()
    }
}

fn split_names(names: &str) -> impl Iterator<Item = &str> {
    names.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn unknown(kind: StrategyKind, name: &str) -> RegistryError {
    RegistryError::UnknownStrategy {
        kind,
        name: name.to_string(),
    }
}

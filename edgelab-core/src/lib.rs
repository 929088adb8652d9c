//! EdgeLab Core: domain types, strategy contracts, rankers and the backtest engine.
//!
//! This crate contains the deterministic half of the system:
//! - Domain types (quotes, stocks, trades, backtest reports)
//! - Entry/exit predicate contracts and the explicit strategy registry
//! - Stock rankers for scarce position slots
//! - Date-ordered backtest engine with cooldown, entry delay and underlying mode
//! - BLAKE3-derived RNG hierarchy and shared statistics helpers

pub mod domain;
pub mod engine;
pub mod ranker;
pub mod rng;
pub mod stats;
pub mod strategy;

//! Forward exit scan: turns an opened entry into a completed trade.

use crate::domain::{ExitReason, Stock, Trade};
use crate::strategy::ExitStrategy;
use chrono::NaiveDate;

/// A trading stock with the stock whose signals drive it.
#[derive(Debug, Clone, Copy)]
pub struct StockPair<'a> {
    pub trading: &'a Stock,
    pub strategy: &'a Stock,
}

impl StockPair<'_> {
    pub fn uses_underlying(&self) -> bool {
        self.trading.symbol != self.strategy.symbol
    }
}

/// An entry resolved to quote positions in both stocks of a pair.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    pub pair: StockPair<'a>,
    pub strategy_index: usize,
    pub trading_index: usize,
}

impl Entry<'_> {
    pub fn date(&self) -> NaiveDate {
        self.pair.trading.quotes()[self.trading_index].date
    }
}

/// Scan the strategy stock forward from the entry (exclusive) until the exit
/// predicate fires, forcing a close on the last quote when it never does.
///
/// Returns `None` when there is no quote after the entry, or when the trading
/// stock has no quote on the exit date.
pub fn simulate_trade(entry: &Entry<'_>, exit: &dyn ExitStrategy) -> Option<Trade> {
    let pair = entry.pair;
    let strategy_quotes = pair.strategy.quotes();
    let strategy_entry = &strategy_quotes[entry.strategy_index];
    let after = &strategy_quotes[entry.strategy_index + 1..];

    let (exit_date, reason, signal_price) = after
        .iter()
        .find_map(|quote| {
            exit.evaluate(pair.strategy, strategy_entry, quote)
                .map(|signal| (quote.date, ExitReason::Signal(signal.reason), Some(signal.price)))
        })
        .or_else(|| after.last().map(|q| (q.date, ExitReason::EndOfData, None)))?;

    let trading_quotes = pair.trading.quotes();
    let trading_entry = &trading_quotes[entry.trading_index];
    let exit_index = pair.trading.index_of(exit_date)?;
    if exit_index <= entry.trading_index {
        return None;
    }
    let trading_exit = &trading_quotes[exit_index];

    // Underlying-mode signal prices belong to the other instrument.
    let exit_price = match signal_price {
        Some(price) if !pair.uses_underlying() => price,
        _ => trading_exit.close,
    };

    Some(Trade {
        symbol: pair.trading.symbol.clone(),
        underlying_symbol: pair
            .uses_underlying()
            .then(|| pair.strategy.symbol.clone()),
        sector: pair.trading.sector_name().to_string(),
        entry_quote: trading_entry.clone(),
        exit_reason: reason,
        quotes: trading_quotes[entry.trading_index + 1..=exit_index].to_vec(),
        profit: exit_price - trading_entry.close,
    })
}

//! Date-ordered backtest loop.

use super::exit_scan::{simulate_trade, Entry, StockPair};
use super::{BacktestError, BacktestOptions};
use crate::domain::{BacktestReport, Quote, Stock, Trade};
use crate::ranker::StockRanker;
use crate::strategy::{EntryStrategy, ExitStrategy};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// Run a backtest of `entry`/`exit` over `stocks`.
///
/// Every stock is traded except, in underlying mode, the underlyings that
/// only feed another symbol's signals. Those must be part of `stocks` but
/// never open positions. An empty universe or a range without quotes yields
/// an empty report.
pub fn run_backtest(
    entry: &dyn EntryStrategy,
    exit: &dyn ExitStrategy,
    stocks: &[Stock],
    options: &BacktestOptions,
    ranker: &dyn StockRanker,
) -> Result<BacktestReport, BacktestError> {
    options.validate(stocks)?;

    let pairs = build_pairs(stocks, options);
    let dates = trading_dates(&pairs, options);
    info!(
        symbols = pairs.len(),
        dates = dates.len(),
        max_positions = ?options.max_positions,
        cooldown_days = options.cooldown_days,
        entry_delay_days = options.entry_delay_days,
        entry = %entry.description(),
        exit = %exit.description(),
        ranker = %ranker.description(),
        "Starting backtest"
    );

    let candidates = collect_candidates(entry, &pairs, &dates);
    let mut replay = Replay::default();

    for (day, &date) in dates.iter().enumerate() {
        replay.release(day, date, &dates);

        let signals = &candidates[day];
        if signals.is_empty() {
            continue;
        }

        let eligible: Vec<Entry<'_>> = signals
            .iter()
            .filter(|e| replay.can_enter(&e.pair.trading.symbol, day, options.cooldown_days))
            .copied()
            .collect();
        let eligible = apply_entry_delay(eligible, day, options.entry_delay_days, &dates);
        if eligible.is_empty() {
            continue;
        }

        let keys: Vec<(&Stock, &Quote)> = eligible
            .iter()
            .map(|e| (e.pair.strategy, &e.pair.strategy.quotes()[e.strategy_index]))
            .collect();
        let order = ranker.rank(&keys);

        let mut free = options
            .max_positions
            .map_or(usize::MAX, |max| max.saturating_sub(replay.open.len()));
        let mut selected = 0;
        let mut rejected = Vec::new();
        // Entries that cannot complete a trade do not take a slot.
        for &i in &order {
            if free == 0 {
                rejected.push(i);
            } else if let Some(trade) = simulate_trade(&eligible[i], exit) {
                replay.open_position(trade);
                free -= 1;
                selected += 1;
            }
        }

        debug!(
            %date,
            signals = signals.len(),
            eligible = eligible.len(),
            selected,
            missed = rejected.len(),
            open = replay.open.len(),
            "Processing entries"
        );

        for i in rejected {
            replay.record_missed(&eligible[i], exit);
        }
    }

    info!(
        trades = replay.trades.len(),
        missed = replay.missed.len(),
        "Backtest complete"
    );
    Ok(BacktestReport::from_trades(replay.trades, replay.missed))
}

// ─── Setup ───────────────────────────────────────────────────────────

fn build_pairs<'a>(stocks: &'a [Stock], options: &BacktestOptions) -> Vec<StockPair<'a>> {
    let mut by_symbol: HashMap<&str, &Stock> = HashMap::new();
    for stock in stocks {
        if by_symbol.contains_key(stock.symbol.as_str()) {
            warn!(symbol = %stock.symbol, "Duplicate stock in universe, keeping first");
            continue;
        }
        by_symbol.insert(stock.symbol.as_str(), stock);
    }

    let mut seen = BTreeSet::new();
    stocks
        .iter()
        .filter(|s| seen.insert(s.symbol.as_str()))
        .filter(|s| !options.is_signal_only(&s.symbol))
        .filter_map(|trading| {
            let strategy_symbol = options.strategy_symbol(&trading.symbol);
            by_symbol
                .get(strategy_symbol)
                .map(|&strategy| StockPair { trading, strategy })
        })
        .collect()
}

/// Distinct trading-stock dates within the range, ascending.
fn trading_dates(pairs: &[StockPair<'_>], options: &BacktestOptions) -> Vec<NaiveDate> {
    pairs
        .iter()
        .flat_map(|p| p.trading.quotes_between(options.start_date, options.end_date))
        .map(|q| q.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Entry signals grouped by trading-date index, in pair order.
fn collect_candidates<'a>(
    entry: &dyn EntryStrategy,
    pairs: &[StockPair<'a>],
    dates: &[NaiveDate],
) -> Vec<Vec<Entry<'a>>> {
    dates
        .iter()
        .map(|&date| {
            pairs
                .iter()
                .filter_map(|&pair| {
                    let strategy_index = pair.strategy.index_of(date)?;
                    let trading_index = pair.trading.index_of(date)?;
                    let quote = &pair.strategy.quotes()[strategy_index];
                    entry.test(pair.strategy, quote).then_some(Entry {
                        pair,
                        strategy_index,
                        trading_index,
                    })
                })
                .collect()
        })
        .collect()
}

/// Re-map entries to the quotes `delay` trading dates later. Entries without
/// quotes on that date are dropped.
fn apply_entry_delay<'a>(
    entries: Vec<Entry<'a>>,
    day: usize,
    delay: usize,
    dates: &[NaiveDate],
) -> Vec<Entry<'a>> {
    if delay == 0 {
        return entries;
    }
    let Some(&target) = dates.get(day + delay) else {
        return Vec::new();
    };
    entries
        .into_iter()
        .filter_map(|e| {
            Some(Entry {
                pair: e.pair,
                strategy_index: e.pair.strategy.index_of(target)?,
                trading_index: e.pair.trading.index_of(target)?,
            })
        })
        .collect()
}

// ─── Replay state ────────────────────────────────────────────────────

struct OpenPosition {
    symbol: String,
    exit_date: NaiveDate,
}

#[derive(Default)]
struct Replay {
    open: Vec<OpenPosition>,
    /// Trading-date index of each symbol's most recent exit.
    last_exit: HashMap<String, usize>,
    /// Exit date of each symbol's most recent missed trade.
    last_missed_exit: HashMap<String, NaiveDate>,
    trades: Vec<Trade>,
    missed: Vec<Trade>,
}

impl Replay {
    fn release(&mut self, day: usize, date: NaiveDate, dates: &[NaiveDate]) {
        let last_exit = &mut self.last_exit;
        self.open.retain(|position| {
            if position.exit_date > date {
                return true;
            }
            let exit_day = dates.partition_point(|d| *d < position.exit_date).min(day);
            last_exit.insert(position.symbol.clone(), exit_day);
            false
        });
    }

    fn can_enter(&self, symbol: &str, day: usize, cooldown_days: usize) -> bool {
        if self.open.iter().any(|p| p.symbol == symbol) {
            return false;
        }
        match self.last_exit.get(symbol) {
            Some(&exit_day) => day - exit_day > cooldown_days,
            None => true,
        }
    }

    fn open_position(&mut self, trade: Trade) {
        self.open.push(OpenPosition {
            symbol: trade.symbol.clone(),
            exit_date: trade.exit_date(),
        });
        self.trades.push(trade);
    }

    fn record_missed(&mut self, entry: &Entry<'_>, exit: &dyn ExitStrategy) {
        let symbol = &entry.pair.trading.symbol;
        let overlaps = self
            .last_missed_exit
            .get(symbol)
            .is_some_and(|&last| entry.date() <= last);
        if overlaps {
            return;
        }
        if let Some(trade) = simulate_trade(entry, exit) {
            self.last_missed_exit.insert(symbol.clone(), trade.exit_date());
            self.missed.push(trade);
        }
    }
}

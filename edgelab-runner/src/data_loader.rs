//! Quote loading for the runner.
//!
//! Reads fully-enriched quotes (indicators and signals already computed) from
//! a CSV or JSON file, attaches sectors from an optional universe TOML, and
//! groups everything into date-sorted [`Stock`]s.
//!
//! The sector file uses the universe layout, sectors mapping to tickers:
//!
//! ```toml
//! [sectors]
//! Technology = ["AAPL", "MSFT"]
//! Energy = ["XOM"]
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use edgelab_core::domain::{Quote, Stock};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::DataConfig;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bad CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("bad JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("bad sector TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unsupported quote file format: {0} (expected .csv or .json)")]
    UnsupportedFormat(PathBuf),

    #[error("no quotes found in {0}")]
    Empty(PathBuf),
}

/// Load the configured universe.
pub fn load_universe(config: &DataConfig) -> Result<Vec<Stock>, LoadError> {
    let quotes = load_quotes(&config.quotes)?;
    if quotes.is_empty() {
        return Err(LoadError::Empty(config.quotes.clone()));
    }
    let sectors = match &config.sectors {
        Some(path) => load_sectors(path)?,
        None => HashMap::new(),
    };
    let quote_count = quotes.len();
    let stocks = group_into_stocks(quotes, &sectors);
    info!(
        symbols = stocks.len(),
        quotes = quote_count,
        with_sector = stocks.iter().filter(|s| s.sector.is_some()).count(),
        "Loaded universe"
    );
    Ok(stocks)
}

/// Read quotes from `path`, choosing the format by extension.
pub fn load_quotes(path: &Path) -> Result<Vec<Quote>, LoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("csv") => read_csv(path),
        Some("json") => read_json(path),
        _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_csv(path: &Path) -> Result<Vec<Quote>, LoadError> {
    let mut reader = csv::Reader::from_reader(BufReader::new(open(path)?));
    reader
        .deserialize()
        .collect::<Result<Vec<Quote>, _>>()
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

fn read_json(path: &Path) -> Result<Vec<Quote>, LoadError> {
    serde_json::from_reader(BufReader::new(open(path)?)).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Deserialize)]
struct SectorFile {
    sectors: BTreeMap<String, Vec<String>>,
}

/// Symbol → sector from a universe TOML. A symbol listed twice keeps its
/// first sector (sector names in alphabetical order).
pub fn load_sectors(path: &Path) -> Result<HashMap<String, String>, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_sectors(&content).map_err(|source| LoadError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_sectors(content: &str) -> Result<HashMap<String, String>, toml::de::Error> {
    let file: SectorFile = toml::from_str(content)?;
    let mut by_symbol = HashMap::new();
    for (sector, tickers) in file.sectors {
        for ticker in tickers {
            by_symbol.entry(ticker).or_insert_with(|| sector.clone());
        }
    }
    Ok(by_symbol)
}

/// Group quotes by symbol into stocks, sorted by symbol.
pub fn group_into_stocks(quotes: Vec<Quote>, sectors: &HashMap<String, String>) -> Vec<Stock> {
    let mut by_symbol: BTreeMap<String, Vec<Quote>> = BTreeMap::new();
    for quote in quotes {
        by_symbol.entry(quote.symbol.clone()).or_default().push(quote);
    }
    by_symbol
        .into_iter()
        .map(|(symbol, quotes)| {
            let raw = quotes.len();
            let stock = Stock::new(symbol.clone(), sectors.get(&symbol).cloned(), quotes);
            if stock.quotes().len() < raw {
                warn!(
                    symbol = %symbol,
                    dropped = raw - stock.quotes().len(),
                    "Dropped duplicate quote dates"
                );
            }
            stock
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    const CSV: &str = "\
symbol,date,close,atr,in_uptrend,buy_signal,sell_signal,market_breadth
AAPL,2024-01-03,101.5,2.0,true,true,false,55.0
AAPL,2024-01-02,100.0,2.0,true,false,false,
MSFT,2024-01-02,300.0,5.0,false,false,true,
AAPL,2024-01-02,999.0,2.0,false,false,false,
";

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_with_sparse_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "quotes.csv", CSV);
        let quotes = load_quotes(&path).unwrap();
        assert_eq!(quotes.len(), 4);
        assert!(quotes[0].buy_signal);
        assert_eq!(quotes[0].market_breadth, Some(55.0));
        assert_eq!(quotes[1].market_breadth, None);
        assert_eq!(quotes[0].ema_20, 0.0);
    }

    #[test]
    fn grouping_sorts_dedups_and_attaches_sectors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "quotes.csv", CSV);
        let sectors = parse_sectors("[sectors]\nTechnology = [\"AAPL\"]\n").unwrap();
        let stocks = group_into_stocks(load_quotes(&path).unwrap(), &sectors);

        assert_eq!(stocks.len(), 2);
        assert_eq!(stocks[0].symbol, "AAPL");
        assert_eq!(stocks[0].sector.as_deref(), Some("Technology"));
        assert_eq!(stocks[1].sector, None);

        let aapl = stocks[0].quotes();
        assert_eq!(aapl.len(), 2);
        assert_eq!(aapl[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        // First occurrence of a duplicate date wins.
        assert_eq!(aapl[0].close, 100.0);
    }

    #[test]
    fn json_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let json = r#"[{"symbol":"SPY","date":"2024-01-02","close":470.0,"atr":4.0}]"#;
        let path = write(dir.path(), "quotes.json", json);
        let quotes = load_quotes(&path).unwrap();
        assert_eq!(quotes[0].symbol, "SPY");
        assert_eq!(quotes[0].atr, 4.0);
    }

    #[test]
    fn load_universe_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let quotes = write(dir.path(), "quotes.csv", CSV);
        let sectors = write(
            dir.path(),
            "sectors.toml",
            "[sectors]\nTechnology = [\"AAPL\", \"MSFT\"]\n",
        );
        let stocks = load_universe(&DataConfig {
            quotes,
            sectors: Some(sectors),
        })
        .unwrap();
        assert!(stocks.iter().all(|s| s.sector_name() == "Technology"));
    }

    #[test]
    fn first_sector_wins_for_duplicates() {
        let map = parse_sectors("[sectors]\nEnergy = [\"X\"]\nTechnology = [\"X\"]\n").unwrap();
        assert_eq!(map["X"], "Energy");
    }

    #[test]
    fn error_cases() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_quotes(&dir.path().join("quotes.parquet")),
            Err(LoadError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            load_quotes(&dir.path().join("missing.csv")),
            Err(LoadError::Io { .. })
        ));
        let bad = write(dir.path(), "bad.csv", "symbol,date,close\nA,not-a-date,1.0\n");
        assert!(matches!(load_quotes(&bad), Err(LoadError::Csv { .. })));
        let empty = write(dir.path(), "empty.csv", "symbol,date,close\n");
        assert!(matches!(
            load_universe(&DataConfig {
                quotes: empty,
                sectors: None
            }),
            Err(LoadError::Empty(_))
        ));
    }
}

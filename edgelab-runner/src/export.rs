//! Export: JSON and CSV artifacts for a pipeline run.
//!
//! - **JSON**: full round-trip serialization of [`RunOutput`] with schema versioning
//! - **CSV**: trade ledger and sized equity curve for external analysis tools
//!
//! Persisted JSON carries a `schema_version`. Newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use edgelab_core::domain::Trade;
use tracing::info;

use crate::monte_carlo::MonteCarloResult;
use crate::runner::{RunOutput, SCHEMA_VERSION};
use crate::sizing::PortfolioEquityPoint;

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `RunOutput` to pretty JSON.
pub fn export_json(output: &RunOutput) -> Result<String> {
    serde_json::to_string_pretty(output).context("failed to serialize RunOutput to JSON")
}

/// Deserialize a `RunOutput` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunOutput> {
    let output: RunOutput =
        serde_json::from_str(json).context("failed to deserialize RunOutput from JSON")?;
    if output.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            output.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(output)
}

pub fn export_monte_carlo_json(result: &MonteCarloResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize MonteCarloResult to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export a trade ledger as CSV.
///
/// Columns: symbol, underlying_symbol, sector, entry_date, entry_price,
/// exit_date, exit_price, exit_reason, profit, profit_pct, trading_days
pub fn export_trades_csv(trades: &[&Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "symbol",
        "underlying_symbol",
        "sector",
        "entry_date",
        "entry_price",
        "exit_date",
        "exit_price",
        "exit_reason",
        "profit",
        "profit_pct",
        "trading_days",
    ])?;

    for t in trades {
        wtr.write_record([
            t.symbol.clone(),
            t.underlying_symbol.clone().unwrap_or_default(),
            t.sector.clone(),
            t.entry_date().to_string(),
            format!("{:.6}", t.entry_price()),
            t.exit_date().to_string(),
            format!("{:.6}", t.exit_price()),
            t.exit_reason.to_string(),
            format!("{:.6}", t.profit),
            format!("{:.4}", t.profit_percentage()),
            t.trading_days().to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export a sized equity curve as CSV with date and portfolio_value columns.
pub fn export_equity_csv(equity_curve: &[PortfolioEquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "portfolio_value"])?;
    for point in equity_curve {
        wtr.write_record([
            point.date.to_string(),
            format!("{:.2}", point.portfolio_value),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for a run into `output_dir` (created if missing):
/// - `report.json`: the full `RunOutput`
/// - `trades.csv`: the trade ledger in entry order
/// - `equity.csv`: the sized equity curve, when sizing ran
/// - `monte_carlo.json`: the Monte Carlo result, when it ran
///
/// Returns the paths written.
pub fn save_artifacts(output: &RunOutput, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create artifact dir: {}", output_dir.display()))?;

    let mut written = Vec::new();
    let mut write = |name: &str, content: String| -> Result<()> {
        let path = output_dir.join(name);
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
        Ok(())
    };

    write("report.json", export_json(output)?)?;
    write("trades.csv", export_trades_csv(&output.report.trades())?)?;
    if let Some(sizing) = &output.position_sizing {
        write("equity.csv", export_equity_csv(&sizing.equity_curve)?)?;
    }
    if let Some(mc) = &output.monte_carlo {
        write("monte_carlo.json", export_monte_carlo_json(mc)?)?;
    }

    info!(dir = %output_dir.display(), files = written.len(), "Saved artifacts");
    Ok(written)
}

/// Load a `RunOutput` from an artifact directory's `report.json`.
pub fn load_artifacts(dir: &Path) -> Result<RunOutput> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

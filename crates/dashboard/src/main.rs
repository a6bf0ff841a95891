//! dashboard: single-stock fundamental analysis from the command line.
//!
//! Usage:
//!   cargo run -p dashboard -- MSFT
//!   cargo run -p dashboard -- MSFT --format json
//!   cargo run -p dashboard -- MSFT --save-snapshot msft.json
//!   cargo run -p dashboard -- --snapshot msft.json

use analysis_core::{AnalysisError, MarketSnapshot};
use analysis_orchestrator::{AnalysisOrchestrator, OrchestratorConfig};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use yahoo_client::YahooFinanceClient;

mod render;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Parser, Debug)]
#[command(
    name = "dashboard",
    about = "Score a single stock on quality, health, valuation and dividends",
    version
)]
struct Cli {
    /// Ticker symbol to analyze
    #[arg(required_unless_present = "snapshot")]
    ticker: Option<String>,
    /// Analyze a previously saved snapshot instead of fetching live data
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the fetched provider data to this file
    #[arg(long)]
    save_snapshot: Option<PathBuf>,
}

fn init_tracing() {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "dashboard=info,analysis_orchestrator=info,fundamental_analysis=info,yahoo_client=warn".into()
        })
    };
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    // Logs go to stderr so JSON reports on stdout stay parseable
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_snapshot(path: &Path) -> Result<MarketSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid snapshot file {}", path.display()))
}

fn save_snapshot(path: &Path, snapshot: &MarketSnapshot) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write snapshot {}", path.display()))?;
    tracing::info!("Saved snapshot for {} to {}", snapshot.symbol, path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = OrchestratorConfig::from_env().context("Invalid configuration")?;
    tracing::debug!("Configuration: {:?}", config);

    let provider = YahooFinanceClient::new(config.yahoo_base_url.clone(), config.yahoo_rate_limit);
    let orchestrator = AnalysisOrchestrator::new(provider, config);

    let snapshot = match (&cli.snapshot, &cli.ticker) {
        (Some(path), _) => load_snapshot(path)?,
        (None, Some(ticker)) => match orchestrator.snapshot(ticker).await {
            Ok(snapshot) => snapshot,
            Err(AnalysisError::TickerNotFound(symbol)) => {
                anyhow::bail!("Ticker {} was not found by the data provider", symbol)
            }
            Err(e) => return Err(e).context("Failed to fetch market data"),
        },
        (None, None) => anyhow::bail!("A ticker or --snapshot is required"),
    };

    if let Some(path) = &cli.save_snapshot {
        save_snapshot(path, &snapshot)?;
    }

    let report = orchestrator.analyze_snapshot(&snapshot)?;

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", render::render_text(&report)),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_requires_ticker_or_snapshot() {
        assert!(Cli::try_parse_from(["dashboard"]).is_err());

        let cli = Cli::try_parse_from(["dashboard", "MSFT", "--format", "json"]).unwrap();
        assert_eq!(cli.ticker.as_deref(), Some("MSFT"));
        assert_eq!(cli.format, OutputFormat::Json);

        let cli = Cli::try_parse_from(["dashboard", "--snapshot", "msft.json"]).unwrap();
        assert_eq!(cli.ticker, None);
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn snapshot_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("dashboard-snapshot-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("abc.json");

        let snapshot = MarketSnapshot::new(analysis_core::CompanyProfile {
            symbol: "ABC".to_string(),
            sector: Some("Energy".to_string()),
            ..Default::default()
        });
        save_snapshot(&path, &snapshot).unwrap();
        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded.symbol, "ABC");
        assert_eq!(loaded.profile.sector.as_deref(), Some("Energy"));

        assert!(load_snapshot(&dir.join("missing.json")).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}

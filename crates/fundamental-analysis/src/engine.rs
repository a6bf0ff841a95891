use analysis_core::{AnalysisError, MarketSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::benchmarks::SectorContext;
use crate::derivation::CompanyFundamentals;
use crate::history::HistoricalSeries;
use crate::narrative::Narrative;
use crate::red_flags::{self, RedFlag};
use crate::scoring::ScoreCard;

/// Everything the presentation layer needs for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockReport {
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    pub fundamentals: CompanyFundamentals,
    pub history: HistoricalSeries,
    pub scorecard: ScoreCard,
    pub red_flags: Vec<RedFlag>,
    pub narrative: Narrative,
}

/// Runs derivation, scoring, red flags and narrative over a snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct FundamentalAnalysisEngine;

impl FundamentalAnalysisEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, snapshot: &MarketSnapshot) -> Result<StockReport, AnalysisError> {
        let symbol = snapshot.symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(AnalysisError::InvalidData("empty ticker symbol".to_string()));
        }

        let ctx = SectorContext::resolve(snapshot.profile.sector.as_deref());
        tracing::info!(
            "Analyzing {} (sector: {}, benchmark: {})",
            symbol,
            snapshot.profile.sector.as_deref().unwrap_or("unknown"),
            ctx.benchmark.name
        );

        let mut statements = snapshot.statements.clone();
        statements.sort_by_key(|s| s.fiscal_year);

        let last_close = snapshot.history.prices.last().map(|p| p.close);
        let mut fundamentals = CompanyFundamentals::derive(&snapshot.profile, &statements, last_close);
        if fundamentals.symbol.is_empty() {
            fundamentals.symbol = symbol.clone();
        }

        let history = match HistoricalSeries::derive(snapshot, fundamentals.current_price) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!("Historical derivation failed for {}: {}; continuing without history", symbol, e);
                HistoricalSeries::unavailable()
            }
        };
        if history.available && history.prices.is_empty() {
            tracing::debug!("No price history for {}", symbol);
        }

        let scorecard = ScoreCard::compute(&fundamentals, &history, &ctx);
        let red_flags = red_flags::analyze(&fundamentals, &history, &ctx);
        let narrative = Narrative::generate(&fundamentals, &history, &scorecard, &red_flags);

        tracing::debug!(
            "{}: quality {:.2}, health {:.2}, valuation {:.2}, dividends {:.2}, geo penalty {:.1}",
            symbol,
            scorecard.quality.value,
            scorecard.health.value,
            scorecard.valuation.value,
            scorecard.dividends.value,
            scorecard.geopolitical.penalty
        );
        tracing::info!(
            "{} composite {:.2} ({}), {} red flag(s)",
            symbol,
            scorecard.composite,
            scorecard.verdict.label(),
            red_flags.len()
        );

        Ok(StockReport {
            symbol,
            generated_at: Utc::now(),
            fundamentals,
            history,
            scorecard,
            red_flags,
            narrative,
        })
    }
}

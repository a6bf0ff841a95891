use async_trait::async_trait;

use crate::{AnalysisError, AnnualStatement, CompanyProfile, PriceHistory};

/// Source of raw market data for a single ticker.
///
/// Implementations return `AnalysisError::TickerNotFound` when the symbol
/// cannot be resolved at all. Any other field-level gaps are expressed as
/// `None`s inside the returned data.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Profile, quote and summary ratios.
    async fn fetch_profile(&self, symbol: &str) -> Result<CompanyProfile, AnalysisError>;

    /// Annual statements, ascending by fiscal year.
    async fn fetch_statements(&self, symbol: &str) -> Result<Vec<AnnualStatement>, AnalysisError>;

    /// Max-range daily closes and dividend events.
    async fn fetch_price_history(&self, symbol: &str) -> Result<PriceHistory, AnalysisError>;
}

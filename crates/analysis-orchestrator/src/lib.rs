use analysis_core::{
    AnalysisError, AnnualStatement, CompanyProfile, MarketDataProvider, MarketSnapshot, PriceHistory,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use fundamental_analysis::{FundamentalAnalysisEngine, StockReport};
use std::future::Future;

pub mod config;
pub use config::OrchestratorConfig;

/// Internal cache entry with timestamp
struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
}

fn cache_get<T: Clone>(cache: &DashMap<String, CacheEntry<T>>, key: &str, ttl_secs: i64) -> Option<T> {
    let entry = cache.get(key)?;
    let age = (Utc::now() - entry.cached_at).num_seconds();
    (age < ttl_secs).then(|| entry.data.clone())
}

fn cache_put<T>(cache: &DashMap<String, CacheEntry<T>>, key: String, data: T) {
    cache.insert(key, CacheEntry { data, cached_at: Utc::now() });
}

/// Fetches provider data with time bounds and TTL caches, then runs the engine.
pub struct AnalysisOrchestrator<P: MarketDataProvider> {
    provider: P,
    engine: FundamentalAnalysisEngine,
    config: OrchestratorConfig,
    /// Profile / quote per symbol (quote TTL)
    profile_cache: DashMap<String, CacheEntry<CompanyProfile>>,
    /// Annual statements per symbol (history TTL)
    statements_cache: DashMap<String, CacheEntry<Vec<AnnualStatement>>>,
    /// Price history per symbol (history TTL)
    history_cache: DashMap<String, CacheEntry<PriceHistory>>,
}

impl<P: MarketDataProvider> AnalysisOrchestrator<P> {
    pub fn new(provider: P, config: OrchestratorConfig) -> Self {
        Self {
            provider,
            engine: FundamentalAnalysisEngine::new(),
            config,
            profile_cache: DashMap::new(),
            statements_cache: DashMap::new(),
            history_cache: DashMap::new(),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    fn normalize(symbol: &str) -> Result<String, AnalysisError> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(AnalysisError::InvalidData("empty ticker symbol".to_string()));
        }
        Ok(symbol)
    }

    async fn bounded<T>(
        &self,
        what: &str,
        symbol: &str,
        fut: impl Future<Output = Result<T, AnalysisError>>,
    ) -> Result<T, AnalysisError> {
        match tokio::time::timeout(self.config.fetch_timeout(), fut).await {
            Ok(result) => result,
            Err(_) => Err(AnalysisError::Timeout(format!(
                "{} for {} exceeded {}s",
                what, symbol, self.config.fetch_timeout_secs
            ))),
        }
    }

    /// Get the company profile (cached, quote TTL)
    pub async fn get_profile(&self, symbol: &str) -> Result<CompanyProfile, AnalysisError> {
        if let Some(profile) = cache_get(&self.profile_cache, symbol, self.config.quote_cache_ttl_secs) {
            tracing::debug!("Profile cache hit for {}", symbol);
            return Ok(profile);
        }

        let mut profile = self
            .bounded("profile fetch", symbol, self.provider.fetch_profile(symbol))
            .await?;
        if profile.symbol.trim().is_empty() {
            profile.symbol = symbol.to_string();
        }

        cache_put(&self.profile_cache, symbol.to_string(), profile.clone());
        Ok(profile)
    }

    /// Get annual statements (cached, history TTL)
    pub async fn get_statements(&self, symbol: &str) -> Result<Vec<AnnualStatement>, AnalysisError> {
        if let Some(statements) = cache_get(&self.statements_cache, symbol, self.config.history_cache_ttl_secs) {
            tracing::debug!("Statements cache hit for {}", symbol);
            return Ok(statements);
        }

        let statements = self
            .bounded("statements fetch", symbol, self.provider.fetch_statements(symbol))
            .await?;

        cache_put(&self.statements_cache, symbol.to_string(), statements.clone());
        Ok(statements)
    }

    /// Get max-range price history (cached, history TTL)
    pub async fn get_price_history(&self, symbol: &str) -> Result<PriceHistory, AnalysisError> {
        if let Some(history) = cache_get(&self.history_cache, symbol, self.config.history_cache_ttl_secs) {
            tracing::debug!("Price history cache hit for {}", symbol);
            return Ok(history);
        }

        let history = self
            .bounded("price history fetch", symbol, self.provider.fetch_price_history(symbol))
            .await?;

        cache_put(&self.history_cache, symbol.to_string(), history.clone());
        Ok(history)
    }

    /// Assemble a snapshot. The profile is required; statements and price
    /// history fall back to empty data when their fetch fails.
    pub async fn snapshot(&self, symbol: &str) -> Result<MarketSnapshot, AnalysisError> {
        let symbol = Self::normalize(symbol)?;
        let profile = self.get_profile(&symbol).await?;

        let (statements, history) = tokio::join!(self.get_statements(&symbol), self.get_price_history(&symbol));

        let statements = statements.unwrap_or_else(|e| {
            tracing::warn!("Statements unavailable for {}: {}; scoring without them", symbol, e);
            Vec::new()
        });
        let history = history.unwrap_or_else(|e| {
            tracing::warn!("Price history unavailable for {}: {}; scoring without it", symbol, e);
            PriceHistory::default()
        });

        Ok(MarketSnapshot::new(profile)
            .with_statements(statements)
            .with_history(history))
    }

    /// Fetch and analyze one ticker.
    pub async fn analyze(&self, symbol: &str) -> Result<StockReport, AnalysisError> {
        tracing::info!("Starting fundamental analysis for {}", symbol.trim());
        let snapshot = self.snapshot(symbol).await?;
        self.engine.analyze(&snapshot)
    }

    /// Analyze a snapshot captured earlier, without touching the provider.
    pub fn analyze_snapshot(&self, snapshot: &MarketSnapshot) -> Result<StockReport, AnalysisError> {
        self.engine.analyze(snapshot)
    }

    pub fn clear_cache(&self) {
        self.profile_cache.clear();
        self.statements_cache.clear();
        self.history_cache.clear();
    }
}

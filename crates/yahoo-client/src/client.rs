use analysis_core::{AnalysisError, AnnualStatement, CompanyProfile, MarketDataProvider, PriceHistory};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::parse;

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const MAX_ATTEMPTS: u32 = 3;
const RETRY_WAIT_SECS: u64 = 5;
/// Statement look-back requested from the timeseries endpoint.
const STATEMENT_YEARS: i64 = 12;

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
pub(crate) struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub(crate) fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    pub(crate) async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            // Wait until the oldest request leaves the window
            let Some(&oldest) = ts.front() else {
                continue;
            };
            let sleep_dur = (oldest + self.window).duration_since(now) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for Yahoo slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }

    #[cfg(test)]
    async fn in_flight(&self) -> usize {
        self.timestamps.lock().await.len()
    }
}

/// Yahoo Finance implementation of `MarketDataProvider`.
#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl YahooFinanceClient {
    pub fn new(base_url: impl Into<String>, requests_per_minute: usize) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            rate_limiter: RateLimiter::new(requests_per_minute, Duration::from_secs(60)),
        }
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, AnalysisError> {
        let request = builder.build().map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        for attempt in 1..=MAX_ATTEMPTS {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| AnalysisError::ApiError("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            tracing::warn!(
                "Yahoo 429 rate limited, waiting {}s before retry {}/{}",
                RETRY_WAIT_SECS,
                attempt,
                MAX_ATTEMPTS
            );
            tokio::time::sleep(Duration::from_secs(RETRY_WAIT_SECS)).await;
        }

        Err(AnalysisError::ApiError(format!(
            "Rate limited by Yahoo after {} attempts",
            MAX_ATTEMPTS
        )))
    }

    /// GET `path` and decode the JSON body. A 404 still carries a JSON error
    /// block, which the parsers turn into `TickerNotFound`.
    async fn get_json(&self, symbol: &str, path: &str, query: &[(&str, String)]) -> Result<Value, AnalysisError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.send_request(self.client.get(&url).query(query)).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return match response.json::<Value>().await {
                Ok(json) => Ok(json),
                Err(_) => Err(AnalysisError::TickerNotFound(symbol.to_string())),
            };
        }
        if !status.is_success() {
            return Err(AnalysisError::ApiError(format!(
                "HTTP {}: {}",
                status,
                response.text().await.unwrap_or_default()
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AnalysisError::InvalidData(format!("Failed to decode Yahoo response: {}", e)))
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    async fn fetch_profile(&self, symbol: &str) -> Result<CompanyProfile, AnalysisError> {
        let path = format!("/v10/finance/quoteSummary/{}", symbol);
        let json = self
            .get_json(symbol, &path, &[("modules", parse::PROFILE_MODULES.join(","))])
            .await?;
        parse::parse_quote_summary(symbol, &json)
    }

    async fn fetch_statements(&self, symbol: &str) -> Result<Vec<AnnualStatement>, AnalysisError> {
        let now = Utc::now().timestamp();
        let start = now - STATEMENT_YEARS * 365 * 24 * 3600;
        let path = format!("/ws/fundamentals-timeseries/v1/finance/timeseries/{}", symbol);
        let json = self
            .get_json(
                symbol,
                &path,
                &[
                    ("type", parse::TIMESERIES_TYPES.join(",")),
                    ("period1", start.to_string()),
                    ("period2", now.to_string()),
                ],
            )
            .await?;
        let statements = parse::parse_timeseries(&json)?;
        tracing::debug!("Fetched {} annual statements for {}", statements.len(), symbol);
        Ok(statements)
    }

    async fn fetch_price_history(&self, symbol: &str) -> Result<PriceHistory, AnalysisError> {
        let path = format!("/v8/finance/chart/{}", symbol);
        let json = self
            .get_json(
                symbol,
                &path,
                &[
                    ("range", "max".to_string()),
                    ("interval", "1d".to_string()),
                    ("events", "div".to_string()),
                ],
            )
            .await?;
        let history = parse::parse_chart(symbol, &json)?;
        tracing::debug!(
            "Fetched {} closes and {} dividends for {}",
            history.prices.len(),
            history.dividends.len(),
            symbol
        );
        Ok(history)
    }
}

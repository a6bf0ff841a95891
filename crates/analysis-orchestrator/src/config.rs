use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query2.finance.yahoo.com";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Upper bound for each provider call
    pub fetch_timeout_secs: u64,
    /// Freshness window for profile / quote data
    pub quote_cache_ttl_secs: i64,
    /// Freshness window for statements and price history
    pub history_cache_ttl_secs: i64,
    /// Max Yahoo requests per minute
    pub yahoo_rate_limit: usize,
    pub yahoo_base_url: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 15,
            quote_cache_ttl_secs: 300,
            history_cache_ttl_secs: 3600,
            yahoo_rate_limit: 60,
            yahoo_base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}

impl OrchestratorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            fetch_timeout_secs: parse_var(&lookup, "FETCH_TIMEOUT_SECS", defaults.fetch_timeout_secs)?,
            quote_cache_ttl_secs: parse_var(&lookup, "QUOTE_CACHE_TTL_SECS", defaults.quote_cache_ttl_secs)?,
            history_cache_ttl_secs: parse_var(
                &lookup,
                "HISTORY_CACHE_TTL_SECS",
                defaults.history_cache_ttl_secs,
            )?,
            yahoo_rate_limit: parse_var(&lookup, "YAHOO_RATE_LIMIT", defaults.yahoo_rate_limit)?,
            yahoo_base_url: lookup("YAHOO_BASE_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.yahoo_base_url),
        };

        if config.fetch_timeout_secs == 0 {
            anyhow::bail!("FETCH_TIMEOUT_SECS must be greater than zero");
        }
        if config.yahoo_rate_limit == 0 {
            anyhow::bail!("YAHOO_RATE_LIMIT must be greater than zero");
        }

        Ok(config)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

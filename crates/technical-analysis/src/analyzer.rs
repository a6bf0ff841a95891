use analysis_core::PricePoint;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::indicators::{rolling_rsi, rolling_sma};

pub const SHORT_SMA_PERIOD: usize = 50;
pub const LONG_SMA_PERIOD: usize = 200;
pub const RSI_PERIOD: usize = 14;
/// Calendar days covered by the technical window.
pub const WINDOW_DAYS: i64 = 365;

/// One day in the technical window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub rsi_14: Option<f64>,
}

/// Trailing ~1-year price window with moving averages and RSI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalWindow {
    pub points: Vec<TechnicalPoint>,
}

impl TechnicalWindow {
    /// Build the window from an ascending daily series. Only the most recent
    /// `WINDOW_DAYS` are used, so the moving averages are undefined until that
    /// window itself holds enough samples.
    pub fn from_prices(prices: &[PricePoint]) -> Self {
        let Some(last) = prices.last() else {
            return Self::default();
        };
        let cutoff = last.date - Duration::days(WINDOW_DAYS);
        let start = prices.partition_point(|p| p.date < cutoff);
        let window = &prices[start..];

        let closes: Vec<f64> = window.iter().map(|p| p.close).collect();
        let sma_50 = rolling_sma(&closes, SHORT_SMA_PERIOD);
        let sma_200 = rolling_sma(&closes, LONG_SMA_PERIOD);
        let rsi_14 = rolling_rsi(&closes, RSI_PERIOD);

        let points = window
            .iter()
            .enumerate()
            .map(|(i, p)| TechnicalPoint {
                date: p.date,
                close: p.close,
                sma_50: sma_50[i],
                sma_200: sma_200[i],
                rsi_14: rsi_14[i],
            })
            .collect();

        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&TechnicalPoint> {
        self.points.last()
    }

    pub fn latest_rsi(&self) -> Option<f64> {
        self.latest().and_then(|p| p.rsi_14)
    }

    pub fn latest_sma_50(&self) -> Option<f64> {
        self.latest().and_then(|p| p.sma_50)
    }

    pub fn latest_sma_200(&self) -> Option<f64> {
        self.latest().and_then(|p| p.sma_200)
    }

    /// Trend read from the latest close against both averages.
    pub fn trend(&self) -> Trend {
        let Some(p) = self.latest() else {
            return Trend::Unknown;
        };
        match (p.sma_50, p.sma_200) {
            (Some(s50), Some(s200)) if p.close > s50 && s50 > s200 => Trend::Uptrend,
            (Some(s50), Some(s200)) if p.close < s50 && s50 < s200 => Trend::Downtrend,
            (Some(_), Some(_)) => Trend::Sideways,
            _ => Trend::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Uptrend,
    Downtrend,
    Sideways,
    Unknown,
}

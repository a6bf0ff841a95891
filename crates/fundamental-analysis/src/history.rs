//! Multi-year statement trends, historical valuation averages and the
//! technical window.

use std::collections::BTreeMap;

use analysis_core::{stats, AnalysisError, AnnualStatement, MarketSnapshot, PricePoint};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use technical_analysis::{all_time_high, distance_from_high, TechnicalWindow};

use crate::derivation::{growth_with_fallback, GrowthRate};

/// Years of daily history used for historical averages.
pub const HISTORY_YEARS: i32 = 10;
/// Per-year P/E values outside `(0, MAX_HISTORICAL_PE)` are discarded.
pub const MAX_HISTORICAL_PE: f64 = 200.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    /// False when derivation failed and every field below is empty.
    pub available: bool,
    pub statements: Vec<AnnualStatement>,
    pub dividends_per_year: BTreeMap<i32, f64>,
    /// Daily closes over the last `HISTORY_YEARS`.
    pub prices: Vec<PricePoint>,
    pub eps_cagr: Option<GrowthRate>,
    pub fcf_cagr: Option<GrowthRate>,
    pub historical_pe: Option<f64>,
    pub historical_yield: Option<f64>,
    pub all_time_high: Option<f64>,
    pub ath_distance_pct: Option<f64>,
    pub technical: TechnicalWindow,
    /// Statements are not reported in USD; the historical P/E mixes the
    /// statement currency with the quote currency.
    pub currency_caveat: bool,
}

impl HistoricalSeries {
    /// Result used when the historical stage fails.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Derive the series from a snapshot. `current_price` is used for the
    /// all-time-high distance.
    pub fn derive(snapshot: &MarketSnapshot, current_price: Option<f64>) -> Result<Self, AnalysisError> {
        validate_prices(&snapshot.history.prices)?;

        let mut statements = snapshot.statements.clone();
        statements.sort_by_key(|s| s.fiscal_year);
        let prices = snapshot.history.trailing_years(HISTORY_YEARS).to_vec();
        let dividends_per_year = dividends_per_year(&snapshot.history.dividends);
        let avg_close = annual_average_close(&prices);

        let eps_series: Vec<(i32, f64)> = statements
            .iter()
            .filter_map(|s| eps_for_year(s).map(|eps| (s.fiscal_year, eps)))
            .collect();
        let fcf_series: Vec<(i32, f64)> = statements
            .iter()
            .filter_map(|s| s.free_cash_flow_or_derived().map(|fcf| (s.fiscal_year, fcf)))
            .collect();

        let all_time_high = all_time_high(&snapshot.history.prices);
        let reference_price = current_price.or_else(|| snapshot.history.prices.last().map(|p| p.close));
        let ath_distance_pct = match (reference_price, all_time_high) {
            (Some(price), Some(high)) => distance_from_high(price, high),
            _ => None,
        };

        let currency_caveat = snapshot
            .profile
            .financial_currency
            .as_deref()
            .is_some_and(|c| !c.eq_ignore_ascii_case("USD"));

        Ok(Self {
            available: true,
            eps_cagr: growth_with_fallback(&eps_series),
            fcf_cagr: growth_with_fallback(&fcf_series),
            historical_pe: historical_average_pe(&statements, &avg_close),
            historical_yield: historical_average_yield(&dividends_per_year, &avg_close),
            all_time_high,
            ath_distance_pct,
            technical: TechnicalWindow::from_prices(&prices),
            currency_caveat,
            statements,
            dividends_per_year,
            prices,
        })
    }

    /// Operating margins (percent) by fiscal year, oldest first.
    pub fn operating_margins(&self) -> Vec<(i32, f64)> {
        self.statements
            .iter()
            .filter_map(|s| s.operating_margin_pct().map(|m| (s.fiscal_year, m)))
            .collect()
    }

    /// Total debt by fiscal year, oldest first.
    pub fn total_debt(&self) -> Vec<(i32, f64)> {
        self.statements
            .iter()
            .filter_map(|s| s.total_debt.map(|d| (s.fiscal_year, d)))
            .collect()
    }
}

fn validate_prices(prices: &[PricePoint]) -> Result<(), AnalysisError> {
    if let Some(bad) = prices.iter().find(|p| !p.close.is_finite()) {
        return Err(AnalysisError::InvalidData(format!(
            "non-finite close on {}",
            bad.date
        )));
    }
    if let Some(w) = prices.windows(2).find(|w| w[1].date < w[0].date) {
        return Err(AnalysisError::InvalidData(format!(
            "price history out of order at {}",
            w[1].date
        )));
    }
    Ok(())
}

fn eps_for_year(statement: &AnnualStatement) -> Option<f64> {
    match (statement.net_income, statement.average_shares()) {
        (Some(ni), Some(shares)) if shares > 0.0 => Some(ni / shares),
        _ => None,
    }
}

/// Mean close per calendar year.
pub fn annual_average_close(prices: &[PricePoint]) -> BTreeMap<i32, f64> {
    let mut buckets: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for p in prices.iter().filter(|p| p.close > 0.0) {
        buckets.entry(p.date.year()).or_default().push(p.close);
    }
    buckets
        .into_iter()
        .filter_map(|(year, closes)| stats::mean(&closes).map(|m| (year, m)))
        .collect()
}

/// Sum of dividend payments per calendar year.
pub fn dividends_per_year(dividends: &[analysis_core::DividendPayment]) -> BTreeMap<i32, f64> {
    let mut out = BTreeMap::new();
    for d in dividends.iter().filter(|d| d.amount.is_finite() && d.amount > 0.0) {
        *out.entry(d.date.year()).or_insert(0.0) += d.amount;
    }
    out
}

/// Mean of per-year `avg_price / EPS` across fiscal years with positive net
/// income and share count, keeping only values in `(0, MAX_HISTORICAL_PE)`.
pub fn historical_average_pe(
    statements: &[AnnualStatement],
    avg_close_by_year: &BTreeMap<i32, f64>,
) -> Option<f64> {
    let per_year: Vec<f64> = statements
        .iter()
        .filter(|s| s.net_income.is_some_and(|ni| ni > 0.0))
        .filter_map(|s| {
            let eps = eps_for_year(s)?;
            let price = avg_close_by_year.get(&s.fiscal_year)?;
            Some(price / eps)
        })
        .filter(|pe| *pe > 0.0 && *pe < MAX_HISTORICAL_PE)
        .collect();
    stats::mean(&per_year)
}

/// Mean of per-year `dividends / avg_price * 100` across years with both.
pub fn historical_average_yield(
    dividends_by_year: &BTreeMap<i32, f64>,
    avg_close_by_year: &BTreeMap<i32, f64>,
) -> Option<f64> {
    let yields: Vec<f64> = dividends_by_year
        .iter()
        .filter_map(|(year, paid)| {
            let price = avg_close_by_year.get(year)?;
            stats::safe_div(*paid, *price).map(|y| y * 100.0)
        })
        .collect();
    stats::mean(&yields)
}

//! Pure metric derivation.
//!
//! Every function returns `None` when its inputs are missing or the
//! arithmetic is undefined (zero denominators, negative bases under a
//! fractional power). Nothing here panics or returns an error.

use analysis_core::{stats, AnnualStatement, CompanyProfile};
use serde::{Deserialize, Serialize};

/// Guards a zero numerator in the CAGR base.
pub const CAGR_EPSILON: f64 = 1e-9;

/// Reported payout ratios outside `[0, PAYOUT_SANITY_MAX]` are treated as garbage.
pub const PAYOUT_SANITY_MAX: f64 = 1.5;

/// Compound annual growth rate in percent.
///
/// The magnitude of `end` is used for the base and the sign of `end` is
/// applied to the result, so a series that crosses from positive into
/// negative still reports a (negative) rate instead of failing.
pub fn cagr(end: f64, start: f64, years: f64) -> Option<f64> {
    if !end.is_finite() || !start.is_finite() || start <= 0.0 || years <= 0.0 {
        return None;
    }
    let sign = if end < 0.0 { -1.0 } else { 1.0 };
    let base = (end.abs() + CAGR_EPSILON) / start;
    let rate = sign * (base.powf(1.0 / years) - 1.0) * 100.0;
    rate.is_finite().then_some(rate)
}

/// Look-back window used for a growth figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthWindow {
    FiveYear,
    ThreeYear,
}

impl GrowthWindow {
    pub fn label(&self) -> &'static str {
        match self {
            GrowthWindow::FiveYear => "5Y",
            GrowthWindow::ThreeYear => "3Y",
        }
    }

    /// Number of periods compared (inclusive of both ends).
    pub fn periods(&self) -> usize {
        match self {
            GrowthWindow::FiveYear => 5,
            GrowthWindow::ThreeYear => 3,
        }
    }

    /// Exponent used in the CAGR.
    pub fn years(&self) -> f64 {
        (self.periods() - 1) as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthRate {
    pub value: f64,
    pub window: GrowthWindow,
}

/// CAGR of an ascending `(fiscal_year, value)` series, preferring the
/// 5-year window and falling back to 3 years. Each window needs an
/// observation exactly `years()` fiscal years before the latest one, so gaps
/// in the series never stretch a window past its exponent.
pub fn growth_with_fallback(series: &[(i32, f64)]) -> Option<GrowthRate> {
    let &(latest_year, latest) = series.last()?;
    [GrowthWindow::FiveYear, GrowthWindow::ThreeYear]
        .into_iter()
        .find_map(|window| {
            let start_year = latest_year - window.years() as i32;
            let &(_, start) = series.iter().find(|(year, _)| *year == start_year)?;
            cagr(latest, start, window.years()).map(|value| GrowthRate { value, window })
        })
}

/// Return on invested capital in percent, using the effective tax rate.
pub fn roic(
    ebit: Option<f64>,
    pretax_income: Option<f64>,
    tax: Option<f64>,
    total_debt: Option<f64>,
    total_equity: Option<f64>,
) -> Option<f64> {
    let (ebit, pretax, tax, debt, equity) = (ebit?, pretax_income?, tax?, total_debt?, total_equity?);
    if pretax <= 0.0 {
        return None;
    }
    let effective_tax_rate = tax / pretax;
    let nopat = ebit * (1.0 - effective_tax_rate);
    let invested_capital = debt + equity;
    if invested_capital <= 0.0 {
        return None;
    }
    Some(nopat / invested_capital * 100.0)
}

/// `(debt - cash) / EBITDA`. Negative means a net cash position.
pub fn net_debt_to_ebitda(total_debt: Option<f64>, cash: Option<f64>, ebitda: Option<f64>) -> Option<f64> {
    let (debt, cash, ebitda) = (total_debt?, cash?, ebitda?);
    if ebitda <= 0.0 {
        return None;
    }
    Some((debt - cash) / ebitda)
}

/// `EBIT / |interest expense|`.
pub fn interest_coverage(ebit: Option<f64>, interest_expense: Option<f64>) -> Option<f64> {
    let (ebit, interest) = (ebit?, interest_expense?);
    if interest == 0.0 {
        return None;
    }
    Some(ebit / interest.abs())
}

/// Net share-count reduction between the two most recent positive
/// observations, in percent. Negative means dilution.
pub fn net_buyback_pct(share_counts: &[f64]) -> Option<f64> {
    let valid: Vec<f64> = share_counts
        .iter()
        .copied()
        .filter(|s| s.is_finite() && *s > 0.0)
        .collect();
    if valid.len() < 2 {
        return None;
    }
    let latest = valid[valid.len() - 1];
    let prior = valid[valid.len() - 2];
    Some((prior - latest) / prior * 100.0)
}

/// Reported payout ratio (fraction) if it is sane, else `dividend_rate / eps`
/// when computable, else `None`.
pub fn sanitize_payout_ratio(
    reported: Option<f64>,
    dividend_rate: Option<f64>,
    trailing_eps: Option<f64>,
) -> Option<f64> {
    if let Some(ratio) = reported {
        if (0.0..=PAYOUT_SANITY_MAX).contains(&ratio) {
            return Some(ratio);
        }
    }
    match (dividend_rate, trailing_eps) {
        (Some(rate), Some(eps)) if eps > 0.0 && rate >= 0.0 => Some(rate / eps),
        _ => None,
    }
}

/// Market cap over positive free cash flow.
pub fn price_to_fcf(market_cap: Option<f64>, free_cash_flow: Option<f64>) -> Option<f64> {
    let (cap, fcf) = (market_cap?, free_cash_flow?);
    if fcf <= 0.0 || cap <= 0.0 {
        return None;
    }
    Some(cap / fcf)
}

/// Annual dividend over price, in percent.
pub fn dividend_yield(dividend_rate: Option<f64>, price: Option<f64>) -> Option<f64> {
    let (rate, price) = (dividend_rate?, price?);
    if price <= 0.0 || rate < 0.0 {
        return None;
    }
    Some(rate / price * 100.0)
}

/// Dividends paid as a share of positive free cash flow, in percent.
pub fn payout_on_fcf(dividends_paid: Option<f64>, free_cash_flow: Option<f64>) -> Option<f64> {
    let (paid, fcf) = (dividends_paid?, free_cash_flow?);
    if fcf <= 0.0 {
        return None;
    }
    Some(paid.abs() / fcf * 100.0)
}

/// P/E over year-over-year EPS growth (percent). Defined only for positive inputs.
pub fn peg_ratio(pe: Option<f64>, growth_pct: Option<f64>) -> Option<f64> {
    let (pe, growth) = (pe?, growth_pct?);
    if pe <= 0.0 || growth <= 0.0 {
        return None;
    }
    Some(pe / growth)
}

/// Price over EPS, only for positive earnings.
pub fn price_to_earnings(price: Option<f64>, eps: Option<f64>) -> Option<f64> {
    let (price, eps) = (price?, eps?);
    if eps <= 0.0 || price <= 0.0 {
        return None;
    }
    Some(price / eps)
}

fn pct(fraction: Option<f64>) -> Option<f64> {
    fraction.filter(|f| f.is_finite()).map(|f| f * 100.0)
}

/// Normalized, per-ticker fundamentals. Percent-valued fields are in percent
/// (ROE 25.0 means 25 %). A `None` means "not computable", never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyFundamentals {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub description: Option<String>,
    pub currency: Option<String>,

    pub current_price: Option<f64>,
    pub target_price: Option<f64>,
    pub beta: Option<f64>,
    pub recommendation: Option<String>,
    pub market_cap: Option<f64>,

    // Profitability
    pub roe: Option<f64>,
    pub roic: Option<f64>,
    pub operating_margin: Option<f64>,
    pub net_margin: Option<f64>,

    // Valuation
    pub trailing_eps: Option<f64>,
    pub forward_eps: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub price_to_fcf: Option<f64>,
    pub price_to_book: Option<f64>,

    // Leverage
    pub net_debt_to_ebitda: Option<f64>,
    pub interest_coverage: Option<f64>,
    pub current_ratio: Option<f64>,

    // Shareholder returns
    pub dividend_rate: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub payout_ratio: Option<f64>,
    pub payout_on_fcf: Option<f64>,
    pub net_buyback_pct: Option<f64>,

    // Growth and absolutes
    pub eps_growth_yoy: Option<f64>,
    pub free_cash_flow: Option<f64>,
}

impl CompanyFundamentals {
    /// Derive fundamentals from the provider profile and annual statements
    /// (ascending by fiscal year). `fallback_price` is used when the profile
    /// carries no live quote, typically the last close of the price history.
    pub fn derive(
        profile: &CompanyProfile,
        statements: &[AnnualStatement],
        fallback_price: Option<f64>,
    ) -> Self {
        let latest = statements.last();
        let price = profile.current_price.filter(|p| *p > 0.0).or(fallback_price);

        let free_cash_flow = profile
            .free_cash_flow
            .or_else(|| latest.and_then(|s| s.free_cash_flow_or_derived()));

        let ebit = latest.and_then(|s| s.ebit.or(s.operating_income));
        let statement_debt = latest.and_then(|s| s.total_debt);

        let roic = roic(
            ebit,
            latest.and_then(|s| s.pretax_income),
            latest.and_then(|s| s.tax_provision),
            statement_debt.or(profile.total_debt),
            latest.and_then(|s| s.stockholders_equity),
        );

        let net_debt_to_ebitda = net_debt_to_ebitda(
            profile.total_debt.or(statement_debt),
            profile.total_cash.or_else(|| latest.and_then(|s| s.cash)),
            profile.ebitda.or_else(|| latest.and_then(|s| s.ebitda)),
        );

        let interest_coverage = interest_coverage(ebit, latest.and_then(|s| s.interest_expense));

        let shares: Vec<f64> = statements.iter().filter_map(|s| s.average_shares()).collect();

        let trailing_pe = profile
            .trailing_pe
            .filter(|pe| *pe > 0.0)
            .or_else(|| price_to_earnings(price, profile.trailing_eps));
        let forward_pe = profile
            .forward_pe
            .filter(|pe| *pe > 0.0)
            .or_else(|| price_to_earnings(price, profile.forward_eps));

        let dividend_yield =
            dividend_yield(profile.dividend_rate, price).or_else(|| pct(profile.dividend_yield));

        let payout_ratio = pct(sanitize_payout_ratio(
            profile.payout_ratio,
            profile.dividend_rate,
            profile.trailing_eps,
        ));

        let operating_margin =
            pct(profile.operating_margin).or_else(|| latest.and_then(|s| s.operating_margin_pct()));
        let net_margin = pct(profile.profit_margin).or_else(|| {
            latest.and_then(|s| match (s.net_income, s.total_revenue) {
                (Some(ni), Some(rev)) if rev > 0.0 => Some(ni / rev * 100.0),
                _ => None,
            })
        });

        Self {
            symbol: profile.symbol.clone(),
            name: profile.name.clone(),
            sector: profile.sector.clone(),
            industry: profile.industry.clone(),
            country: profile.country.clone(),
            description: profile.description.clone(),
            currency: profile.financial_currency.clone(),
            current_price: price,
            target_price: profile.target_price.filter(|t| *t > 0.0),
            beta: profile.beta,
            recommendation: profile.recommendation.clone(),
            market_cap: profile.market_cap,
            roe: pct(profile.return_on_equity),
            roic,
            operating_margin,
            net_margin,
            trailing_eps: profile.trailing_eps,
            forward_eps: profile.forward_eps,
            trailing_pe,
            forward_pe,
            price_to_fcf: price_to_fcf(profile.market_cap, free_cash_flow),
            price_to_book: profile.price_to_book.filter(|pb| *pb > 0.0),
            net_debt_to_ebitda,
            interest_coverage,
            current_ratio: profile.current_ratio,
            dividend_rate: profile.dividend_rate,
            dividend_yield,
            payout_ratio,
            payout_on_fcf: payout_on_fcf(latest.and_then(|s| s.dividends_paid), free_cash_flow),
            net_buyback_pct: net_buyback_pct(&shares),
            eps_growth_yoy: pct(profile.earnings_growth),
            free_cash_flow,
        }
    }

    /// Upside to the analyst target, in percent.
    pub fn analyst_upside_pct(&self) -> Option<f64> {
        match (self.target_price, self.current_price) {
            (Some(target), Some(price)) if price > 0.0 => stats::pct_change(target, price),
            _ => None,
        }
    }

    pub fn peg(&self) -> Option<f64> {
        peg_ratio(self.trailing_pe, self.eps_growth_yoy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cagr_doubling_in_one_year() {
        assert_relative_eq!(cagr(200.0, 100.0, 1.0).unwrap(), 100.0, epsilon = 1e-6);
    }

    #[test]
    fn cagr_undefined_inputs() {
        assert_eq!(cagr(200.0, 0.0, 1.0), None);
        assert_eq!(cagr(200.0, -5.0, 1.0), None);
        assert_eq!(cagr(200.0, 100.0, 0.0), None);
        assert_eq!(cagr(200.0, 100.0, -1.0), None);
        assert_eq!(cagr(f64::NAN, 100.0, 1.0), None);
    }

    #[test]
    fn cagr_sign_follows_negative_end() {
        // |end| / start = 2 -> +100 %, flipped by the negative end
        assert_relative_eq!(cagr(-200.0, 100.0, 1.0).unwrap(), -100.0, epsilon = 1e-6);
        // zero end stays finite thanks to the epsilon
        let zero = cagr(0.0, 100.0, 2.0).unwrap();
        assert!(zero.is_finite());
        assert_relative_eq!(zero, -100.0, epsilon = 1e-3);
    }

    fn annual(values: &[f64]) -> Vec<(i32, f64)> {
        values.iter().enumerate().map(|(i, v)| (2019 + i as i32, *v)).collect()
    }

    #[test]
    fn growth_prefers_five_year_window() {
        let series = annual(&[1.0, 1.1, 1.2, 1.3, 2.0]);
        let g = growth_with_fallback(&series).unwrap();
        assert_eq!(g.window, GrowthWindow::FiveYear);
        assert_eq!(g.window.label(), "5Y");
        assert_relative_eq!(g.value, (2.0f64.powf(0.25) - 1.0) * 100.0, epsilon = 1e-6);
    }

    #[test]
    fn growth_falls_back_to_three_year() {
        let short = annual(&[1.0, 1.5, 2.25, 3.0]);
        let g = growth_with_fallback(&short).unwrap();
        assert_eq!(g.window, GrowthWindow::ThreeYear);
        assert_relative_eq!(g.value, (2.0f64.sqrt() - 1.0) * 100.0, epsilon = 1e-6);

        // 5-year start is negative -> undefined, 3-year start is fine
        let crossing = annual(&[-1.0, 0.5, 1.0, 1.2, 1.44]);
        let g = growth_with_fallback(&crossing).unwrap();
        assert_eq!(g.window, GrowthWindow::ThreeYear);
        assert_relative_eq!(g.value, 20.0, epsilon = 1e-6);
    }

    #[test]
    fn growth_window_is_keyed_by_fiscal_year() {
        // Five observations, but 2019 is missing: 2018 -> 2023 spans five
        // years, so the 5Y window has no start and 2021 -> 2023 is used.
        let gapped = vec![(2018, 1.0), (2020, 1.0), (2021, 1.0), (2022, 1.2), (2023, 1.44)];
        let g = growth_with_fallback(&gapped).unwrap();
        assert_eq!(g.window, GrowthWindow::ThreeYear);
        assert_relative_eq!(g.value, 20.0, epsilon = 1e-6);

        let sparse = vec![(2015, 1.0), (2020, 2.0), (2023, 4.0)];
        assert_eq!(growth_with_fallback(&sparse), None);
    }

    #[test]
    fn growth_unavailable_for_short_series() {
        assert_eq!(growth_with_fallback(&[]), None);
        assert_eq!(growth_with_fallback(&annual(&[1.0, 2.0])), None);
        assert_eq!(growth_with_fallback(&annual(&[0.0, 0.0, 1.0])), None);
    }

    #[test]
    fn roic_with_effective_tax_rate() {
        // tax rate 20%, NOPAT 80, IC 400 -> 20%
        let r = roic(Some(100.0), Some(90.0), Some(18.0), Some(150.0), Some(250.0)).unwrap();
        assert_relative_eq!(r, 20.0, epsilon = 1e-9);
    }

    #[test]
    fn roic_undefined_cases() {
        assert_eq!(roic(None, Some(90.0), Some(18.0), Some(150.0), Some(250.0)), None);
        assert_eq!(roic(Some(100.0), Some(0.0), Some(18.0), Some(150.0), Some(250.0)), None);
        assert_eq!(roic(Some(100.0), Some(-10.0), Some(1.0), Some(150.0), Some(250.0)), None);
        assert_eq!(roic(Some(100.0), Some(90.0), Some(18.0), Some(-300.0), Some(250.0)), None);
    }

    #[test]
    fn net_debt_to_ebitda_cases() {
        assert_relative_eq!(net_debt_to_ebitda(Some(300.0), Some(100.0), Some(100.0)).unwrap(), 2.0);
        assert_relative_eq!(net_debt_to_ebitda(Some(50.0), Some(200.0), Some(100.0)).unwrap(), -1.5);
        assert_eq!(net_debt_to_ebitda(Some(300.0), Some(100.0), Some(0.0)), None);
        assert_eq!(net_debt_to_ebitda(Some(300.0), None, Some(100.0)), None);
    }

    #[test]
    fn interest_coverage_uses_absolute_expense() {
        assert_relative_eq!(interest_coverage(Some(100.0), Some(-20.0)).unwrap(), 5.0);
        assert_eq!(interest_coverage(Some(100.0), Some(0.0)), None);
        assert_eq!(interest_coverage(None, Some(10.0)), None);
    }

    #[test]
    fn buyback_uses_two_latest_positive_counts() {
        assert_relative_eq!(net_buyback_pct(&[120.0, 100.0, 98.0]).unwrap(), 2.0);
        assert_relative_eq!(net_buyback_pct(&[100.0, 105.0, 0.0]).unwrap(), -5.0);
        assert_eq!(net_buyback_pct(&[100.0]), None);
        assert_eq!(net_buyback_pct(&[0.0, -1.0, 100.0]), None);
    }

    #[test]
    fn payout_sanitization() {
        assert_eq!(sanitize_payout_ratio(Some(0.45), Some(2.0), Some(4.0)), Some(0.45));
        // exactly at the cutoff is trusted
        assert_eq!(sanitize_payout_ratio(Some(1.5), Some(2.0), Some(4.0)), Some(1.5));
        // out of range -> recompute from rate / eps
        assert_eq!(sanitize_payout_ratio(Some(3.2), Some(2.0), Some(4.0)), Some(0.5));
        assert_eq!(sanitize_payout_ratio(Some(-0.2), Some(1.0), Some(4.0)), Some(0.25));
        // out of range and not recomputable
        assert_eq!(sanitize_payout_ratio(Some(3.2), Some(2.0), Some(-1.0)), None);
        assert_eq!(sanitize_payout_ratio(Some(3.2), None, Some(4.0)), None);
    }

    #[test]
    fn peg_defined_only_for_positive_inputs() {
        assert_relative_eq!(peg_ratio(Some(20.0), Some(10.0)).unwrap(), 2.0);
        assert_eq!(peg_ratio(Some(0.0), Some(10.0)), None);
        assert_eq!(peg_ratio(Some(-5.0), Some(10.0)), None);
        assert_eq!(peg_ratio(Some(20.0), Some(0.0)), None);
        assert_eq!(peg_ratio(Some(20.0), Some(-3.0)), None);
    }

    #[test]
    fn simple_ratios() {
        assert_relative_eq!(price_to_fcf(Some(1000.0), Some(50.0)).unwrap(), 20.0);
        assert_eq!(price_to_fcf(Some(1000.0), Some(-50.0)), None);
        assert_relative_eq!(dividend_yield(Some(2.0), Some(50.0)).unwrap(), 4.0);
        assert_eq!(dividend_yield(Some(2.0), Some(0.0)), None);
        assert_relative_eq!(payout_on_fcf(Some(-95.0), Some(100.0)).unwrap(), 95.0);
        assert_eq!(payout_on_fcf(Some(-95.0), Some(-10.0)), None);
    }

    #[test]
    fn derive_converts_fractions_and_falls_back() {
        let profile = CompanyProfile {
            symbol: "ACME".to_string(),
            current_price: None,
            trailing_eps: Some(5.0),
            return_on_equity: Some(0.22),
            operating_margin: Some(0.18),
            earnings_growth: Some(0.12),
            dividend_rate: Some(2.0),
            payout_ratio: Some(7.0),
            market_cap: Some(2_000.0),
            total_debt: Some(300.0),
            total_cash: Some(100.0),
            ebitda: Some(200.0),
            ..Default::default()
        };
        let mut older = AnnualStatement::new(2022);
        older.basic_average_shares = Some(100.0);
        let mut latest = AnnualStatement::new(2023);
        latest.basic_average_shares = Some(97.0);
        latest.operating_cash_flow = Some(150.0);
        latest.capital_expenditure = Some(-50.0);
        latest.dividends_paid = Some(-40.0);
        latest.ebit = Some(120.0);
        latest.interest_expense = Some(-12.0);

        let f = CompanyFundamentals::derive(&profile, &[older, latest], Some(100.0));
        assert_eq!(f.current_price, Some(100.0));
        assert_relative_eq!(f.roe.unwrap(), 22.0, epsilon = 1e-9);
        assert_relative_eq!(f.operating_margin.unwrap(), 18.0, epsilon = 1e-9);
        assert_relative_eq!(f.eps_growth_yoy.unwrap(), 12.0, epsilon = 1e-9);
        assert_relative_eq!(f.trailing_pe.unwrap(), 20.0);
        assert_relative_eq!(f.dividend_yield.unwrap(), 2.0);
        assert_relative_eq!(f.payout_ratio.unwrap(), 40.0, epsilon = 1e-9);
        assert_relative_eq!(f.free_cash_flow.unwrap(), 100.0);
        assert_relative_eq!(f.price_to_fcf.unwrap(), 20.0);
        assert_relative_eq!(f.payout_on_fcf.unwrap(), 40.0);
        assert_relative_eq!(f.net_buyback_pct.unwrap(), 3.0);
        assert_relative_eq!(f.net_debt_to_ebitda.unwrap(), 1.0);
        assert_relative_eq!(f.interest_coverage.unwrap(), 10.0);
        assert_eq!(f.roic, None);
        assert_eq!(f.net_margin, None);
        assert_relative_eq!(f.peg().unwrap(), 20.0 / 12.0, epsilon = 1e-9);
    }
}

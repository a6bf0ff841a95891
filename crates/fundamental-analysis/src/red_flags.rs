//! Rule-based warnings. Every rule runs; none short-circuits another.

use analysis_core::stats;
use serde::{Deserialize, Serialize};

use crate::benchmarks::{Sector, SectorContext};
use crate::derivation::CompanyFundamentals;
use crate::history::HistoricalSeries;

pub const DANGEROUS_PAYOUT_PCT: f64 = 100.0;
/// Payout on free cash flow at or above this is not covered by cash.
pub const FCF_PAYOUT_UNCOVERED_PCT: f64 = 90.0;
pub const DEBT_GROWTH_PCT: f64 = 50.0;
pub const DEBT_GROWTH_WINDOW: usize = 3;
pub const MARGIN_DECLINE_YEARS: usize = 3;
pub const MIN_INTEREST_COVERAGE: f64 = 2.0;
pub const MIN_CURRENT_RATIO: f64 = 1.0;
pub const MICRO_CAP_THRESHOLD: f64 = 250_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedFlagKind {
    DangerousPayout,
    PayoutCoveredByCash,
    MarginDecline,
    DebtGrowth,
    NegativeFreeCashFlow,
    LowInterestCoverage,
    LowCurrentRatio,
    MicroCap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedFlag {
    pub kind: RedFlagKind,
    pub severity: Severity,
    pub message: String,
}

impl RedFlag {
    fn new(kind: RedFlagKind, severity: Severity, message: String) -> Self {
        Self { kind, severity, message }
    }
}

/// Run every rule and collect the flags in display order.
pub fn analyze(f: &CompanyFundamentals, h: &HistoricalSeries, ctx: &SectorContext) -> Vec<RedFlag> {
    let rules: [fn(&CompanyFundamentals, &HistoricalSeries, &SectorContext) -> Option<RedFlag>; 7] = [
        payout_rule,
        margin_decline_rule,
        debt_growth_rule,
        negative_fcf_rule,
        interest_coverage_rule,
        current_ratio_rule,
        micro_cap_rule,
    ];
    rules.iter().filter_map(|rule| rule(f, h, ctx)).collect()
}

fn payout_rule(f: &CompanyFundamentals, _h: &HistoricalSeries, ctx: &SectorContext) -> Option<RedFlag> {
    // REITs distribute most earnings by statute
    if ctx.is(Sector::RealEstate) {
        return None;
    }
    let payout = f.payout_ratio.filter(|p| *p > DANGEROUS_PAYOUT_PCT)?;
    match f.payout_on_fcf {
        Some(fcf_payout) if fcf_payout >= FCF_PAYOUT_UNCOVERED_PCT => Some(RedFlag::new(
            RedFlagKind::DangerousPayout,
            Severity::Critical,
            format!(
                "Dangerous payout: dividends are {payout:.0}% of earnings and {fcf_payout:.0}% of free cash flow"
            ),
        )),
        Some(fcf_payout) => Some(RedFlag::new(
            RedFlagKind::PayoutCoveredByCash,
            Severity::Info,
            format!(
                "Payout is {payout:.0}% of earnings but only {fcf_payout:.0}% of free cash flow; covered by cash for now"
            ),
        )),
        None => Some(RedFlag::new(
            RedFlagKind::PayoutCoveredByCash,
            Severity::Warning,
            format!("Payout is {payout:.0}% of earnings; free cash flow coverage unknown"),
        )),
    }
}

/// True when the last `years` fiscal-year values are strictly decreasing,
/// i.e. `years - 1` consecutive year-over-year drops.
pub fn is_consecutive_decline(series: &[(i32, f64)], years: usize) -> bool {
    if years < 2 || series.len() < years {
        return false;
    }
    series[series.len() - years..].windows(2).all(|w| w[1].1 < w[0].1)
}

/// Growth in percent from the oldest to the newest of the last `window` values.
pub fn window_growth_pct(series: &[(i32, f64)], window: usize) -> Option<f64> {
    if window < 2 || series.len() < window {
        return None;
    }
    let tail = &series[series.len() - window..];
    let (start, end) = (tail[0].1, tail[window - 1].1);
    if start > 0.0 {
        stats::pct_change(end, start)
    } else {
        None
    }
}

fn margin_decline_rule(_f: &CompanyFundamentals, h: &HistoricalSeries, _ctx: &SectorContext) -> Option<RedFlag> {
    let margins = h.operating_margins();
    if !is_consecutive_decline(&margins, MARGIN_DECLINE_YEARS) {
        return None;
    }
    let tail = &margins[margins.len() - MARGIN_DECLINE_YEARS..];
    Some(RedFlag::new(
        RedFlagKind::MarginDecline,
        Severity::Warning,
        format!(
            "Operating margin fell every year over the last {MARGIN_DECLINE_YEARS} fiscal years ({:.1}% in {} to {:.1}% in {})",
            tail[0].1,
            tail[0].0,
            tail[MARGIN_DECLINE_YEARS - 1].1,
            tail[MARGIN_DECLINE_YEARS - 1].0
        ),
    ))
}

fn debt_growth_rule(_f: &CompanyFundamentals, h: &HistoricalSeries, _ctx: &SectorContext) -> Option<RedFlag> {
    let growth = window_growth_pct(&h.total_debt(), DEBT_GROWTH_WINDOW)?;
    (growth > DEBT_GROWTH_PCT).then(|| {
        RedFlag::new(
            RedFlagKind::DebtGrowth,
            Severity::Warning,
            format!("Total debt grew {growth:.0}% over the last {DEBT_GROWTH_WINDOW} fiscal years"),
        )
    })
}

fn negative_fcf_rule(f: &CompanyFundamentals, _h: &HistoricalSeries, _ctx: &SectorContext) -> Option<RedFlag> {
    let fcf = f.free_cash_flow.filter(|v| *v < 0.0)?;
    Some(RedFlag::new(
        RedFlagKind::NegativeFreeCashFlow,
        Severity::Critical,
        format!("Negative free cash flow ({:.0}M)", fcf / 1e6),
    ))
}

fn interest_coverage_rule(f: &CompanyFundamentals, _h: &HistoricalSeries, _ctx: &SectorContext) -> Option<RedFlag> {
    let coverage = f.interest_coverage.filter(|c| *c < MIN_INTEREST_COVERAGE)?;
    Some(RedFlag::new(
        RedFlagKind::LowInterestCoverage,
        Severity::Warning,
        format!("Interest coverage of {coverage:.1}x is below {MIN_INTEREST_COVERAGE:.0}x"),
    ))
}

fn current_ratio_rule(f: &CompanyFundamentals, _h: &HistoricalSeries, _ctx: &SectorContext) -> Option<RedFlag> {
    let ratio = f.current_ratio.filter(|r| *r < MIN_CURRENT_RATIO)?;
    Some(RedFlag::new(
        RedFlagKind::LowCurrentRatio,
        Severity::Warning,
        format!("Current ratio of {ratio:.2} means short-term liabilities exceed current assets"),
    ))
}

fn micro_cap_rule(f: &CompanyFundamentals, _h: &HistoricalSeries, _ctx: &SectorContext) -> Option<RedFlag> {
    let cap = f.market_cap.filter(|c| *c > 0.0 && *c < MICRO_CAP_THRESHOLD)?;
    Some(RedFlag::new(
        RedFlagKind::MicroCap,
        Severity::Info,
        format!("Micro cap ({:.0}M): expect low liquidity and high volatility", cap / 1e6),
    ))
}

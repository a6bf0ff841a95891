use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Company profile and live quote fields as reported by the data provider.
///
/// Ratios the provider reports as fractions (margins, ROE, payout, growth,
/// dividend yield) are kept as fractions here; conversion to percent happens
/// during metric derivation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub financial_currency: Option<String>,

    // Quote
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub target_price: Option<f64>,
    #[serde(default)]
    pub beta: Option<f64>,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub market_cap: Option<f64>,

    // Earnings and multiples
    #[serde(default)]
    pub trailing_eps: Option<f64>,
    #[serde(default)]
    pub forward_eps: Option<f64>,
    #[serde(default)]
    pub trailing_pe: Option<f64>,
    #[serde(default)]
    pub forward_pe: Option<f64>,
    #[serde(default)]
    pub price_to_book: Option<f64>,

    // Balance sheet summary
    #[serde(default)]
    pub total_cash: Option<f64>,
    #[serde(default)]
    pub total_debt: Option<f64>,
    #[serde(default)]
    pub ebitda: Option<f64>,
    #[serde(default)]
    pub current_ratio: Option<f64>,

    // Dividends
    #[serde(default)]
    pub dividend_rate: Option<f64>,
    #[serde(default)]
    pub dividend_yield: Option<f64>,
    #[serde(default)]
    pub payout_ratio: Option<f64>,

    // Profitability and growth (fractions)
    #[serde(default)]
    pub free_cash_flow: Option<f64>,
    #[serde(default)]
    pub operating_margin: Option<f64>,
    #[serde(default)]
    pub profit_margin: Option<f64>,
    #[serde(default)]
    pub return_on_equity: Option<f64>,
    #[serde(default)]
    pub earnings_growth: Option<f64>,
}

/// One fiscal year of statement data, merging income statement, balance sheet
/// and cash-flow rows. Any row may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnualStatement {
    pub fiscal_year: i32,
    #[serde(default)]
    pub total_revenue: Option<f64>,
    #[serde(default)]
    pub operating_income: Option<f64>,
    #[serde(default)]
    pub ebit: Option<f64>,
    #[serde(default)]
    pub ebitda: Option<f64>,
    #[serde(default)]
    pub interest_expense: Option<f64>,
    #[serde(default)]
    pub pretax_income: Option<f64>,
    #[serde(default)]
    pub tax_provision: Option<f64>,
    #[serde(default)]
    pub net_income: Option<f64>,
    #[serde(default)]
    pub basic_average_shares: Option<f64>,
    #[serde(default)]
    pub diluted_average_shares: Option<f64>,
    #[serde(default)]
    pub total_debt: Option<f64>,
    #[serde(default)]
    pub cash: Option<f64>,
    #[serde(default)]
    pub stockholders_equity: Option<f64>,
    #[serde(default)]
    pub free_cash_flow: Option<f64>,
    #[serde(default)]
    pub operating_cash_flow: Option<f64>,
    #[serde(default)]
    pub capital_expenditure: Option<f64>,
    #[serde(default)]
    pub dividends_paid: Option<f64>,
}

impl AnnualStatement {
    pub fn new(fiscal_year: i32) -> Self {
        Self {
            fiscal_year,
            ..Default::default()
        }
    }

    /// Reported free cash flow, or operating cash flow plus capex
    /// (capex is reported as a negative outflow).
    pub fn free_cash_flow_or_derived(&self) -> Option<f64> {
        self.free_cash_flow.or_else(|| match (self.operating_cash_flow, self.capital_expenditure) {
            (Some(ocf), Some(capex)) => Some(ocf + capex),
            _ => None,
        })
    }

    /// Basic average share count, falling back to diluted.
    pub fn average_shares(&self) -> Option<f64> {
        self.basic_average_shares.or(self.diluted_average_shares)
    }

    /// Operating margin in percent.
    pub fn operating_margin_pct(&self) -> Option<f64> {
        match (self.operating_income, self.total_revenue) {
            (Some(op), Some(rev)) if rev > 0.0 => Some(op / rev * 100.0),
            _ => None,
        }
    }
}

/// Daily closing price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Cash dividend per share paid on `date`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DividendPayment {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Full ("max") daily price history plus dividend events, ascending by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    #[serde(default)]
    pub prices: Vec<PricePoint>,
    #[serde(default)]
    pub dividends: Vec<DividendPayment>,
}

impl PriceHistory {
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.prices.last().map(|p| p.date)
    }

    /// Prices dated within `years` calendar years of the latest observation.
    pub fn trailing_years(&self, years: i32) -> &[PricePoint] {
        let Some(last) = self.last_date() else {
            return &[];
        };
        let cutoff = last
            .with_year(last.year() - years)
            .unwrap_or_else(|| last - chrono::Duration::days(365 * years as i64));
        let start = self.prices.partition_point(|p| p.date < cutoff);
        &self.prices[start..]
    }
}

/// Everything the provider returned for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub fetched_at: DateTime<Utc>,
    pub profile: CompanyProfile,
    #[serde(default)]
    pub statements: Vec<AnnualStatement>,
    #[serde(default)]
    pub history: PriceHistory,
}

impl MarketSnapshot {
    pub fn new(profile: CompanyProfile) -> Self {
        Self {
            symbol: profile.symbol.clone(),
            fetched_at: Utc::now(),
            profile,
            statements: Vec::new(),
            history: PriceHistory::default(),
        }
    }

    pub fn with_statements(mut self, mut statements: Vec<AnnualStatement>) -> Self {
        statements.sort_by_key(|s| s.fiscal_year);
        self.statements = statements;
        self
    }

    pub fn with_history(mut self, history: PriceHistory) -> Self {
        self.history = history;
        self
    }
}

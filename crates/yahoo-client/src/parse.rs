//! Pure parsers for the Yahoo Finance JSON payloads.

use std::collections::BTreeMap;

use analysis_core::{
    AnalysisError, AnnualStatement, CompanyProfile, DividendPayment, PriceHistory, PricePoint,
};
use chrono::{DateTime, Datelike, NaiveDate};
use serde_json::Value;

/// quoteSummary modules requested for the profile.
pub const PROFILE_MODULES: &[&str] = &[
    "price",
    "summaryProfile",
    "summaryDetail",
    "financialData",
    "defaultKeyStatistics",
];

/// Annual fundamentals-timeseries series and the statement field each fills.
pub const TIMESERIES_TYPES: &[&str] = &[
    "annualTotalRevenue",
    "annualOperatingIncome",
    "annualEBIT",
    "annualEBITDA",
    "annualInterestExpense",
    "annualPretaxIncome",
    "annualTaxProvision",
    "annualNetIncome",
    "annualBasicAverageShares",
    "annualDilutedAverageShares",
    "annualTotalDebt",
    "annualCashAndCashEquivalents",
    "annualStockholdersEquity",
    "annualFreeCashFlow",
    "annualOperatingCashFlow",
    "annualCapitalExpenditure",
    "annualCashDividendsPaid",
];

fn statement_field<'a>(statement: &'a mut AnnualStatement, series: &str) -> Option<&'a mut Option<f64>> {
    let field = match series {
        "annualTotalRevenue" => &mut statement.total_revenue,
        "annualOperatingIncome" => &mut statement.operating_income,
        "annualEBIT" => &mut statement.ebit,
        "annualEBITDA" => &mut statement.ebitda,
        "annualInterestExpense" => &mut statement.interest_expense,
        "annualPretaxIncome" => &mut statement.pretax_income,
        "annualTaxProvision" => &mut statement.tax_provision,
        "annualNetIncome" => &mut statement.net_income,
        "annualBasicAverageShares" => &mut statement.basic_average_shares,
        "annualDilutedAverageShares" => &mut statement.diluted_average_shares,
        "annualTotalDebt" => &mut statement.total_debt,
        "annualCashAndCashEquivalents" => &mut statement.cash,
        "annualStockholdersEquity" => &mut statement.stockholders_equity,
        "annualFreeCashFlow" => &mut statement.free_cash_flow,
        "annualOperatingCashFlow" => &mut statement.operating_cash_flow,
        "annualCapitalExpenditure" => &mut statement.capital_expenditure,
        "annualCashDividendsPaid" => &mut statement.dividends_paid,
        _ => return None,
    };
    Some(field)
}

/// Numeric field that Yahoo sends either bare or as `{"raw": .., "fmt": ..}`.
pub fn raw_f64(obj: &Value, key: &str) -> Option<f64> {
    let v = obj.get(key)?;
    v.get("raw")
        .and_then(|r| r.as_f64())
        .or_else(|| v.as_f64())
        .filter(|x| x.is_finite())
}

fn string_field(obj: &Value, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Map a Yahoo `{"error": {"code": "Not Found", ..}}` block to an error.
fn check_error(section: &Value, symbol: &str) -> Result<(), AnalysisError> {
    let Some(error) = section.get("error").filter(|e| !e.is_null()) else {
        return Ok(());
    };
    let code = error.get("code").and_then(|c| c.as_str()).unwrap_or_default();
    let description = error
        .get("description")
        .and_then(|d| d.as_str())
        .unwrap_or_default();
    if code.eq_ignore_ascii_case("Not Found") || description.contains("No data found") {
        Err(AnalysisError::TickerNotFound(symbol.to_string()))
    } else {
        Err(AnalysisError::ApiError(format!("{code}: {description}")))
    }
}

fn first_result<'a>(section: &'a Value, symbol: &str) -> Result<&'a Value, AnalysisError> {
    section
        .get("result")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| AnalysisError::TickerNotFound(symbol.to_string()))
}

/// `quoteSummary` response to a profile.
pub fn parse_quote_summary(symbol: &str, json: &Value) -> Result<CompanyProfile, AnalysisError> {
    let summary = json
        .get("quoteSummary")
        .ok_or_else(|| AnalysisError::InvalidData("missing quoteSummary".to_string()))?;
    check_error(summary, symbol)?;
    let result = first_result(summary, symbol)?;

    let empty = Value::Null;
    let module = |name: &str| result.get(name).unwrap_or(&empty);
    let price = module("price");
    let profile = module("summaryProfile");
    let detail = module("summaryDetail");
    let financial = module("financialData");
    let stats = module("defaultKeyStatistics");

    let current_price = raw_f64(financial, "currentPrice").or_else(|| raw_f64(price, "regularMarketPrice"));
    if current_price.is_none() && price.is_null() && financial.is_null() {
        return Err(AnalysisError::TickerNotFound(symbol.to_string()));
    }

    Ok(CompanyProfile {
        symbol: string_field(price, "symbol").unwrap_or_else(|| symbol.to_uppercase()),
        name: string_field(price, "longName").or_else(|| string_field(price, "shortName")),
        sector: string_field(profile, "sector"),
        industry: string_field(profile, "industry"),
        country: string_field(profile, "country"),
        description: string_field(profile, "longBusinessSummary"),
        financial_currency: string_field(financial, "financialCurrency")
            .or_else(|| string_field(price, "currency")),
        current_price,
        target_price: raw_f64(financial, "targetMeanPrice"),
        beta: raw_f64(detail, "beta").or_else(|| raw_f64(stats, "beta")),
        recommendation: string_field(financial, "recommendationKey"),
        market_cap: raw_f64(price, "marketCap").or_else(|| raw_f64(detail, "marketCap")),
        trailing_eps: raw_f64(stats, "trailingEps"),
        forward_eps: raw_f64(stats, "forwardEps"),
        trailing_pe: raw_f64(detail, "trailingPE"),
        forward_pe: raw_f64(detail, "forwardPE").or_else(|| raw_f64(stats, "forwardPE")),
        price_to_book: raw_f64(stats, "priceToBook"),
        total_cash: raw_f64(financial, "totalCash"),
        total_debt: raw_f64(financial, "totalDebt"),
        ebitda: raw_f64(financial, "ebitda"),
        current_ratio: raw_f64(financial, "currentRatio"),
        dividend_rate: raw_f64(detail, "dividendRate"),
        dividend_yield: raw_f64(detail, "dividendYield"),
        payout_ratio: raw_f64(detail, "payoutRatio"),
        free_cash_flow: raw_f64(financial, "freeCashflow"),
        operating_margin: raw_f64(financial, "operatingMargins"),
        profit_margin: raw_f64(financial, "profitMargins"),
        return_on_equity: raw_f64(financial, "returnOnEquity"),
        earnings_growth: raw_f64(financial, "earningsGrowth"),
    })
}

/// Fundamentals-timeseries response to annual statements, ascending by year.
/// Unknown series and null entries are skipped.
pub fn parse_timeseries(json: &Value) -> Result<Vec<AnnualStatement>, AnalysisError> {
    let results = json
        .get("timeseries")
        .and_then(|t| t.get("result"))
        .and_then(|r| r.as_array())
        .ok_or_else(|| AnalysisError::InvalidData("missing timeseries result".to_string()))?;

    let mut by_year: BTreeMap<i32, AnnualStatement> = BTreeMap::new();
    for series in results {
        let Some(kind) = series
            .get("meta")
            .and_then(|m| m.get("type"))
            .and_then(|t| t.as_array())
            .and_then(|t| t.first())
            .and_then(|t| t.as_str())
        else {
            continue;
        };
        let Some(points) = series.get(kind).and_then(|p| p.as_array()) else {
            continue;
        };
        for point in points.iter().filter(|p| !p.is_null()) {
            let year = point
                .get("asOfDate")
                .and_then(|d| d.as_str())
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
                .map(|d| d.year());
            let value = raw_f64(point, "reportedValue");
            let (Some(year), Some(value)) = (year, value) else {
                continue;
            };
            let statement = by_year.entry(year).or_insert_with(|| AnnualStatement::new(year));
            if let Some(field) = statement_field(statement, kind) {
                *field = Some(value);
            }
        }
    }

    Ok(by_year.into_values().collect())
}

fn timestamp_date(ts: &Value) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts.as_i64()?, 0).map(|dt| dt.date_naive())
}

/// Chart response to daily closes and dividend events, both ascending.
pub fn parse_chart(symbol: &str, json: &Value) -> Result<PriceHistory, AnalysisError> {
    let chart = json
        .get("chart")
        .ok_or_else(|| AnalysisError::InvalidData("missing chart".to_string()))?;
    check_error(chart, symbol)?;
    let result = first_result(chart, symbol)?;

    let timestamps = result
        .get("timestamp")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    let closes = result
        .get("indicators")
        .and_then(|i| i.get("quote"))
        .and_then(|q| q.as_array())
        .and_then(|q| q.first())
        .and_then(|q| q.get("close"))
        .and_then(|c| c.as_array())
        .cloned()
        .unwrap_or_default();

    let mut prices: Vec<PricePoint> = timestamps
        .iter()
        .zip(closes.iter())
        .filter_map(|(ts, close)| {
            Some(PricePoint {
                date: timestamp_date(ts)?,
                close: close.as_f64().filter(|c| c.is_finite() && *c > 0.0)?,
            })
        })
        .collect();
    prices.sort_by_key(|p| p.date);
    prices.dedup_by_key(|p| p.date);

    let mut dividends: Vec<DividendPayment> = result
        .get("events")
        .and_then(|e| e.get("dividends"))
        .and_then(|d| d.as_object())
        .map(|events| {
            events
                .values()
                .filter_map(|event| {
                    Some(DividendPayment {
                        date: timestamp_date(event.get("date")?)?,
                        amount: event.get("amount")?.as_f64()?,
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    dividends.sort_by_key(|d| d.date);

    Ok(PriceHistory { prices, dividends })
}

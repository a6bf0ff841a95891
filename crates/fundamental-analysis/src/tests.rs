#[cfg(test)]
mod engine_tests {
    use crate::derivation::GrowthWindow;
    use crate::red_flags::RedFlagKind;
    use crate::scoring::Verdict;
    use crate::tiers::ComponentStatus;
    use crate::FundamentalAnalysisEngine;
    use analysis_core::{
        AnalysisError, AnnualStatement, CompanyProfile, MarketSnapshot, PriceHistory, PricePoint,
    };
    use chrono::{Duration, NaiveDate};

    fn compounder_profile() -> CompanyProfile {
        CompanyProfile {
            symbol: "CMPD".to_string(),
            name: Some("Compounder Inc.".to_string()),
            sector: Some("Technology".to_string()),
            industry: Some("Software - Infrastructure".to_string()),
            country: Some("United States".to_string()),
            financial_currency: Some("USD".to_string()),
            current_price: Some(150.0),
            target_price: Some(180.0),
            trailing_eps: Some(150.0 / 22.0),
            forward_eps: Some(150.0 / 19.0),
            trailing_pe: Some(22.0),
            forward_pe: Some(19.0),
            market_cap: Some(2.0e12),
            total_cash: Some(6.0e10),
            total_debt: Some(1.0e11),
            ebitda: Some(1.3e11),
            current_ratio: Some(1.8),
            dividend_rate: Some(1.0),
            payout_ratio: Some(0.15),
            free_cash_flow: Some(1.1e11),
            operating_margin: Some(0.30),
            profit_margin: Some(0.25),
            return_on_equity: Some(0.35),
            earnings_growth: Some(0.18),
            ..Default::default()
        }
    }

    fn compounder_statements() -> Vec<AnnualStatement> {
        (0..6)
            .map(|i| {
                let growth = 1.15_f64.powi(i);
                let revenue = 2.0e11 * growth;
                let mut s = AnnualStatement::new(2018 + i);
                s.total_revenue = Some(revenue);
                s.operating_income = Some(revenue * (0.28 + 0.005 * i as f64));
                s.ebit = Some(1.2e11 * growth);
                s.ebitda = Some(1.3e11 * growth);
                s.interest_expense = Some(-3.0e9);
                s.pretax_income = Some(1.18e11 * growth);
                s.tax_provision = Some(1.8e10 * growth);
                s.net_income = Some(5.0e10 * growth);
                s.basic_average_shares = Some(1.6e10 * 0.985_f64.powi(i));
                s.total_debt = Some(1.0e11);
                s.cash = Some(6.0e10);
                s.stockholders_equity = Some(2.0e11);
                s.free_cash_flow = Some(6.0e10 * growth);
                s.dividends_paid = Some(-1.5e10);
                s
            })
            .collect()
    }

    fn rising_prices() -> PriceHistory {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let prices = (0..1095)
            .map(|i| PricePoint {
                date: start + Duration::days(i),
                close: 100.0 + i as f64 * 0.05,
            })
            .collect();
        PriceHistory { prices, dividends: Vec::new() }
    }

    fn compounder() -> MarketSnapshot {
        MarketSnapshot::new(compounder_profile())
            .with_statements(compounder_statements())
            .with_history(rising_prices())
    }

    #[test]
    fn quality_compounder_scores_excellent() {
        let report = FundamentalAnalysisEngine::new().analyze(&compounder()).unwrap();
        let card = &report.scorecard;

        assert_eq!(report.symbol, "CMPD");
        assert!(card.quality.value > 9.0, "quality {}", card.quality.value);
        assert!(card.health.value > 9.0, "health {}", card.health.value);
        assert!(card.valuation.value > 6.0, "valuation {}", card.valuation.value);
        assert!(card.composite >= 8.0, "composite {}", card.composite);
        assert_eq!(card.verdict, Verdict::Excellent);
        assert_eq!(card.geopolitical.penalty, 0.0);
        assert!(report.red_flags.is_empty(), "{:?}", report.red_flags);
        assert!(card.valuation.adjustments.iter().all(|a| a.after >= a.before));
    }

    #[test]
    fn history_is_derived_from_the_snapshot() {
        let report = FundamentalAnalysisEngine::new().analyze(&compounder()).unwrap();
        let h = &report.history;

        assert!(h.available);
        assert_eq!(h.eps_cagr.unwrap().window, GrowthWindow::FiveYear);
        assert!(h.fcf_cagr.unwrap().value > 14.0);
        assert!(h.historical_pe.is_some());
        assert_eq!(h.historical_yield, None);
        assert!(h.ath_distance_pct.unwrap() < 0.0);
        assert!(h.technical.latest_sma_200().is_some());
        assert!(h.technical.latest_rsi().unwrap() > 90.0);
        assert!(!h.currency_caveat);
    }

    #[test]
    fn bad_price_history_degrades_instead_of_failing() {
        let mut snapshot = compounder();
        snapshot.history.prices[10].close = f64::NAN;

        let report = FundamentalAnalysisEngine::new().analyze(&snapshot).unwrap();
        assert!(!report.history.available);
        assert_eq!(report.history.eps_cagr, None);
        assert!(report.scorecard.quality.is_computable());
        assert!(report.narrative.caveats.iter().any(|c| c.contains("Price history unavailable")));
    }

    #[test]
    fn empty_snapshot_scores_zero_everywhere() {
        let snapshot = MarketSnapshot::new(CompanyProfile {
            symbol: "EMPTY".to_string(),
            ..Default::default()
        });
        let report = FundamentalAnalysisEngine::new().analyze(&snapshot).unwrap();
        let card = &report.scorecard;

        for score in [&card.quality, &card.health, &card.valuation, &card.dividends] {
            assert_eq!(score.value, 0.0);
            assert!(!score.is_computable());
        }
        assert_eq!(card.composite, 0.0);
        assert_eq!(card.verdict, Verdict::Poor);
        assert_eq!(card.benchmark, "Default");
        assert!(report.red_flags.is_empty());
    }

    #[test]
    fn statement_order_does_not_matter() {
        let engine = FundamentalAnalysisEngine::new();
        let mut reversed = compounder();
        reversed.statements.reverse();

        let a = engine.analyze(&compounder()).unwrap();
        let b = engine.analyze(&reversed).unwrap();
        assert_eq!(a.scorecard, b.scorecard);
        assert_eq!(a.fundamentals, b.fundamentals);
    }

    #[test]
    fn last_close_stands_in_for_missing_quote() {
        let mut snapshot = compounder();
        snapshot.profile.current_price = None;
        let report = FundamentalAnalysisEngine::new().analyze(&snapshot).unwrap();
        let last = snapshot.history.prices.last().unwrap().close;
        assert_eq!(report.fundamentals.current_price, Some(last));
        assert_eq!(report.history.ath_distance_pct, Some(0.0));
    }

    #[test]
    fn financials_skip_leverage() {
        let mut snapshot = compounder();
        snapshot.profile.sector = Some("Financial Services".to_string());
        let report = FundamentalAnalysisEngine::new().analyze(&snapshot).unwrap();
        let leverage = report.scorecard.health.component("net_debt_to_ebitda").unwrap();
        assert_eq!(leverage.status, ComponentStatus::NotApplicable);
        assert_eq!(report.scorecard.benchmark, "Financials");
    }

    #[test]
    fn distressed_company_raises_flags() {
        let mut snapshot = compounder();
        snapshot.profile.free_cash_flow = Some(-2.0e9);
        snapshot.profile.current_ratio = Some(0.6);
        snapshot.profile.market_cap = Some(1.5e8);
        snapshot.profile.country = Some("Argentina".to_string());

        let report = FundamentalAnalysisEngine::new().analyze(&snapshot).unwrap();
        let kinds: Vec<_> = report.red_flags.iter().map(|f| f.kind).collect();
        assert!(kinds.contains(&RedFlagKind::NegativeFreeCashFlow));
        assert!(kinds.contains(&RedFlagKind::LowCurrentRatio));
        assert!(kinds.contains(&RedFlagKind::MicroCap));
        assert_eq!(report.scorecard.geopolitical.penalty, 3.0);
        assert!(report.scorecard.composite >= 0.0 && report.scorecard.composite <= 10.0);
    }

    #[test]
    fn snapshot_json_with_sparse_fields() {
        let json = r#"{
            "symbol": "util",
            "fetched_at": "2024-01-01T00:00:00Z",
            "profile": { "symbol": "UTIL", "sector": "Utilities", "price_to_book": 1.2 }
        }"#;
        let snapshot: MarketSnapshot = serde_json::from_str(json).unwrap();
        let report = FundamentalAnalysisEngine::new().analyze(&snapshot).unwrap();

        assert_eq!(report.symbol, "UTIL");
        assert!(report.scorecard.valuation.is_computable());
        let out = serde_json::to_string(&report).unwrap();
        assert!(out.contains("\"composite\""));
    }

    #[test]
    fn blank_symbol_is_rejected() {
        let snapshot = MarketSnapshot::new(CompanyProfile::default());
        let err = FundamentalAnalysisEngine::new().analyze(&snapshot).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidData(_)));
    }
}

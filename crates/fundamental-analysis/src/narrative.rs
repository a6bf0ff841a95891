//! Prose summary built from the structured score facts.

use serde::{Deserialize, Serialize};

use crate::derivation::{CompanyFundamentals, GrowthWindow};
use crate::geopolitics::GeoRiskTier;
use crate::history::HistoricalSeries;
use crate::red_flags::{RedFlag, Severity};
use crate::scoring::{ScoreCard, Verdict};
use crate::tiers::{AdjustmentKind, ComponentResult, ComponentStatus, SubScore, TierLabel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvestorProfile {
    /// Strong business at a reasonable price.
    QualityAtDiscount,
    /// Strong business, priced accordingly.
    QualityPremium,
    IncomeInvestor,
    /// Statistically cheap, weak fundamentals.
    DeepValue,
    Speculative,
    Balanced,
}

impl InvestorProfile {
    pub fn classify(card: &ScoreCard, f: &CompanyFundamentals, flags: &[RedFlag]) -> Self {
        let quality = card.quality.value;
        let critical = flags.iter().any(|flag| flag.severity == Severity::Critical);

        if quality >= 7.0 && card.valuation.value >= 6.0 && !critical {
            InvestorProfile::QualityAtDiscount
        } else if quality >= 7.0 && !critical {
            InvestorProfile::QualityPremium
        } else if card.dividends.value >= 7.0 && f.dividend_yield.is_some_and(|y| y >= 3.0) && !critical {
            InvestorProfile::IncomeInvestor
        } else if card.valuation_breakdown.raw >= 7.0 && quality < 5.0 {
            InvestorProfile::DeepValue
        } else if quality < 4.0 || critical {
            InvestorProfile::Speculative
        } else {
            InvestorProfile::Balanced
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            InvestorProfile::QualityAtDiscount => "a quality business trading at an attractive price",
            InvestorProfile::QualityPremium => "a quality business that the market already prices fully",
            InvestorProfile::IncomeInvestor => "a candidate for income-oriented portfolios",
            InvestorProfile::DeepValue => "a deep-value situation where cheapness reflects weak fundamentals",
            InvestorProfile::Speculative => "a speculative position with elevated fundamental risk",
            InvestorProfile::Balanced => "a balanced profile without a dominant strength",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeSection {
    pub title: String,
    /// `None` when the sub-score had no computable inputs.
    pub score: Option<f64>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub verdict: Verdict,
    pub profile: InvestorProfile,
    pub headline: String,
    pub sections: Vec<NarrativeSection>,
    pub caveats: Vec<String>,
}

impl Narrative {
    pub fn generate(
        f: &CompanyFundamentals,
        h: &HistoricalSeries,
        card: &ScoreCard,
        flags: &[RedFlag],
    ) -> Self {
        let profile = InvestorProfile::classify(card, f, flags);
        let name = f.name.as_deref().unwrap_or(&f.symbol);
        let headline = format!(
            "{name} ({}) rates {} at {:.1}/10: {}.",
            f.symbol,
            card.verdict.label(),
            card.composite,
            profile.description()
        );

        let sections = vec![
            section("Quality", &card.quality, quality_extra(h)),
            section("Financial Health", &card.health, None),
            section("Valuation", &card.valuation, valuation_extra(card)),
            section("Dividends", &card.dividends, None),
            geopolitics_section(card),
        ];

        Self {
            verdict: card.verdict,
            profile,
            headline,
            sections,
            caveats: caveats(f, h, card),
        }
    }
}

fn metric_label(metric: &str) -> &str {
    match metric {
        "roe" => "ROE",
        "roic" => "ROIC",
        "operating_margin" => "operating margin",
        "net_margin" => "net margin",
        "eps_cagr" => "EPS CAGR",
        "eps_growth_yoy" => "EPS growth (YoY)",
        "net_debt_to_ebitda" => "net debt/EBITDA",
        "interest_coverage" => "interest coverage",
        "current_ratio" => "current ratio",
        "fcf_cagr" => "FCF CAGR",
        "pe" => "P/E",
        "price_to_fcf" => "P/FCF",
        "price_to_book" => "P/B",
        "analyst_upside" => "analyst upside",
        "vs_historical_pe" => "discount to historical P/E",
        "vs_historical_yield" => "premium to historical yield",
        "dividend_yield" => "dividend yield",
        "payout_ratio" => "payout ratio",
        "net_buybacks" => "net buybacks",
        other => other,
    }
}

fn adjustment_text(kind: AdjustmentKind) -> &'static str {
    match kind {
        AdjustmentKind::NegativeFreeCashFlow => "negative free cash flow",
        AdjustmentKind::ForwardPeDiscount => "forward P/E well below trailing",
        AdjustmentKind::ForwardPePremium => "forward P/E above trailing",
        AdjustmentKind::QualityGate => "quality gate on a weak business",
        AdjustmentKind::YieldBelowHistory => "yield below its historical average",
    }
}

fn join_metrics(score: &SubScore, pick: impl Fn(&ComponentResult) -> bool) -> Option<String> {
    let names: Vec<String> = score
        .components
        .iter()
        .filter(|c| pick(c))
        .map(|c| match c.value {
            Some(v) => format!("{} ({v:.1})", metric_label(&c.metric)),
            None => metric_label(&c.metric).to_string(),
        })
        .collect();
    (!names.is_empty()).then(|| names.join(", "))
}

fn section(title: &str, score: &SubScore, extra: Option<String>) -> NarrativeSection {
    if !score.is_computable() {
        return NarrativeSection {
            title: title.to_string(),
            score: None,
            text: format!("No {} metrics could be computed.", title.to_lowercase()),
        };
    }

    let mut parts = vec![format!("{title} scores {:.1}/10.", score.value)];
    let strong = join_metrics(score, |c| {
        matches!(c.tier, Some(TierLabel::Excellent) | Some(TierLabel::NetCash))
    });
    if let Some(strong) = strong {
        parts.push(format!("Strengths: {strong}."));
    }
    if let Some(weak) = join_metrics(score, |c| c.tier == Some(TierLabel::Weak)) {
        parts.push(format!("Weak spots: {weak}."));
    }
    if let Some(missing) = join_metrics(score, |c| c.status == ComponentStatus::Missing) {
        parts.push(format!("Not available: {missing}."));
    }
    for adj in &score.adjustments {
        parts.push(format!(
            "Adjusted from {:.1} to {:.1} for {}.",
            adj.before,
            adj.after,
            adjustment_text(adj.kind)
        ));
    }
    if let Some(extra) = extra {
        parts.push(extra);
    }

    NarrativeSection {
        title: title.to_string(),
        score: Some(score.value),
        text: parts.join(" "),
    }
}

fn quality_extra(h: &HistoricalSeries) -> Option<String> {
    h.eps_cagr
        .map(|g| format!("EPS compounded at {:.1}% a year ({} window).", g.value, g.window.label()))
}

fn valuation_extra(card: &ScoreCard) -> Option<String> {
    let m = &card.margins_of_safety;
    let mut parts = Vec::new();
    if let Some(v) = m.vs_analyst_target {
        parts.push(format!("{v:+.1}% to the analyst target"));
    }
    if let Some(v) = m.vs_historical_pe {
        parts.push(format!("{v:+.1}% vs historical P/E"));
    }
    if let Some(v) = m.vs_historical_yield {
        parts.push(format!("{v:+.1}% vs historical yield"));
    }
    let mut text = (!parts.is_empty()).then(|| format!("Margins of safety: {}.", parts.join("; ")));
    if let Some(peg) = card.peg {
        let peg_text = format!("PEG {peg:.2}.");
        text = Some(match text {
            Some(t) => format!("{t} {peg_text}"),
            None => peg_text,
        });
    }
    text
}

fn geopolitics_section(card: &ScoreCard) -> NarrativeSection {
    let geo = &card.geopolitical;
    let country = geo.country.as_deref().unwrap_or("an unknown country");
    let text = match geo.tier {
        GeoRiskTier::Safe => format!("Domiciled in {country}; no geopolitical penalty."),
        GeoRiskTier::Caution => format!(
            "Domiciled in {country}, a caution-tier jurisdiction; {:.1} points deducted from the composite.",
            geo.penalty
        ),
        GeoRiskTier::HighRisk => format!(
            "Domiciled in {country}, a high-risk jurisdiction; {:.1} points deducted from the composite.",
            geo.penalty
        ),
        GeoRiskTier::Unclassified => format!(
            "{country} is not on any risk list; {:.1} points deducted from the composite.",
            geo.penalty
        ),
    };
    NarrativeSection {
        title: "Geopolitical Risk".to_string(),
        score: Some(geo.score),
        text,
    }
}

fn caveats(f: &CompanyFundamentals, h: &HistoricalSeries, card: &ScoreCard) -> Vec<String> {
    let mut caveats = Vec::new();
    if !h.available {
        caveats.push("Price history unavailable: historical and technical measures were omitted.".to_string());
    }
    if h.currency_caveat {
        caveats.push(format!(
            "Statements are reported in {}; historical P/E compares them with quote prices without FX adjustment.",
            f.currency.as_deref().unwrap_or("a non-USD currency")
        ));
    }
    if [h.eps_cagr, h.fcf_cagr]
        .iter()
        .flatten()
        .any(|g| g.window == GrowthWindow::ThreeYear)
    {
        caveats.push("Some growth rates use a 3-year window because 5 years of data were not available.".to_string());
    }
    for (title, score) in [
        ("quality", &card.quality),
        ("financial health", &card.health),
        ("valuation", &card.valuation),
        ("dividend", &card.dividends),
    ] {
        if !score.is_computable() {
            caveats.push(format!("No {title} metrics were available; that sub-score is 0 by default."));
        }
    }
    caveats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::SectorContext;
    use crate::red_flags::RedFlagKind;

    fn card_with(quality: f64, valuation: f64, dividends: f64) -> ScoreCard {
        let f = CompanyFundamentals { country: Some("Germany".into()), ..Default::default() };
        let mut card = ScoreCard::compute(&f, &HistoricalSeries::unavailable(), &SectorContext::resolve(None));
        card.quality = SubScore { value: quality, points_possible: 10.0, ..Default::default() };
        card.valuation = SubScore { value: valuation, points_possible: 10.0, ..Default::default() };
        card.valuation_breakdown.raw = valuation;
        card.dividends = SubScore { value: dividends, points_possible: 10.0, ..Default::default() };
        card
    }

    fn critical_flag() -> RedFlag {
        RedFlag {
            kind: RedFlagKind::NegativeFreeCashFlow,
            severity: Severity::Critical,
            message: String::new(),
        }
    }

    #[test]
    fn profiles() {
        let f = CompanyFundamentals::default();
        assert_eq!(InvestorProfile::classify(&card_with(8.0, 7.0, 2.0), &f, &[]), InvestorProfile::QualityAtDiscount);
        assert_eq!(InvestorProfile::classify(&card_with(8.0, 3.0, 2.0), &f, &[]), InvestorProfile::QualityPremium);
        assert_eq!(InvestorProfile::classify(&card_with(4.5, 8.0, 2.0), &f, &[]), InvestorProfile::DeepValue);
        assert_eq!(InvestorProfile::classify(&card_with(3.0, 2.0, 2.0), &f, &[]), InvestorProfile::Speculative);
        assert_eq!(InvestorProfile::classify(&card_with(6.0, 5.0, 5.0), &f, &[]), InvestorProfile::Balanced);

        let income = CompanyFundamentals { dividend_yield: Some(4.2), ..Default::default() };
        assert_eq!(InvestorProfile::classify(&card_with(6.0, 5.0, 8.0), &income, &[]), InvestorProfile::IncomeInvestor);
    }

    #[test]
    fn critical_flags_block_quality_profiles() {
        let f = CompanyFundamentals::default();
        let flags = [critical_flag()];
        assert_eq!(InvestorProfile::classify(&card_with(8.0, 7.0, 2.0), &f, &flags), InvestorProfile::Speculative);
    }

    #[test]
    fn sections_and_caveats() {
        let f = CompanyFundamentals {
            symbol: "SAP".into(),
            name: Some("SAP SE".into()),
            currency: Some("EUR".into()),
            country: Some("Germany".into()),
            roe: Some(30.0),
            ..Default::default()
        };
        let h = HistoricalSeries { available: true, currency_caveat: true, ..Default::default() };
        let card = ScoreCard::compute(&f, &h, &SectorContext::resolve(Some("Technology")));
        let n = Narrative::generate(&f, &h, &card, &[]);

        assert!(n.headline.starts_with("SAP SE (SAP)"));
        assert_eq!(n.sections.len(), 5);
        assert!(n.sections[0].text.contains("ROE (30.0)"));
        assert_eq!(n.sections[1].score, None);
        assert!(n.caveats.iter().any(|c| c.contains("EUR")));
        assert!(!n.caveats.iter().any(|c| c.contains("Price history unavailable")));
    }

    #[test]
    fn missing_history_is_a_caveat() {
        let f = CompanyFundamentals { symbol: "XYZ".into(), ..Default::default() };
        let h = HistoricalSeries::unavailable();
        let card = ScoreCard::compute(&f, &h, &SectorContext::resolve(None));
        let n = Narrative::generate(&f, &h, &card, &[]);
        assert!(n.caveats[0].contains("Price history unavailable"));
        assert!(n.headline.starts_with("XYZ (XYZ)"));
    }
}

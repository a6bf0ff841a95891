//! Sector-relative sub-scores and the weighted composite.
//!
//! Each sub-score is proportional: only computable metrics enter the
//! denominator. Penalties and gates are applied after normalization and are
//! recorded on the sub-score as `Adjustment`s.

use serde::{Deserialize, Serialize};

use crate::benchmarks::{Sector, SectorContext};
use crate::derivation::CompanyFundamentals;
use crate::geopolitics::GeopoliticalRisk;
use crate::history::HistoricalSeries;
use crate::tiers::{
    AdjustmentKind, Direction, ScoreAccumulator, SubScore, Tier, TierLabel, TierTable,
};

pub const QUALITY_WEIGHT: f64 = 0.4;
pub const VALUATION_WEIGHT: f64 = 0.3;
pub const HEALTH_WEIGHT: f64 = 0.2;
pub const DIVIDENDS_WEIGHT: f64 = 0.1;

pub const NEGATIVE_FCF_PENALTY: f64 = 4.0;
pub const YIELD_BELOW_HISTORY_PENALTY: f64 = 2.0;
pub const CURRENT_RATIO_HEALTHY: f64 = 1.5;
/// Margin of safety (percent) vs a historical average that earns points.
pub const HISTORICAL_UNDERVALUATION_PCT: f64 = 15.0;
pub const HISTORICAL_POINTS_EACH: f64 = 5.0;
/// Relative gap between forward and trailing P/E that moves the multiples score.
pub const FORWARD_PE_DIVERGENCE: f64 = 0.10;
pub const NET_BUYBACK_THRESHOLD_PCT: f64 = 1.0;

// Valuation part weights
const MULTIPLES_PART: f64 = 0.4;
const ANALYST_PART: f64 = 0.3;
const HISTORICAL_PART: f64 = 0.3;

// ---------------------------------------------------------------------------
// Quality
// ---------------------------------------------------------------------------

pub fn score_quality(f: &CompanyFundamentals, h: &HistoricalSeries, ctx: &SectorContext) -> SubScore {
    let b = ctx.benchmark;
    let mut acc = ScoreAccumulator::new();

    acc.add("roe", f.roe, 2.5, &TierTable::higher_is_better(b.roe_excellent, b.roe_good));
    acc.add("roic", f.roic, 2.5, &TierTable::higher_is_better(b.roic_excellent, b.roic_good));
    acc.add(
        "operating_margin",
        f.operating_margin,
        2.5,
        &TierTable::higher_is_better(b.operating_margin_excellent, b.operating_margin_good),
    );
    acc.add(
        "net_margin",
        f.net_margin,
        2.0,
        &TierTable::higher_is_better(b.net_margin_excellent, b.net_margin_good),
    );
    acc.add(
        "eps_cagr",
        h.eps_cagr.map(|g| g.value),
        2.0,
        &TierTable::higher_is_better(b.eps_growth_excellent, b.eps_growth_good),
    );
    acc.add(
        "eps_growth_yoy",
        f.eps_growth_yoy,
        1.0,
        &TierTable::binary_above(b.eps_growth_excellent),
    );

    acc.finish()
}

// ---------------------------------------------------------------------------
// Financial health
// ---------------------------------------------------------------------------

pub fn score_health(f: &CompanyFundamentals, h: &HistoricalSeries, ctx: &SectorContext) -> SubScore {
    let b = ctx.benchmark;
    let mut acc = ScoreAccumulator::new();

    if ctx.is(Sector::Financials) {
        acc.not_applicable("net_debt_to_ebitda", 2.5);
    } else {
        match f.net_debt_to_ebitda {
            Some(v) if v < 0.0 => acc.add_classified("net_debt_to_ebitda", v, 2.5, 1.0, TierLabel::NetCash),
            other => acc.add(
                "net_debt_to_ebitda",
                other,
                2.5,
                &TierTable::lower_is_better(b.debt_ebitda_good, b.debt_ebitda_ok),
            ),
        }
    }

    acc.add(
        "interest_coverage",
        f.interest_coverage,
        2.5,
        &TierTable::higher_is_better(b.interest_coverage_good, b.interest_coverage_ok),
    );
    acc.add(
        "current_ratio",
        f.current_ratio,
        2.5,
        &TierTable::binary_above(CURRENT_RATIO_HEALTHY),
    );
    acc.add(
        "fcf_cagr",
        h.fcf_cagr.map(|g| g.value),
        2.0,
        &TierTable::higher_is_better(b.fcf_growth_excellent, b.fcf_growth_good),
    );

    let mut score = acc.finish();
    if f.free_cash_flow.is_some_and(|fcf| fcf < 0.0) {
        score.apply_penalty(AdjustmentKind::NegativeFreeCashFlow, NEGATIVE_FCF_PENALTY);
    }
    score
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

/// Percentage upside implied by three reference points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarginsOfSafety {
    /// Analyst target vs current price.
    pub vs_analyst_target: Option<f64>,
    /// Historical average P/E vs current P/E.
    pub vs_historical_pe: Option<f64>,
    /// Current yield vs historical average yield.
    pub vs_historical_yield: Option<f64>,
}

impl MarginsOfSafety {
    pub fn compute(f: &CompanyFundamentals, h: &HistoricalSeries) -> Self {
        let vs_historical_pe = match (h.historical_pe, f.trailing_pe) {
            (Some(hist), Some(pe)) if hist > 0.0 && pe > 0.0 => Some((hist / pe - 1.0) * 100.0),
            _ => None,
        };
        let vs_historical_yield = match (f.dividend_yield, h.historical_yield) {
            (Some(current), Some(hist)) if hist > 0.0 && current >= 0.0 => {
                Some((current / hist - 1.0) * 100.0)
            }
            _ => None,
        };
        Self {
            vs_analyst_target: f.analyst_upside_pct(),
            vs_historical_pe,
            vs_historical_yield,
        }
    }
}

/// The three valuation parts before they are blended and gated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationBreakdown {
    pub multiples: SubScore,
    pub analyst: SubScore,
    pub historical: SubScore,
    /// Weighted blend of the computable parts, before the quality gate.
    pub raw: f64,
}

fn analyst_target_table() -> TierTable {
    TierTable::new(
        Direction::HigherIsBetter,
        vec![
            Tier { threshold: 25.0, credit: 1.0, label: TierLabel::Excellent },
            Tier { threshold: 15.0, credit: 0.8, label: TierLabel::Good },
            Tier { threshold: 5.0, credit: 0.5, label: TierLabel::Fair },
        ],
    )
}

/// P/E, P/FCF and P/B against sector thresholds, with the forward-P/E nudge.
pub fn score_multiples(f: &CompanyFundamentals, ctx: &SectorContext) -> SubScore {
    let b = ctx.benchmark;
    let mut acc = ScoreAccumulator::new();
    let real_estate = ctx.is(Sector::RealEstate);

    if real_estate {
        // Earnings are distorted by depreciation; cash flow carries the weight.
        acc.not_applicable("pe", 4.0);
        acc.add("price_to_fcf", f.price_to_fcf, 8.0, &TierTable::lower_is_better(16.0, 22.0));
    } else {
        acc.add("pe", f.trailing_pe, 4.0, &TierTable::lower_is_better(b.pe_cheap, b.pe_fair));
        acc.add("price_to_fcf", f.price_to_fcf, 3.0, &TierTable::lower_is_better(20.0, 30.0));
    }

    if ctx.book_value_meaningful() {
        acc.add("price_to_book", f.price_to_book, 3.0, &TierTable::lower_is_better(b.pb_cheap, b.pb_fair));
    } else {
        acc.not_applicable("price_to_book", 3.0);
    }

    let mut score = acc.finish();
    if score.is_computable() && !real_estate {
        if let (Some(forward), Some(trailing)) = (f.forward_pe, f.trailing_pe) {
            if forward > 0.0 && trailing > 0.0 {
                if forward < trailing * (1.0 - FORWARD_PE_DIVERGENCE) {
                    score.apply_bonus(AdjustmentKind::ForwardPeDiscount, 1.0);
                } else if forward > trailing * (1.0 + FORWARD_PE_DIVERGENCE) {
                    score.apply_penalty(AdjustmentKind::ForwardPePremium, 1.0);
                }
            }
        }
    }
    score
}

/// 10 / 8 / 5 / 0 on analyst upside.
pub fn score_analyst_target(margins: &MarginsOfSafety) -> SubScore {
    let mut acc = ScoreAccumulator::new();
    acc.add("analyst_upside", margins.vs_analyst_target, 10.0, &analyst_target_table());
    acc.finish()
}

/// Up to 5 points for each historical reference the stock trades >15 % below,
/// capped at 10. Not rescaled: a single available reference tops out at 5.
pub fn score_historical(margins: &MarginsOfSafety) -> SubScore {
    let table = TierTable::binary_above(HISTORICAL_UNDERVALUATION_PCT);
    let mut acc = ScoreAccumulator::new();
    acc.add("vs_historical_pe", margins.vs_historical_pe, HISTORICAL_POINTS_EACH, &table);
    acc.add("vs_historical_yield", margins.vs_historical_yield, HISTORICAL_POINTS_EACH, &table);
    let mut score = acc.finish();
    score.value = score.points_earned.min(10.0);
    score
}

/// Multiplier applied to the valuation score for weak businesses.
pub fn quality_gate_factor(quality: f64) -> f64 {
    if quality < 3.0 {
        0.5
    } else if quality < 5.0 {
        0.75
    } else {
        1.0
    }
}

pub fn score_valuation(
    f: &CompanyFundamentals,
    margins: &MarginsOfSafety,
    ctx: &SectorContext,
    quality: &SubScore,
) -> (SubScore, ValuationBreakdown) {
    let multiples = score_multiples(f, ctx);
    let analyst = score_analyst_target(margins);
    let historical = score_historical(margins);

    let parts = [
        (&multiples, MULTIPLES_PART),
        (&analyst, ANALYST_PART),
        (&historical, HISTORICAL_PART),
    ];
    let (weighted, total_weight) = parts
        .iter()
        .filter(|(part, _)| part.is_computable())
        .fold((0.0, 0.0), |(sum, w), (part, weight)| (sum + part.value * weight, w + weight));

    let raw = if total_weight > 0.0 { (weighted / total_weight).clamp(0.0, 10.0) } else { 0.0 };

    let mut score = SubScore {
        value: raw,
        points_earned: weighted,
        points_possible: total_weight * 10.0,
        components: parts.iter().flat_map(|(p, _)| p.components.clone()).collect(),
        adjustments: multiples.adjustments.clone(),
    };

    // An empty quality score counts as 0 and gates at the lowest factor.
    if score.is_computable() {
        let factor = quality_gate_factor(quality.value);
        if factor < 1.0 {
            score.apply_factor(AdjustmentKind::QualityGate, factor);
        }
    }

    let breakdown = ValuationBreakdown { multiples, analyst, historical, raw };
    (score, breakdown)
}

// ---------------------------------------------------------------------------
// Dividends
// ---------------------------------------------------------------------------

pub fn score_dividends(f: &CompanyFundamentals, h: &HistoricalSeries, ctx: &SectorContext) -> SubScore {
    let b = ctx.benchmark;
    let mut acc = ScoreAccumulator::new();

    acc.add("dividend_yield", f.dividend_yield, 5.0, &TierTable::higher_is_better(3.5, 2.0));
    acc.add(
        "payout_ratio",
        f.payout_ratio,
        5.0,
        &TierTable::lower_is_better(b.payout_good, b.payout_ok),
    );
    acc.add(
        "net_buybacks",
        f.net_buyback_pct,
        2.0,
        &TierTable::binary_above(NET_BUYBACK_THRESHOLD_PCT),
    );

    let mut score = acc.finish();
    if let (Some(current), Some(hist)) = (f.dividend_yield, h.historical_yield) {
        if current < hist {
            score.apply_penalty(AdjustmentKind::YieldBelowHistory, YIELD_BELOW_HISTORY_PENALTY);
        }
    }
    score
}

// ---------------------------------------------------------------------------
// Composite
// ---------------------------------------------------------------------------

/// `0.4 Q + 0.3 V + 0.2 H + 0.1 D - geo_penalty`, clamped to `[0, 10]`.
pub fn composite_score(quality: f64, valuation: f64, health: f64, dividends: f64, geo_penalty: f64) -> f64 {
    let weighted = QUALITY_WEIGHT * quality
        + VALUATION_WEIGHT * valuation
        + HEALTH_WEIGHT * health
        + DIVIDENDS_WEIGHT * dividends;
    (weighted - geo_penalty).clamp(0.0, 10.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Excellent,
    Good,
    Fair,
    Weak,
    Poor,
}

impl Verdict {
    pub fn from_composite(score: f64) -> Self {
        match score {
            s if s >= 8.0 => Verdict::Excellent,
            s if s >= 6.5 => Verdict::Good,
            s if s >= 5.0 => Verdict::Fair,
            s if s >= 3.5 => Verdict::Weak,
            _ => Verdict::Poor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Excellent => "Excellent",
            Verdict::Good => "Good",
            Verdict::Fair => "Fair",
            Verdict::Weak => "Weak",
            Verdict::Poor => "Poor",
        }
    }
}

/// All scores for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub sector: Option<Sector>,
    pub benchmark: String,
    pub quality: SubScore,
    pub health: SubScore,
    pub valuation: SubScore,
    pub valuation_breakdown: ValuationBreakdown,
    pub dividends: SubScore,
    pub geopolitical: GeopoliticalRisk,
    pub margins_of_safety: MarginsOfSafety,
    pub peg: Option<f64>,
    pub composite: f64,
    pub verdict: Verdict,
}

impl ScoreCard {
    pub fn compute(f: &CompanyFundamentals, h: &HistoricalSeries, ctx: &SectorContext) -> Self {
        let quality = score_quality(f, h, ctx);
        let health = score_health(f, h, ctx);
        let margins_of_safety = MarginsOfSafety::compute(f, h);
        let (valuation, valuation_breakdown) = score_valuation(f, &margins_of_safety, ctx, &quality);
        let dividends = score_dividends(f, h, ctx);
        let geopolitical = GeopoliticalRisk::assess(f.country.as_deref());

        let composite = composite_score(
            quality.value,
            valuation.value,
            health.value,
            dividends.value,
            geopolitical.penalty,
        );

        Self {
            sector: ctx.sector,
            benchmark: ctx.benchmark.name.to_string(),
            quality,
            health,
            valuation,
            valuation_breakdown,
            dividends,
            geopolitical,
            margins_of_safety,
            peg: f.peg(),
            composite,
            verdict: Verdict::from_composite(composite),
        }
    }
}

//! Ordered tier tables and the proportional score accumulator.
//!
//! A tier table is evaluated top-down; the first satisfied tier wins. The
//! accumulator only counts metrics that are actually present: a missing
//! metric adds to neither the points earned nor the points possible.

use serde::{Deserialize, Serialize};

/// Share of a component's weight awarded for the second tier.
pub const PARTIAL_CREDIT: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TierLabel {
    Excellent,
    Good,
    Fair,
    Weak,
    /// Net cash position, scored ahead of any leverage tier.
    NetCash,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub threshold: f64,
    /// Fraction of the component weight awarded, in `[0, 1]`.
    pub credit: f64,
    pub label: TierLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierTable {
    pub direction: Direction,
    pub tiers: Vec<Tier>,
}

impl TierTable {
    pub fn new(direction: Direction, tiers: Vec<Tier>) -> Self {
        Self { direction, tiers }
    }

    /// Full credit above `excellent`, partial above `good`.
    pub fn higher_is_better(excellent: f64, good: f64) -> Self {
        Self::new(
            Direction::HigherIsBetter,
            vec![
                Tier { threshold: excellent, credit: 1.0, label: TierLabel::Excellent },
                Tier { threshold: good, credit: PARTIAL_CREDIT, label: TierLabel::Good },
            ],
        )
    }

    /// Full credit below `excellent`, partial below `good`.
    pub fn lower_is_better(excellent: f64, good: f64) -> Self {
        Self::new(
            Direction::LowerIsBetter,
            vec![
                Tier { threshold: excellent, credit: 1.0, label: TierLabel::Excellent },
                Tier { threshold: good, credit: PARTIAL_CREDIT, label: TierLabel::Good },
            ],
        )
    }

    /// All-or-nothing above `threshold`.
    pub fn binary_above(threshold: f64) -> Self {
        Self::new(
            Direction::HigherIsBetter,
            vec![Tier { threshold, credit: 1.0, label: TierLabel::Excellent }],
        )
    }

    fn satisfies(&self, value: f64, threshold: f64) -> bool {
        match self.direction {
            Direction::HigherIsBetter => value > threshold,
            Direction::LowerIsBetter => value < threshold,
        }
    }

    /// First satisfied tier, if any.
    pub fn classify(&self, value: f64) -> Option<&Tier> {
        self.tiers.iter().find(|t| self.satisfies(value, t.threshold))
    }

    /// `(credit, label)`; `(0.0, Weak)` when no tier is satisfied.
    pub fn evaluate(&self, value: f64) -> (f64, TierLabel) {
        self.classify(value)
            .map(|t| (t.credit, t.label))
            .unwrap_or((0.0, TierLabel::Weak))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentStatus {
    Scored,
    /// Input not available; excluded from numerator and denominator.
    Missing,
    /// Metric does not apply to this sector.
    NotApplicable,
}

/// One metric's contribution to a sub-score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentResult {
    pub metric: String,
    pub value: Option<f64>,
    pub weight: f64,
    pub earned: Option<f64>,
    pub tier: Option<TierLabel>,
    pub status: ComponentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdjustmentKind {
    NegativeFreeCashFlow,
    ForwardPeDiscount,
    ForwardPePremium,
    QualityGate,
    YieldBelowHistory,
}

/// Post-normalization change applied to a sub-score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub kind: AdjustmentKind,
    pub before: f64,
    pub after: f64,
}

/// A 0-10 sub-score plus the facts that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScore {
    pub value: f64,
    pub points_earned: f64,
    pub points_possible: f64,
    pub components: Vec<ComponentResult>,
    pub adjustments: Vec<Adjustment>,
}

impl SubScore {
    /// False when no contributing metric was available, in which case
    /// `value` is 0 by convention rather than because the company scored badly.
    pub fn is_computable(&self) -> bool {
        self.points_possible > 0.0
    }

    fn record(&mut self, kind: AdjustmentKind, after: f64) {
        let after = after.clamp(0.0, 10.0);
        self.adjustments.push(Adjustment { kind, before: self.value, after });
        self.value = after;
    }

    /// Subtract a flat penalty, floored at 0.
    pub fn apply_penalty(&mut self, kind: AdjustmentKind, penalty: f64) {
        self.record(kind, self.value - penalty);
    }

    /// Add a flat bonus, capped at 10.
    pub fn apply_bonus(&mut self, kind: AdjustmentKind, bonus: f64) {
        self.record(kind, self.value + bonus);
    }

    pub fn apply_factor(&mut self, kind: AdjustmentKind, factor: f64) {
        self.record(kind, self.value * factor);
    }

    pub fn component(&self, metric: &str) -> Option<&ComponentResult> {
        self.components.iter().find(|c| c.metric == metric)
    }

    pub fn has_adjustment(&self, kind: AdjustmentKind) -> bool {
        self.adjustments.iter().any(|a| a.kind == kind)
    }
}

/// Accumulates `points_earned` / `points_possible` over available metrics.
#[derive(Debug, Default)]
pub struct ScoreAccumulator {
    earned: f64,
    possible: f64,
    components: Vec<ComponentResult>,
}

impl ScoreAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score `value` against `table`. Missing or non-finite values are recorded
    /// but contribute nothing.
    pub fn add(&mut self, metric: &str, value: Option<f64>, weight: f64, table: &TierTable) {
        match value.filter(|v| v.is_finite()) {
            Some(v) => {
                let (credit, label) = table.evaluate(v);
                self.push_scored(metric, v, weight, credit, label);
            }
            None => self.push_missing(metric, weight, ComponentStatus::Missing),
        }
    }

    /// Award a fixed credit for a value the caller has already classified.
    pub fn add_classified(&mut self, metric: &str, value: f64, weight: f64, credit: f64, label: TierLabel) {
        self.push_scored(metric, value, weight, credit, label);
    }

    pub fn not_applicable(&mut self, metric: &str, weight: f64) {
        self.push_missing(metric, weight, ComponentStatus::NotApplicable);
    }

    fn push_scored(&mut self, metric: &str, value: f64, weight: f64, credit: f64, label: TierLabel) {
        let earned = weight * credit;
        self.earned += earned;
        self.possible += weight;
        self.components.push(ComponentResult {
            metric: metric.to_string(),
            value: Some(value),
            weight,
            earned: Some(earned),
            tier: Some(label),
            status: ComponentStatus::Scored,
        });
    }

    fn push_missing(&mut self, metric: &str, weight: f64, status: ComponentStatus) {
        self.components.push(ComponentResult {
            metric: metric.to_string(),
            value: None,
            weight,
            earned: None,
            tier: None,
            status,
        });
    }

    /// `earned / possible * 10`, or 0 when nothing was computable.
    pub fn finish(self) -> SubScore {
        let value = if self.possible > 0.0 {
            (self.earned / self.possible * 10.0).clamp(0.0, 10.0)
        } else {
            0.0
        };
        SubScore {
            value,
            points_earned: self.earned,
            points_possible: self.possible,
            components: self.components,
            adjustments: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn first_satisfied_tier_wins() {
        let table = TierTable::higher_is_better(20.0, 10.0);
        assert_eq!(table.evaluate(25.0), (1.0, TierLabel::Excellent));
        assert_eq!(table.evaluate(15.0), (PARTIAL_CREDIT, TierLabel::Good));
        assert_eq!(table.evaluate(5.0), (0.0, TierLabel::Weak));
        // thresholds are strict
        assert_eq!(table.evaluate(20.0), (PARTIAL_CREDIT, TierLabel::Good));
        assert_eq!(table.evaluate(10.0), (0.0, TierLabel::Weak));
    }

    #[test]
    fn lower_is_better_tiers() {
        let table = TierTable::lower_is_better(20.0, 30.0);
        assert_eq!(table.evaluate(12.0).1, TierLabel::Excellent);
        assert_eq!(table.evaluate(25.0).1, TierLabel::Good);
        assert_eq!(table.evaluate(30.0).1, TierLabel::Weak);
    }

    #[test]
    fn missing_metrics_are_excluded_from_both_sides() {
        let table = TierTable::higher_is_better(20.0, 10.0);
        let mut acc = ScoreAccumulator::new();
        acc.add("roe", Some(25.0), 2.5, &table);
        acc.add("roic", None, 2.5, &table);
        acc.add("margin", Some(f64::NAN), 2.0, &table);
        let score = acc.finish();

        assert_relative_eq!(score.points_possible, 2.5);
        assert_relative_eq!(score.value, 10.0);
        assert_eq!(score.component("roic").unwrap().status, ComponentStatus::Missing);
        assert_eq!(score.components.len(), 3);
    }

    #[test]
    fn nothing_computable_scores_zero() {
        let table = TierTable::binary_above(1.5);
        let mut acc = ScoreAccumulator::new();
        acc.add("current_ratio", None, 2.5, &table);
        acc.not_applicable("net_debt_to_ebitda", 2.5);
        let score = acc.finish();

        assert_eq!(score.value, 0.0);
        assert!(!score.is_computable());
    }

    #[test]
    fn poor_but_computed_score_is_computable() {
        let table = TierTable::binary_above(1.5);
        let mut acc = ScoreAccumulator::new();
        acc.add("current_ratio", Some(0.8), 2.5, &table);
        let score = acc.finish();

        assert_eq!(score.value, 0.0);
        assert!(score.is_computable());
    }

    #[test]
    fn adjustments_are_clamped_and_recorded() {
        let mut score = SubScore { value: 3.0, points_possible: 1.0, ..Default::default() };
        score.apply_penalty(AdjustmentKind::NegativeFreeCashFlow, 4.0);
        assert_eq!(score.value, 0.0);
        assert_eq!(score.adjustments[0].before, 3.0);

        score.value = 9.5;
        score.apply_bonus(AdjustmentKind::ForwardPeDiscount, 1.0);
        assert_eq!(score.value, 10.0);
        assert!(score.has_adjustment(AdjustmentKind::ForwardPeDiscount));
    }
}

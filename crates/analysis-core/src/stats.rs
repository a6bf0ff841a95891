//! Small numeric helpers shared by the derivation crates.

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// `numerator / denominator`, `None` when the denominator is zero or either
/// side is not finite.
pub fn safe_div(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || !numerator.is_finite() || !denominator.is_finite() {
        return None;
    }
    let q = numerator / denominator;
    q.is_finite().then_some(q)
}

/// Percentage change from `reference` to `value`.
pub fn pct_change(value: f64, reference: f64) -> Option<f64> {
    safe_div(value - reference, reference).map(|r| r * 100.0)
}

use analysis_core::{stats, PricePoint};

/// Additive guard in the RSI denominator so a window without losses does not
/// divide by zero.
pub const RSI_EPSILON: f64 = 1e-10;

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    let mut sum: f64 = data[..period].iter().sum();
    result.push(sum / period as f64);
    for i in period..data.len() {
        sum += data[i] - data[i - period];
        result.push(sum / period as f64);
    }
    result
}

/// SMA aligned with the input: `None` until `period` samples are available.
pub fn rolling_sma(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let values = sma(data, period);
    let lead = data.len() - values.len();
    std::iter::repeat(None)
        .take(lead)
        .chain(values.into_iter().map(Some))
        .collect()
}

/// Relative Strength Index using plain rolling means of gains and losses.
///
/// Aligned with the input. The first defined value sits at index `period`
/// (it needs `period` price deltas).
pub fn rolling_rsi(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; data.len()];
    if period == 0 || data.len() < period + 1 {
        return out;
    }

    let gains: Vec<f64> = data.windows(2).map(|w| (w[1] - w[0]).max(0.0)).collect();
    let losses: Vec<f64> = data.windows(2).map(|w| (w[0] - w[1]).max(0.0)).collect();

    let avg_gain = sma(&gains, period);
    let avg_loss = sma(&losses, period);

    for (i, (gain, loss)) in avg_gain.iter().zip(avg_loss.iter()).enumerate() {
        let rs = gain / (loss + RSI_EPSILON);
        out[i + period] = Some(100.0 - 100.0 / (1.0 + rs));
    }
    out
}

/// Highest close in the series.
pub fn all_time_high(prices: &[PricePoint]) -> Option<f64> {
    prices
        .iter()
        .map(|p| p.close)
        .filter(|c| c.is_finite())
        .reduce(f64::max)
}

/// Percent distance of `price` below (negative) or at the high.
pub fn distance_from_high(price: f64, high: f64) -> Option<f64> {
    if high > 0.0 {
        stats::pct_change(price, high)
    } else {
        None
    }
}

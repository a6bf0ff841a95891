#[cfg(test)]
mod tests {
    use super::super::indicators::*;
    use analysis_core::PricePoint;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    // Helper function to create sample price data
    fn sample_prices() -> Vec<f64> {
        vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ]
    }

    fn points(closes: &[f64]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: start + Duration::days(i as i64),
                close,
            })
            .collect()
    }

    #[test]
    fn test_sma_basic() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&data, 3);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 2.0).abs() < 0.001); // (1+2+3)/3 = 2
        assert!((result[1] - 3.0).abs() < 0.001); // (2+3+4)/3 = 3
        assert!((result[2] - 4.0).abs() < 0.001); // (3+4+5)/3 = 4
    }

    #[test]
    fn test_sma_insufficient_data() {
        let data = vec![1.0, 2.0];
        let result = sma(&data, 5);

        assert_eq!(result.len(), 0);
    }

    #[test]
    fn test_sma_real_prices() {
        let prices = sample_prices();
        let result = sma(&prices, 5);

        assert!(!result.is_empty());
        let expected_first = (44.34 + 44.09 + 44.15 + 43.61 + 44.33) / 5.0;
        assert!((result[0] - expected_first).abs() < 0.01);
        let expected_last = (46.03 + 46.41 + 46.22 + 45.64 + 46.00) / 5.0;
        assert!((result.last().unwrap() - expected_last).abs() < 0.01);
    }

    #[test]
    fn test_rolling_sma_alignment() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        let result = rolling_sma(&data, 3);

        assert_eq!(result.len(), 4);
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_relative_eq!(result[2].unwrap(), 2.0);
        assert_relative_eq!(result[3].unwrap(), 3.0);

        let short = rolling_sma(&data, 10);
        assert!(short.iter().all(|v| v.is_none()));
    }

    #[test]
    fn test_rsi_bounds() {
        let prices = sample_prices();
        let result = rolling_rsi(&prices, 14);

        assert_eq!(result.len(), prices.len());
        let defined: Vec<f64> = result.iter().flatten().copied().collect();
        assert_eq!(defined.len(), prices.len() - 14);
        for value in defined {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let data = vec![1.0, 2.0, 3.0];
        let result = rolling_rsi(&data, 14);

        assert!(result.iter().all(|v| v.is_none()));
    }

    #[test]
    fn test_rsi_without_losses_stays_finite() {
        let uptrend: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let result = rolling_rsi(&uptrend, 14);

        let last = result.last().unwrap().unwrap();
        assert!(last.is_finite());
        assert!(last > 99.99);
    }

    #[test]
    fn test_rsi_flat_prices() {
        let flat = vec![50.0; 20];
        let result = rolling_rsi(&flat, 14);

        // No gains and no losses: 0 / (0 + eps) = 0 -> RSI 0
        assert_relative_eq!(result.last().unwrap().unwrap(), 0.0);
    }

    #[test]
    fn test_rsi_known_value() {
        // Alternating +2 / -1 deltas over the window: avg gain 1.0, avg loss 0.5
        let mut data = vec![100.0];
        for i in 0..14 {
            let last = *data.last().unwrap();
            data.push(if i % 2 == 0 { last + 2.0 } else { last - 1.0 });
        }
        let result = rolling_rsi(&data, 14);
        let expected = 100.0 - 100.0 / (1.0 + 1.0 / (0.5 + RSI_EPSILON));
        assert_relative_eq!(result[14].unwrap(), expected, epsilon = 1e-9);
        assert_relative_eq!(result[14].unwrap(), 66.6667, epsilon = 1e-3);
    }

    #[test]
    fn test_all_time_high() {
        let series = points(&[10.0, 35.0, 20.0, 30.0]);
        assert_eq!(all_time_high(&series), Some(35.0));
        assert_eq!(all_time_high(&[]), None);
    }

    #[test]
    fn test_distance_from_high() {
        assert_relative_eq!(distance_from_high(75.0, 100.0).unwrap(), -25.0);
        assert_relative_eq!(distance_from_high(100.0, 100.0).unwrap(), 0.0);
        assert_eq!(distance_from_high(10.0, 0.0), None);
    }
}

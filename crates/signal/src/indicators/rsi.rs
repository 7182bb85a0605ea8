/// RSI (Relative Strength Index) over a slice of close prices, oldest first.
///
/// Uses Wilder's smoothed moving average (same as TradingView / standard RSI).
/// Returns `None` until at least `period + 1` values are available.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period < 2 || closes.len() < period + 1 {
        return None;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let initial = &changes[..period];

    // Seed with simple averages over the first `period` changes
    let mut avg_gain = initial.iter().filter(|&&c| c > 0.0).sum::<f64>() / period as f64;
    let mut avg_loss =
        initial.iter().filter(|&&c| c < 0.0).map(|c| c.abs()).sum::<f64>() / period as f64;

    // Wilder smoothing over the remaining changes
    for &change in &changes[period..] {
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_none_when_insufficient_data() {
        // Need at least period+1 = 15 values
        let prices = vec![100.0; 14];
        assert!(rsi(&prices, 14).is_none());
    }

    #[test]
    fn returns_some_with_sufficient_data() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        assert!(rsi(&prices, 14).is_some());
    }

    #[test]
    fn all_gains_returns_100() {
        // Strictly increasing prices → RSI = 100
        let prices = vec![10.0, 11.0, 12.0, 13.0, 14.0];
        let value = rsi(&prices, 3).unwrap();
        assert!((value - 100.0).abs() < 1e-6, "Expected ~100, got {value}");
    }

    #[test]
    fn all_losses_returns_0() {
        let prices = vec![14.0, 13.0, 12.0, 11.0, 10.0];
        let value = rsi(&prices, 3).unwrap();
        assert!((value - 0.0).abs() < 1e-6, "Expected ~0, got {value}");
    }

    #[test]
    fn stays_in_range_on_mixed_series() {
        let prices = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.15, 43.61, 44.33, 44.83, 45.10,
            45.15, 44.34, 44.09,
        ];
        let v = rsi(&prices, 14).unwrap();
        assert!((0.0..=100.0).contains(&v), "RSI out of range: {v}");
    }

    #[test]
    fn degenerate_period_returns_none() {
        let prices = vec![1.0, 2.0, 3.0];
        assert!(rsi(&prices, 1).is_none());
    }
}

/// MACD histogram over a slice of close prices, oldest first.
///
/// Histogram = MACD line − signal line, where
/// MACD line = EMA(fast) − EMA(slow) and signal = EMA(MACD line, signal).
/// A positive histogram means momentum is accelerating upward.
/// Returns `None` with fewer than `slow + signal` prices or nonsensical
/// periods (`fast` must be below `slow`).
pub fn macd_histogram(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Option<f64> {
    if fast == 0 || signal == 0 || fast >= slow {
        return None;
    }
    if closes.len() < slow + signal {
        return None;
    }

    // MACD line for every bar from the first where the slow EMA is defined
    let macd_line: Vec<f64> = (slow - 1..closes.len())
        .map(|i| {
            let slice = &closes[..=i];
            ema(slice, fast) - ema(slice, slow)
        })
        .collect();

    let latest = *macd_line.last()?;
    let signal_line = ema(&macd_line, signal);
    Some(latest - signal_line)
}

/// Exponential Moving Average of `data`, seeded with the SMA of the first
/// `period` values.
fn ema(data: &[f64], period: usize) -> f64 {
    if data.is_empty() || period == 0 {
        return 0.0;
    }
    let k = 2.0 / (period as f64 + 1.0);

    let seed_len = period.min(data.len());
    let mut value: f64 = data[..seed_len].iter().sum::<f64>() / seed_len as f64;

    for &price in &data[seed_len..] {
        value = price * k + value * (1.0 - k);
    }
    value
}

use tracing::{debug, info};

use common::{MarketSnapshot, SignalRecord, SignalSet};

use crate::Rule;

/// Turns one market snapshot into one signal set.
///
/// `compute` is pure: every timestamp in the output comes from
/// `snapshot.fetched_at`, so identical snapshots serialize to identical JSON.
/// The snapshot is consumed by value; nothing is retained between cycles.
pub struct SignalEngine {
    rule: Box<dyn Rule>,
}

impl SignalEngine {
    pub fn new(rule: Box<dyn Rule>) -> Self {
        info!(rule = %rule.name(), "Signal engine ready");
        Self { rule }
    }

    pub fn compute(&self, snapshot: MarketSnapshot) -> SignalSet {
        let mut records = Vec::with_capacity(snapshot.series.len());

        for (symbol, candles) in &snapshot.series {
            let Some(last) = candles.last() else {
                debug!(symbol = %symbol, "Empty series, skipping");
                continue;
            };

            match self.rule.evaluate(symbol, candles) {
                Some(decision) => {
                    records.push(SignalRecord::new(
                        symbol,
                        decision.action,
                        decision.confidence,
                        last.close,
                        snapshot.fetched_at,
                        decision.rationale,
                    ));
                }
                None => {
                    debug!(
                        symbol = %symbol,
                        candles = candles.len(),
                        "Insufficient history for rule, excluding symbol"
                    );
                }
            }
        }

        SignalSet::new(snapshot.fetched_at, records)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{TimeZone, Utc};

    use common::{Candle, MarketSnapshot, SignalAction, SCHEMA_VERSION};

    use super::*;
    use crate::config::RuleConfig;
    use crate::rules::build_rule;

    fn engine() -> SignalEngine {
        let rule = build_rule(&RuleConfig {
            rule_type: "momentum".to_string(),
            name: "test".to_string(),
            params: HashMap::new(),
        })
        .unwrap();
        SignalEngine::new(rule)
    }

    fn series(prices: &[f64]) -> Vec<Candle> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| Candle {
                open_time: Utc.timestamp_opt(1_700_000_000 + i as i64 * 60, 0).unwrap(),
                open: p,
                high: p,
                low: p,
                close: p,
                volume: 1.0,
            })
            .collect()
    }

    fn snapshot(entries: &[(&str, Vec<f64>)]) -> MarketSnapshot {
        let mut snap = MarketSnapshot::new(Utc.timestamp_opt(1_700_100_000, 0).unwrap());
        for (symbol, prices) in entries {
            snap.series.insert(symbol.to_string(), series(prices));
        }
        snap
    }

    #[test]
    fn symbol_with_insufficient_history_is_excluded() {
        let rising: Vec<f64> = (0..80).map(|i| 100.0 + i as f64).collect();
        let snap = snapshot(&[("AAPL", rising), ("MSFT", vec![42.0])]);

        let set = engine().compute(snap);

        assert_eq!(set.signals.len(), 1);
        let record = set.record("AAPL").unwrap();
        assert_eq!(record.action, SignalAction::Buy);
        assert!(set.record("MSFT").is_none());
    }

    #[test]
    fn compute_is_deterministic() {
        let rising: Vec<f64> = (0..80).map(|i| 100.0 + (i as f64 * 1.3).sin() + i as f64).collect();
        let falling: Vec<f64> = (0..80).map(|i| 500.0 - i as f64 * 0.7).collect();
        let snap = snapshot(&[("BTCUSDT", rising), ("ETHUSDT", falling)]);

        let e = engine();
        let a = serde_json::to_vec(&e.compute(snap.clone())).unwrap();
        let b = serde_json::to_vec(&e.compute(snap)).unwrap();
        assert_eq!(a, b, "Identical snapshots must yield byte-identical output");
    }

    #[test]
    fn record_price_is_last_close_and_timestamps_come_from_snapshot() {
        let mut prices: Vec<f64> = (0..80).map(|i| 100.0 + i as f64).collect();
        *prices.last_mut().unwrap() = 777.5;
        let snap = snapshot(&[("AAPL", prices)]);
        let fetched_at = snap.fetched_at;

        let set = engine().compute(snap);

        assert_eq!(set.version, SCHEMA_VERSION);
        assert_eq!(set.generated_at, fetched_at);
        let record = set.record("AAPL").unwrap();
        assert_eq!(record.price, 777.5);
        assert_eq!(record.timestamp, fetched_at);
    }

    #[test]
    fn empty_snapshot_yields_empty_set() {
        let set = engine().compute(snapshot(&[]));
        assert!(set.signals.is_empty());
    }
}

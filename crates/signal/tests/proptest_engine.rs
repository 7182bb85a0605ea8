use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use common::{Candle, MarketSnapshot};
use signal::{build_rule, RuleConfig, SignalEngine};

fn engine(rule_type: &str) -> SignalEngine {
    let rule = build_rule(&RuleConfig {
        rule_type: rule_type.to_string(),
        name: format!("proptest {rule_type}"),
        params: HashMap::new(),
    })
    .unwrap();
    SignalEngine::new(rule)
}

fn snapshot_of(prices: &[f64]) -> MarketSnapshot {
    let mut snap = MarketSnapshot::new(Utc.timestamp_opt(1_700_100_000, 0).unwrap());
    let candles: Vec<Candle> = prices
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
        .collect();
    snap.series.insert("PROPUSDT".to_string(), candles);
    snap
}

proptest! {
    /// Arbitrary finite price series must never panic the engine, and any
    /// record it emits must carry a confidence within [0, 1].
    #[test]
    fn confidence_always_within_bounds(
        prices in proptest::collection::vec(0.0001f64..1_000_000.0f64, 0..200)
    ) {
        for rule_type in ["momentum", "rsi"] {
            let set = engine(rule_type).compute(snapshot_of(&prices));
            for record in &set.signals {
                prop_assert!(
                    (0.0..=1.0).contains(&record.confidence),
                    "{rule_type} emitted confidence {}",
                    record.confidence
                );
            }
        }
    }

    /// Computing the same snapshot twice yields byte-identical JSON.
    #[test]
    fn compute_is_deterministic(
        prices in proptest::collection::vec(0.0001f64..1_000_000.0f64, 40..120)
    ) {
        let e = engine("momentum");
        let snap = snapshot_of(&prices);
        let a = serde_json::to_vec(&e.compute(snap.clone())).unwrap();
        let b = serde_json::to_vec(&e.compute(snap)).unwrap();
        prop_assert_eq!(a, b);
    }
}

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version stamped into every published artifact. Bumps must be additive so
/// existing readers of `signals.json` keep working.
pub const SCHEMA_VERSION: u32 = 1;

/// Recommended trading action for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for SignalAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalAction::Buy => write!(f, "BUY"),
            SignalAction::Sell => write!(f, "SELL"),
            SignalAction::Hold => write!(f, "HOLD"),
        }
    }
}

/// One published signal for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub symbol: String,
    pub action: SignalAction,
    /// Always within [0, 1]; clamped at construction.
    pub confidence: f64,
    /// Last close price the decision was made on.
    pub price: f64,
    pub timestamp: DateTime<Utc>,
    pub rationale: String,
    /// Relative path of the symbol's chart asset, present only when image
    /// staging is enabled and the asset exists on disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<String>,
}

impl SignalRecord {
    pub fn new(
        symbol: impl Into<String>,
        action: SignalAction,
        confidence: f64,
        price: f64,
        timestamp: DateTime<Utc>,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            action,
            confidence: confidence.clamp(0.0, 1.0),
            price,
            timestamp,
            rationale: rationale.into(),
            chart: None,
        }
    }
}

/// The full output of one computation cycle, serialized to `signals.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSet {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub signals: Vec<SignalRecord>,
}

impl SignalSet {
    /// Build a set from records, ordering by symbol and keeping only the
    /// first record per symbol. Symbol uniqueness is an invariant of the
    /// published artifact.
    pub fn new(generated_at: DateTime<Utc>, mut records: Vec<SignalRecord>) -> Self {
        records.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        records.dedup_by(|b, a| a.symbol == b.symbol);
        Self {
            version: SCHEMA_VERSION,
            generated_at,
            signals: records,
        }
    }

    pub fn record(&self, symbol: &str) -> Option<&SignalRecord> {
        self.signals.iter().find(|r| r.symbol == symbol)
    }
}

/// One provider candle, strictly validated at the adapter boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Raw market data for one cycle: symbol → candle series, oldest first.
///
/// Owned by exactly one pipeline run. The engine consumes it by value; it is
/// never cached or shared. `BTreeMap` keeps symbol iteration deterministic so
/// identical snapshots serialize identically.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub series: BTreeMap<String, Vec<Candle>>,
}

impl MarketSnapshot {
    pub fn new(fetched_at: DateTime<Utc>) -> Self {
        Self {
            fetched_at,
            series: BTreeMap::new(),
        }
    }

    pub fn symbol_count(&self) -> usize {
        self.series.len()
    }
}

/// State of one orchestrator cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CycleState {
    #[default]
    Idle,
    Fetching,
    Computing,
    Publishing,
    Done,
    Failed,
}

impl std::fmt::Display for CycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleState::Idle => write!(f, "idle"),
            CycleState::Fetching => write!(f, "fetching"),
            CycleState::Computing => write!(f, "computing"),
            CycleState::Publishing => write!(f, "publishing"),
            CycleState::Done => write!(f, "done"),
            CycleState::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_clamped_at_construction() {
        let t = Utc::now();
        let hi = SignalRecord::new("BTCUSDT", SignalAction::Buy, 1.7, 100.0, t, "r");
        let lo = SignalRecord::new("BTCUSDT", SignalAction::Sell, -0.3, 100.0, t, "r");
        assert_eq!(hi.confidence, 1.0);
        assert_eq!(lo.confidence, 0.0);
    }

    #[test]
    fn signal_set_orders_and_dedupes_symbols() {
        let t = Utc::now();
        let records = vec![
            SignalRecord::new("ETHUSDT", SignalAction::Hold, 0.5, 1.0, t, "a"),
            SignalRecord::new("BTCUSDT", SignalAction::Buy, 0.9, 2.0, t, "b"),
            SignalRecord::new("ETHUSDT", SignalAction::Sell, 0.1, 3.0, t, "c"),
        ];
        let set = SignalSet::new(t, records);
        let symbols: Vec<&str> = set.signals.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTCUSDT", "ETHUSDT"]);
        // First occurrence wins
        assert_eq!(set.record("ETHUSDT").unwrap().action, SignalAction::Hold);
    }

    #[test]
    fn action_serializes_uppercase() {
        let json = serde_json::to_string(&SignalAction::Buy).unwrap();
        assert_eq!(json, "\"BUY\"");
    }
}

pub mod config;
pub mod engine;
pub mod indicators;
pub mod rules;

pub use config::{RuleConfig, RuleFileConfig};
pub use engine::SignalEngine;
pub use rules::build_rule;

use common::{Candle, SignalAction};

/// The outcome of evaluating one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub action: SignalAction,
    /// Raw rule output; clamped into [0, 1] when the record is built.
    pub confidence: f64,
    pub rationale: String,
}

/// A deterministic decision rule applied to every symbol in a snapshot.
///
/// Implementations must be pure: the same candle series always yields the
/// same decision. Returns `None` when the series is shorter than the rule's
/// minimum history — the symbol is then excluded from the published set
/// rather than emitting a record with undefined confidence.
pub trait Rule: Send + Sync {
    /// Human-readable name of this rule instance.
    fn name(&self) -> &str;

    /// Evaluate a symbol's candle series (oldest first).
    fn evaluate(&self, symbol: &str, candles: &[Candle]) -> Option<Decision>;
}

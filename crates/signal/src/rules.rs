use std::collections::HashMap;

use common::{Candle, SignalAction};

use crate::config::RuleConfig;
use crate::indicators::{macd_histogram, rsi};
use crate::{Decision, Rule};

/// Build the configured rule, erroring on unknown rule types.
pub fn build_rule(cfg: &RuleConfig) -> Result<Box<dyn Rule>, String> {
    match cfg.rule_type.as_str() {
        "momentum" => {
            let period = param_usize(&cfg.params, "period", 14);
            let fast = param_usize(&cfg.params, "fast", 12);
            let slow = param_usize(&cfg.params, "slow", 26);
            let signal = param_usize(&cfg.params, "signal", 9);
            let buy_rsi = param_f64(&cfg.params, "buy_rsi", 60.0);
            let sell_rsi = param_f64(&cfg.params, "sell_rsi", 40.0);
            Ok(Box::new(MomentumRule {
                name: cfg.name.clone(),
                period,
                fast,
                slow,
                signal,
                buy_rsi,
                sell_rsi,
            }))
        }
        "rsi" => {
            let period = param_usize(&cfg.params, "period", 14);
            let overbought = param_f64(&cfg.params, "overbought", 70.0);
            let oversold = param_f64(&cfg.params, "oversold", 30.0);
            Ok(Box::new(RsiRule {
                name: cfg.name.clone(),
                period,
                overbought,
                oversold,
            }))
        }
        other => Err(format!("unknown rule type '{other}'")),
    }
}

fn param_f64(params: &HashMap<String, toml::Value>, key: &str, default: f64) -> f64 {
    params.get(key).and_then(|v| v.as_float()).unwrap_or(default)
}

fn param_usize(params: &HashMap<String, toml::Value>, key: &str, default: usize) -> usize {
    params
        .get(key)
        .and_then(|v| v.as_integer())
        .map(|v| v as usize)
        .unwrap_or(default)
}

fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Confidence in a Hold: how close RSI sits to its neutral midpoint.
fn hold_confidence(rsi_value: f64) -> f64 {
    1.0 - (rsi_value - 50.0).abs() / 50.0
}

// ─── Momentum rule (RSI + MACD histogram) ────────────────────────────────────

/// Buy when RSI confirms strength and the MACD histogram confirms upward
/// acceleration; Sell on the mirrored condition; Hold otherwise.
struct MomentumRule {
    name: String,
    period: usize,
    fast: usize,
    slow: usize,
    signal: usize,
    buy_rsi: f64,
    sell_rsi: f64,
}

impl Rule for MomentumRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, _symbol: &str, candles: &[Candle]) -> Option<Decision> {
        let closes = closes(candles);
        let rsi_value = rsi(&closes, self.period)?;
        let hist = macd_histogram(&closes, self.fast, self.slow, self.signal)?;

        let (action, confidence, direction) = if rsi_value >= self.buy_rsi && hist > 0.0 {
            (SignalAction::Buy, (rsi_value - 50.0) / 50.0, "upward")
        } else if rsi_value <= self.sell_rsi && hist < 0.0 {
            (SignalAction::Sell, (50.0 - rsi_value) / 50.0, "downward")
        } else {
            (SignalAction::Hold, hold_confidence(rsi_value), "no confirmed")
        };

        Some(Decision {
            action,
            confidence,
            rationale: format!(
                "RSI({})={:.1}, MACD histogram={:+.5}: {} momentum",
                self.period, rsi_value, hist, direction
            ),
        })
    }
}

// ─── Plain RSI rule ──────────────────────────────────────────────────────────

/// Classic mean-reversion reading: Buy oversold, Sell overbought, Hold the
/// middle band.
struct RsiRule {
    name: String,
    period: usize,
    overbought: f64,
    oversold: f64,
}

impl Rule for RsiRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, _symbol: &str, candles: &[Candle]) -> Option<Decision> {
        let closes = closes(candles);
        let rsi_value = rsi(&closes, self.period)?;

        let (action, confidence, reading) = if rsi_value <= self.oversold {
            let span = self.oversold.max(f64::EPSILON);
            (SignalAction::Buy, (self.oversold - rsi_value) / span, "oversold")
        } else if rsi_value >= self.overbought {
            let span = (100.0 - self.overbought).max(f64::EPSILON);
            (
                SignalAction::Sell,
                (rsi_value - self.overbought) / span,
                "overbought",
            )
        } else {
            (SignalAction::Hold, hold_confidence(rsi_value), "neutral")
        };

        Some(Decision {
            action,
            confidence,
            rationale: format!("RSI({})={:.1}: {}", self.period, rsi_value, reading),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

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

    fn momentum() -> Box<dyn Rule> {
        build_rule(&RuleConfig {
            rule_type: "momentum".to_string(),
            name: "test momentum".to_string(),
            params: HashMap::new(),
        })
        .unwrap()
    }

    #[test]
    fn unknown_rule_type_is_rejected() {
        let cfg = RuleConfig {
            rule_type: "astrology".to_string(),
            name: "nope".to_string(),
            params: HashMap::new(),
        };
        assert!(build_rule(&cfg).is_err());
    }

    #[test]
    fn momentum_rule_buys_a_sustained_rise() {
        let rule = momentum();
        let prices: Vec<f64> = (0..80).map(|i| 100.0 + i as f64 * 0.8).collect();
        let decision = rule.evaluate("BTCUSDT", &series(&prices)).unwrap();
        assert_eq!(decision.action, SignalAction::Buy);
        assert!(decision.confidence > 0.0);
        assert!(decision.rationale.contains("upward"));
    }

    #[test]
    fn momentum_rule_sells_a_sustained_decline() {
        let rule = momentum();
        let prices: Vec<f64> = (0..80).map(|i| 200.0 - i as f64 * 0.8).collect();
        let decision = rule.evaluate("BTCUSDT", &series(&prices)).unwrap();
        assert_eq!(decision.action, SignalAction::Sell);
    }

    #[test]
    fn momentum_rule_holds_a_flat_market() {
        let rule = momentum();
        let prices = vec![100.0; 80];
        let decision = rule.evaluate("BTCUSDT", &series(&prices)).unwrap();
        assert_eq!(decision.action, SignalAction::Hold);
    }

    #[test]
    fn momentum_rule_excludes_short_history() {
        let rule = momentum();
        let prices = vec![100.0];
        assert!(rule.evaluate("MSFT", &series(&prices)).is_none());
    }

    #[test]
    fn rsi_rule_buys_oversold() {
        let rule = build_rule(&RuleConfig {
            rule_type: "rsi".to_string(),
            name: "test rsi".to_string(),
            params: HashMap::new(),
        })
        .unwrap();
        let prices: Vec<f64> = (0..30).map(|i| 100.0 - i as f64 * 2.0).collect();
        let decision = rule.evaluate("ETHUSDT", &series(&prices)).unwrap();
        assert_eq!(decision.action, SignalAction::Buy);
    }
}

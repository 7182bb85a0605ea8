use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Decision-rule config file (TOML).
///
/// Example `config/rules.toml`:
/// ```toml
/// [rule]
/// type = "momentum"
/// name = "RSI+MACD momentum"
///
/// [rule.params]
/// period = 14
/// buy_rsi = 60.0
/// sell_rsi = 40.0
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleFileConfig {
    pub rule: RuleConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleConfig {
    /// Rule type identifier: "momentum" or "rsi".
    #[serde(rename = "type")]
    pub rule_type: String,
    /// Human-readable name shown in logs and rationales.
    pub name: String,
    /// Rule-specific parameters.
    #[serde(default)]
    pub params: HashMap<String, toml::Value>,
}

impl RuleFileConfig {
    /// Load from a TOML file. Exits process on error.
    pub fn load(path: &str) -> Self {
        let content = std::fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read rule config at '{path}': {e}"));
        toml::from_str(&content)
            .unwrap_or_else(|e| panic!("Failed to parse rule config at '{path}': {e}"))
    }
}

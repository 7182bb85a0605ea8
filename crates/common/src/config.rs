use std::path::PathBuf;
use std::time::Duration;

/// All configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
///
/// Built once in `main` and passed down explicitly; nothing reads the
/// environment after startup.
#[derive(Debug, Clone)]
pub struct Config {
    // Data provider
    pub provider_api_key: String,
    pub provider_base_url: String,
    pub symbols: Vec<String>,
    pub lookback: Duration,
    pub fetch_timeout: Duration,

    // Fetch retry
    pub fetch_max_attempts: u32,
    pub fetch_backoff: Duration,

    // Publication
    pub signals_path: PathBuf,
    /// When set, image staging is enabled: assets are copied from this
    /// directory before the JSON referencing them is published.
    pub chart_assets_dir: Option<PathBuf>,
    pub chart_publish_dir: PathBuf,
    pub git_sync: bool,

    // Decision rule config file path
    pub rule_config_path: String,

    // Telegram announcements (enabled when token + chat ids are present)
    pub telegram_token: Option<String>,
    pub telegram_chat_ids: Vec<i64>,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let symbols: Vec<String> = required_env("SYMBOLS")
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        if symbols.is_empty() {
            panic!("SYMBOLS must contain at least one instrument");
        }

        let telegram_chat_ids = optional_env("TELEGRAM_CHAT_IDS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| {
                        s.trim().parse::<i64>().unwrap_or_else(|_| {
                            panic!(
                                "TELEGRAM_CHAT_IDS contains non-numeric ID: '{}'",
                                s.trim()
                            )
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Config {
            provider_api_key: required_env("PROVIDER_API_KEY"),
            provider_base_url: optional_env("PROVIDER_BASE_URL")
                .unwrap_or_else(|| "https://api.binance.com".to_string()),
            symbols,
            lookback: Duration::from_secs(
                optional_env("LOOKBACK_MINUTES")
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(120)
                    * 60,
            ),
            fetch_timeout: Duration::from_secs(
                optional_env("FETCH_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
            fetch_max_attempts: optional_env("FETCH_MAX_ATTEMPTS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            fetch_backoff: Duration::from_millis(
                optional_env("FETCH_BACKOFF_MS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1000),
            ),
            signals_path: optional_env("SIGNALS_PATH")
                .unwrap_or_else(|| "signals.json".to_string())
                .into(),
            chart_assets_dir: optional_env("CHART_ASSETS_DIR").map(PathBuf::from),
            chart_publish_dir: optional_env("CHART_PUBLISH_DIR")
                .unwrap_or_else(|| "images".to_string())
                .into(),
            git_sync: optional_env("GIT_SYNC")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
            rule_config_path: optional_env("RULE_CONFIG_PATH")
                .unwrap_or_else(|| "config/rules.toml".to_string()),
            telegram_token: optional_env("TELEGRAM_TOKEN"),
            telegram_chat_ids,
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

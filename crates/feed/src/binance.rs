use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use common::{Candle, Error, MarketSnapshot, Result};

use crate::MarketDataSource;

/// Hard ceiling on candles per request imposed by the provider.
const MAX_KLINE_LIMIT: u64 = 1000;

/// Explicit adapter configuration, built from `common::Config` in `main`.
/// Scoped to one orchestrator run; nothing here is global.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

/// REST adapter for Binance-style kline endpoints.
///
/// Fetches 1-minute candles per symbol and converts them into the typed
/// `MarketSnapshot` model at this boundary. Responses that do not match the
/// expected schema fail the symbol instead of leaking loose data downstream.
pub struct BinanceFeed {
    cfg: FeedConfig,
    http: Client,
}

impl BinanceFeed {
    pub fn new(cfg: FeedConfig) -> Self {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(cfg.timeout)
            .build()
            .expect("Failed to build HTTP client");
        Self { cfg, http }
    }

    async fn fetch_symbol(&self, symbol: &str, limit: u64) -> std::result::Result<Vec<Candle>, FetchFailure> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval=1m&limit={}",
            self.cfg.base_url, symbol, limit
        );

        let resp = self
            .http
            .get(&url)
            .header("X-MBX-APIKEY", &self.cfg.api_key)
            .send()
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(FetchFailure::Rejected(format!("HTTP {status}: {body}")));
        }

        let candles = parse_klines(&body).map_err(FetchFailure::Rejected)?;
        if candles.is_empty() {
            return Err(FetchFailure::Rejected("empty candle series".to_string()));
        }
        Ok(candles)
    }
}

#[async_trait]
impl MarketDataSource for BinanceFeed {
    async fn fetch(&self, symbols: &[String], window: Duration) -> Result<MarketSnapshot> {
        let limit = (window.as_secs() / 60).clamp(1, MAX_KLINE_LIMIT);
        let mut snapshot = MarketSnapshot::new(Utc::now());
        let mut rejected = 0usize;
        let mut unreachable = 0usize;

        for symbol in symbols {
            match self.fetch_symbol(symbol, limit).await {
                Ok(candles) => {
                    debug!(symbol = %symbol, candles = candles.len(), "Fetched series");
                    snapshot.series.insert(symbol.clone(), candles);
                }
                Err(FetchFailure::Transport(e)) => {
                    warn!(symbol = %symbol, error = %e, "Provider unreachable for symbol");
                    unreachable += 1;
                }
                Err(FetchFailure::Rejected(e)) => {
                    warn!(symbol = %symbol, error = %e, "Dropping symbol with unusable data");
                    rejected += 1;
                }
            }
        }

        // Partial success: one valid symbol is enough to run the cycle.
        if snapshot.series.is_empty() {
            if rejected == 0 && unreachable > 0 {
                return Err(Error::DataUnavailable(format!(
                    "provider unreachable for all {unreachable} symbols"
                )));
            }
            return Err(Error::NoData);
        }

        Ok(snapshot)
    }
}

enum FetchFailure {
    /// Request never completed: connect error, timeout, body cut short.
    Transport(String),
    /// The provider answered but the response was unusable.
    Rejected(String),
}

// ─── Kline schema validation ─────────────────────────────────────────────────

/// One kline row as the provider sends it: a fixed-arity JSON array with
/// numeric fields encoded as strings.
#[derive(Deserialize)]
#[allow(dead_code)] // trailing fields are validated for arity, not read
struct KlineRow(
    i64,    // open time (ms)
    String, // open
    String, // high
    String, // low
    String, // close
    String, // volume
    i64,    // close time (ms)
    String, // quote asset volume
    i64,    // number of trades
    String, // taker buy base volume
    String, // taker buy quote volume
    String, // unused
);

/// Strictly parse a kline response body into candles, oldest first.
/// Any row that fails to match the schema fails the whole series.
fn parse_klines(body: &str) -> std::result::Result<Vec<Candle>, String> {
    let rows: Vec<KlineRow> =
        serde_json::from_str(body).map_err(|e| format!("kline schema mismatch: {e}"))?;

    rows.iter().map(candle_from_row).collect()
}

fn candle_from_row(row: &KlineRow) -> std::result::Result<Candle, String> {
    let open_time: DateTime<Utc> = Utc
        .timestamp_millis_opt(row.0)
        .single()
        .ok_or_else(|| format!("invalid kline open time: {}", row.0))?;

    Ok(Candle {
        open_time,
        open: parse_price(&row.1, "open")?,
        high: parse_price(&row.2, "high")?,
        low: parse_price(&row.3, "low")?,
        close: parse_price(&row.4, "close")?,
        volume: parse_price(&row.5, "volume")?,
    })
}

fn parse_price(raw: &str, field: &str) -> std::result::Result<f64, String> {
    raw.parse::<f64>()
        .map_err(|_| format!("non-numeric kline {field}: '{raw}'"))
}

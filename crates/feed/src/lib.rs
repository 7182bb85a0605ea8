pub mod binance;

pub use binance::{BinanceFeed, FeedConfig};

use std::time::Duration;

use async_trait::async_trait;

use common::{MarketSnapshot, Result};

/// Abstraction over the market data provider.
///
/// `BinanceFeed` implements this against the real REST API. Tests drive the
/// orchestrator with in-memory implementations.
///
/// A fetch covers one lookback `window` ending now and must be bounded by the
/// adapter's request timeout; it never blocks indefinitely.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch candle series for the given symbols.
    ///
    /// Symbols that fail individually are dropped from the snapshot. Errors:
    /// `DataUnavailable` when the provider was unreachable for every symbol,
    /// `NoData` when it answered but nothing usable came back.
    async fn fetch(&self, symbols: &[String], window: Duration) -> Result<MarketSnapshot>;
}

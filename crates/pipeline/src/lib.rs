use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use uuid::Uuid;

use common::{CycleState, Error, MarketSnapshot, Result, SignalSet};
use feed::MarketDataSource;
use notify::Notifier;
use publish::Publisher;
use signal::SignalEngine;

/// Ceiling on the fetch-retry backoff, matching the reconnect discipline used
/// against the same provider elsewhere.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Bounded retry applied to the fetch stage only.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

/// Drives one fetch → compute → publish cycle.
///
/// The orchestrator owns no scheduling loop: the process runs one cycle to
/// completion and the external scheduler invokes the next one, so cycles
/// never overlap. Stage policy: only `DataUnavailable` fetch failures are
/// retried (bounded, exponential backoff); recomputing the same snapshot is
/// pointless and a failed publish waits for the next cycle's fresh data.
pub struct Orchestrator {
    source: Arc<dyn MarketDataSource>,
    engine: SignalEngine,
    publisher: Publisher,
    notifier: Option<Notifier>,
    symbols: Vec<String>,
    window: Duration,
    retry: RetryPolicy,
    state: CycleState,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        engine: SignalEngine,
        publisher: Publisher,
        symbols: Vec<String>,
        window: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            source,
            engine,
            publisher,
            notifier: None,
            symbols,
            window,
            retry,
            state: CycleState::Idle,
        }
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Run one full cycle. Returns the published set on success; on failure
    /// the cycle ends in `Failed` and the previous artifact stays in place.
    pub async fn run_cycle(&mut self) -> Result<SignalSet> {
        let cycle = Uuid::new_v4();

        self.transition(cycle, CycleState::Fetching);
        let snapshot = match self.fetch_with_retry(cycle).await {
            Ok(snapshot) => snapshot,
            Err(e) => return self.fail(cycle, e),
        };
        info!(
            cycle = %cycle,
            symbols = snapshot.symbol_count(),
            requested = self.symbols.len(),
            "Snapshot fetched"
        );

        self.transition(cycle, CycleState::Computing);
        let set = self.engine.compute(snapshot);

        self.transition(cycle, CycleState::Publishing);
        if let Err(e) = self.publisher.publish(set.clone()) {
            return self.fail(cycle, e.into());
        }

        if let Some(notifier) = &self.notifier {
            notifier.announce(&set).await;
        }

        self.transition(cycle, CycleState::Done);
        Ok(set)
    }

    async fn fetch_with_retry(&self, cycle: Uuid) -> Result<MarketSnapshot> {
        let mut backoff = self.retry.initial_backoff;
        let mut attempt = 1u32;

        loop {
            match self.source.fetch(&self.symbols, self.window).await {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    warn!(
                        cycle = %cycle,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        backoff = ?backoff,
                        error = %e,
                        "Fetch failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn transition(&mut self, cycle: Uuid, to: CycleState) {
        info!(cycle = %cycle, from = %self.state, to = %to, "Cycle state");
        self.state = to;
    }

    fn fail(&mut self, cycle: Uuid, e: Error) -> Result<SignalSet> {
        self.transition(cycle, CycleState::Failed);
        error!(cycle = %cycle, error = %e, "Cycle failed — previous artifact left in place");
        Err(e)
    }
}

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use common::Config;
use feed::{BinanceFeed, FeedConfig};
use notify::Notifier;
use pipeline::{Orchestrator, RetryPolicy};
use publish::{ChartAssets, Publisher};
use signal::{build_rule, RuleFileConfig, SignalEngine};

/// One run-to-completion cycle: fetch → compute → publish.
/// The external scheduler (cron, systemd timer) invokes the next cycle;
/// exit code 0 means Done, 1 means Failed with the old artifact intact.
#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(
        symbols = ?cfg.symbols,
        destination = %cfg.signals_path.display(),
        "PulseBot cycle starting"
    );

    // ── Decision rule ─────────────────────────────────────────────────────────
    let rule_file = RuleFileConfig::load(&cfg.rule_config_path);
    let rule = build_rule(&rule_file.rule)
        .unwrap_or_else(|e| panic!("Invalid rule config at '{}': {e}", cfg.rule_config_path));
    let engine = SignalEngine::new(rule);

    // ── Market data source ────────────────────────────────────────────────────
    let source = Arc::new(BinanceFeed::new(FeedConfig {
        base_url: cfg.provider_base_url.clone(),
        api_key: cfg.provider_api_key.clone(),
        timeout: cfg.fetch_timeout,
    }));

    // ── Publisher ─────────────────────────────────────────────────────────────
    let mut publisher = Publisher::new(cfg.signals_path.clone());
    if let Some(assets_dir) = &cfg.chart_assets_dir {
        publisher = publisher.with_charts(ChartAssets::new(assets_dir, &cfg.chart_publish_dir));
    }
    if cfg.git_sync {
        publisher = publisher.with_git_sync();
    }

    // ── Orchestrator ──────────────────────────────────────────────────────────
    let mut orchestrator = Orchestrator::new(
        source,
        engine,
        publisher,
        cfg.symbols.clone(),
        cfg.lookback,
        RetryPolicy {
            max_attempts: cfg.fetch_max_attempts,
            initial_backoff: cfg.fetch_backoff,
        },
    );

    if let Some(token) = &cfg.telegram_token {
        if cfg.telegram_chat_ids.is_empty() {
            warn!("TELEGRAM_TOKEN set but TELEGRAM_CHAT_IDS is empty — announcements disabled");
        } else {
            orchestrator = orchestrator.with_notifier(Notifier::new(token, &cfg.telegram_chat_ids));
        }
    }

    // ── Run one cycle ─────────────────────────────────────────────────────────
    match orchestrator.run_cycle().await {
        Ok(set) => {
            info!(signals = set.signals.len(), "Cycle complete");
        }
        Err(e) => {
            error!(error = %e, "Cycle failed");
            std::process::exit(1);
        }
    }
}

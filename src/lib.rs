// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod ingest;
pub mod metrics;
pub mod publish;

pub use crate::config::BeatConfig;
pub use crate::ingest::aggregate;
pub use crate::ingest::types::{BatchResult, FetchError, FetchOutcome, ItemId, ItemRecord};

use std::sync::Arc;

use anyhow::Result;

use crate::config::OutputConfig;
use crate::ingest::providers::hacker_news::HackerNewsClient;
use crate::ingest::scheduler::{Scheduler, SchedulerCfg};
use crate::ingest::ListResolver;
use crate::publish::{EventSink, StdoutSink, WebhookSink};

/// Wire a scheduler from configuration: Hacker News client, resolver and sink.
pub fn build_scheduler(cfg: &BeatConfig) -> Result<Scheduler> {
    let client = Arc::new(
        HackerNewsClient::new(cfg.api_base_url.clone())
            .with_feed(cfg.feed)
            .with_request_timeout(cfg.request_timeout)?,
    );
    let resolver = ListResolver::new(
        client.clone(),
        client,
        cfg.number_of_stories,
        cfg.timeout,
    );

    let sink: Arc<dyn EventSink> = match &cfg.output {
        OutputConfig::Stdout => Arc::new(StdoutSink::new()),
        OutputConfig::Webhook { url } => Arc::new(WebhookSink::new(url.clone())),
    };

    tracing::info!(
        period = ?cfg.period,
        timeout = ?cfg.timeout,
        number_of_stories = cfg.number_of_stories,
        feed = ?cfg.feed,
        sink = sink.name(),
        "successfully created hackerbeat instance with the following configuration"
    );

    Ok(Scheduler::new(
        resolver,
        sink,
        &cfg.beat_name,
        SchedulerCfg {
            period: cfg.period,
            run_on_start: cfg.run_on_start,
        },
    ))
}

// src/publish/mod.rs
pub mod memory;
pub mod stdout;
pub mod webhook;

use anyhow::Result;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::ingest::types::{BatchResult, FetchOutcome, ItemRecord};

pub use memory::MemorySink;
pub use stdout::StdoutSink;
pub use webhook::WebhookSink;

/// One published story, flattened the way beats index documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoryEvent {
    #[serde(rename = "@timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub beat: String,
    pub story_id: u64,
    pub story_score: u64,
    pub story_time: u64,
    pub story_title: String,
    pub story_author: String,
    pub story_url: String,
}

impl StoryEvent {
    pub fn from_item(beat: &str, item: &ItemRecord, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            beat: beat.to_string(),
            story_id: item.id,
            story_score: item.score,
            story_time: item.time,
            story_title: item.title.clone(),
            story_author: item.by.clone(),
            story_url: item.url.clone(),
        }
    }
}

#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: &StoryEvent) -> Result<()>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishSummary {
    pub published: usize,
    pub failed: usize,
    pub sink_errors: usize,
}

/// Hand every outcome of a batch to `sink`: resolved items become events,
/// failed ones a warning keyed by id. Sink errors are logged and counted.
pub async fn publish_batch(
    sink: &dyn EventSink,
    beat: &str,
    batch: BatchResult,
) -> PublishSummary {
    let mut summary = PublishSummary::default();
    let now = Utc::now();

    for outcome in batch {
        match outcome {
            FetchOutcome::Resolved(item) => {
                let event = StoryEvent::from_item(beat, &item, now);
                match sink.publish(&event).await {
                    Ok(()) => {
                        summary.published += 1;
                        counter!("hackerbeat_events_published_total").increment(1);
                        tracing::info!(id = item.id, title = %item.title, "Published story");
                    }
                    Err(e) => {
                        summary.sink_errors += 1;
                        counter!("hackerbeat_sink_errors_total").increment(1);
                        tracing::warn!(error = ?e, sink = sink.name(), id = item.id, "sink error");
                    }
                }
            }
            FetchOutcome::Failed { id, error } => {
                summary.failed += 1;
                tracing::warn!(
                    id,
                    kind = error.kind(),
                    error = %error,
                    "failed to fetch story"
                );
            }
        }
    }

    summary
}

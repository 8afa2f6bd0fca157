use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use super::{EventSink, StoryEvent};

/// POSTs each event as JSON to a fixed URL (an Elasticsearch `_doc` endpoint,
/// a log collector, a chat webhook...).
#[derive(Clone)]
pub struct WebhookSink {
    url: String,
    client: Client,
    timeout: Duration,
}

impl WebhookSink {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }
}

#[async_trait::async_trait]
impl EventSink for WebhookSink {
    async fn publish(&self, event: &StoryEvent) -> Result<()> {
        self.client
            .post(&self.url)
            .timeout(self.timeout)
            .json(event)
            .send()
            .await
            .context("webhook post")?
            .error_for_status()
            .context("webhook non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}

use anyhow::{Context, Result};
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

use super::{EventSink, StoryEvent};

/// Writes one JSON document per line to stdout.
pub struct StdoutSink {
    out: Mutex<Stdout>,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self {
            out: Mutex::new(tokio::io::stdout()),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EventSink for StdoutSink {
    async fn publish(&self, event: &StoryEvent) -> Result<()> {
        let mut line = serde_json::to_vec(event).context("encoding story event")?;
        line.push(b'\n');

        let mut out = self.out.lock().await;
        out.write_all(&line).await.context("stdout write")?;
        out.flush().await.context("stdout flush")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

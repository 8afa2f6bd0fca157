use anyhow::Result;
use std::sync::Mutex;

use super::{EventSink, StoryEvent};

/// Keeps published events in memory. Handy for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<StoryEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StoryEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait::async_trait]
impl EventSink for MemorySink {
    async fn publish(&self, event: &StoryEvent) -> Result<()> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

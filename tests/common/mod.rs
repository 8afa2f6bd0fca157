// tests/common/mod.rs
#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hackerbeat::ingest::types::{ItemFetcher, StoryIndex};
use hackerbeat::{FetchError, ItemId, ItemRecord};
use tokio::sync::Semaphore;

/// Log lines written by the current thread's subscriber, without ANSI codes.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let logs = Self::default();
        let buf = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || buf.clone())
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (logs, guard)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Resolves every id immediately.
#[derive(Default)]
pub struct EchoFetcher {
    pub calls: AtomicUsize,
}

#[async_trait::async_trait]
impl ItemFetcher for EchoFetcher {
    async fn fetch_item(&self, id: ItemId) -> Result<ItemRecord, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ItemRecord {
            id,
            title: format!("story {id}"),
            ..Default::default()
        })
    }
}

/// Ranked list that answers after `delay`, or after a permit is released when gated.
pub struct ScriptedIndex {
    ids: Vec<ItemId>,
    delay: Duration,
    gate: Option<Semaphore>,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedIndex {
    pub fn slow(ids: Vec<ItemId>, delay: Duration) -> Self {
        Self {
            ids,
            delay,
            gate: None,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    pub fn gated(ids: Vec<ItemId>) -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::slow(ids, Duration::ZERO)
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StoryIndex for ScriptedIndex {
    async fn ranked_ids(&self) -> Result<Vec<ItemId>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(self.ids.clone())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

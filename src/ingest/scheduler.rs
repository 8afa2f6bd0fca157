// src/ingest/scheduler.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use metrics::{counter, gauge};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::ingest::ListResolver;
use crate::publish::{publish_batch, EventSink, PublishSummary};

/// Single-flight guard: at most one polling cycle in flight.
#[derive(Debug, Default)]
pub struct CycleGate {
    busy: AtomicBool,
}

impl CycleGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Take the gate if it is free. The gate is released when the guard drops.
    pub fn try_acquire(self: &Arc<Self>) -> Option<CycleGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CycleGuard {
                gate: Arc::clone(self),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct CycleGuard {
    gate: Arc<CycleGate>,
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    pub period: Duration,
    /// Fire the first cycle right away instead of one period after start.
    pub run_on_start: bool,
}

/// How a polling cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleReport {
    Published(PublishSummary),
    ListFailed,
}

/// Result of one timer tick.
#[derive(Debug)]
pub enum Tick {
    Started(JoinHandle<CycleReport>),
    /// A cycle was already in flight; the tick is dropped.
    Skipped,
}

pub struct Scheduler {
    resolver: ListResolver,
    sink: Arc<dyn EventSink>,
    beat_name: Arc<str>,
    gate: Arc<CycleGate>,
    cfg: SchedulerCfg,
}

impl Scheduler {
    pub fn new(
        resolver: ListResolver,
        sink: Arc<dyn EventSink>,
        beat_name: &str,
        cfg: SchedulerCfg,
    ) -> Self {
        Self {
            resolver,
            sink,
            beat_name: Arc::from(beat_name),
            gate: CycleGate::new(),
            cfg,
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.gate.is_busy()
    }

    /// Start a cycle unless one is already running.
    pub fn tick(&self) -> Tick {
        let Some(guard) = self.gate.try_acquire() else {
            counter!("hackerbeat_cycles_skipped_total").increment(1);
            tracing::debug!(target: "hackerbeat", "previous cycle still in flight, tick dropped");
            return Tick::Skipped;
        };

        let resolver = self.resolver.clone();
        let sink = Arc::clone(&self.sink);
        let beat = Arc::clone(&self.beat_name);
        Tick::Started(tokio::spawn(async move {
            let report = run_cycle(&resolver, sink.as_ref(), &beat).await;
            drop(guard);
            report
        }))
    }

    /// Drive `tick` from a periodic timer until the handle is stopped (or dropped).
    pub fn spawn(self) -> SchedulerHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let join = tokio::spawn(async move {
            let first = if self.cfg.run_on_start {
                Instant::now()
            } else {
                Instant::now() + self.cfg.period
            };
            let mut ticker = tokio::time::interval_at(first, self.cfg.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            tracing::info!(target: "hackerbeat", "hackerbeat is running! Hit CTRL-C to stop it.");
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        if let Tick::Started(cycle) = self.tick() {
                            tokio::spawn(async move {
                                if let Err(e) = cycle.await {
                                    tracing::error!(
                                        target: "hackerbeat",
                                        error = %e,
                                        "polling cycle panicked"
                                    );
                                }
                            });
                        }
                    }
                }
            }
            tracing::info!(
                target: "hackerbeat",
                in_flight = self.is_fetching(),
                "scheduler stopped"
            );
        });

        SchedulerHandle {
            stop: Some(stop_tx),
            join,
        }
    }
}

async fn run_cycle(resolver: &ListResolver, sink: &dyn EventSink, beat: &str) -> CycleReport {
    counter!("hackerbeat_cycles_total").increment(1);

    let report = match resolver.resolve().await {
        Ok(batch) => {
            let summary = publish_batch(sink, beat, batch).await;
            tracing::info!(
                target: "hackerbeat",
                published = summary.published,
                failed = summary.failed,
                sink_errors = summary.sink_errors,
                "cycle done"
            );
            CycleReport::Published(summary)
        }
        Err(e) => {
            tracing::warn!(
                target: "hackerbeat",
                error = %e,
                kind = e.kind(),
                "failed to fetch posts from HackerNews"
            );
            CycleReport::ListFailed
        }
    };

    let now = chrono::Utc::now().timestamp().max(0) as u64;
    gauge!("hackerbeat_last_cycle_ts").set(now as f64);
    report
}

/// Owner side of a running scheduler.
#[derive(Debug)]
pub struct SchedulerHandle {
    stop: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Cancel the timer and wait for the tick loop to exit.
    /// A cycle already in flight is left to finish on its own.
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.stop.take() {
            let _ = tx.send(());
        }
        self.join.await.context("scheduler loop panicked")
    }
}

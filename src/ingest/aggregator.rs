// src/ingest/aggregator.rs
//! Fan-out/fan-in of item lookups bounded by a deadline.
//!
//! Every identifier gets its own task. Outcomes flow back over one bounded
//! channel and are collected in arrival order until either all of them are in
//! or the deadline fires. Tasks still running at that point are abandoned, not
//! aborted: they finish in the background and their send fails against the
//! dropped receiver, so a late outcome can never reach another batch.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tokio::sync::mpsc;

use crate::ingest::types::{BatchResult, FetchOutcome, ItemFetcher, ItemId};

/// Resolve `ids` concurrently and return whatever completed within `deadline`.
///
/// The result holds at most `ids.len()` outcomes, in no particular order.
/// Failed lookups are included as [`FetchOutcome::Failed`]; they never stop
/// the other lookups.
pub async fn aggregate(
    fetcher: Arc<dyn ItemFetcher>,
    ids: &[ItemId],
    deadline: Duration,
) -> BatchResult {
    if ids.is_empty() {
        return Vec::new();
    }
    crate::ingest::ensure_metrics_described();

    let expected = ids.len();
    // Capacity == number of senders, so no task ever waits on the channel.
    let (tx, mut rx) = mpsc::channel::<FetchOutcome>(expected);

    for &id in ids {
        let tx = tx.clone();
        let fetcher = Arc::clone(&fetcher);
        tokio::spawn(async move {
            let outcome = fetch_one(fetcher.as_ref(), id).await;
            if tx.send(outcome).await.is_err() {
                tracing::debug!(id, "late outcome discarded");
            }
        });
    }
    drop(tx);

    let timer = tokio::time::sleep(deadline);
    tokio::pin!(timer);

    let mut out = Vec::with_capacity(expected);
    while out.len() < expected {
        tokio::select! {
            next = rx.recv() => match next {
                Some(outcome) => out.push(outcome),
                None => {
                    // Every sender is gone without reporting: a lookup task panicked.
                    tracing::warn!(
                        received = out.len(),
                        expected,
                        "lookup tasks ended without reporting an outcome"
                    );
                    break;
                }
            },
            () = &mut timer => {
                let seen: HashSet<ItemId> = out.iter().map(FetchOutcome::id).collect();
                let missing: Vec<ItemId> =
                    ids.iter().copied().filter(|id| !seen.contains(id)).collect();
                tracing::warn!(
                    target: "hackerbeat",
                    timeout_value = ?deadline,
                    received = out.len(),
                    expected,
                    ?missing,
                    "timeout reached when fetching stories"
                );
                counter!("hackerbeat_aggregation_timeouts_total").increment(1);
                break;
            }
        }
    }

    out
}

async fn fetch_one(fetcher: &dyn ItemFetcher, id: ItemId) -> FetchOutcome {
    let t0 = Instant::now();
    let outcome = match fetcher.fetch_item(id).await {
        Ok(item) => {
            counter!("hackerbeat_items_resolved_total").increment(1);
            FetchOutcome::Resolved(item)
        }
        Err(error) => {
            counter!("hackerbeat_item_errors_total", "kind" => error.kind()).increment(1);
            FetchOutcome::Failed { id, error }
        }
    };
    histogram!("hackerbeat_item_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    outcome
}

// src/ingest/mod.rs
pub mod aggregator;
pub mod providers;
pub mod scheduler;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use crate::ingest::types::{BatchResult, FetchError, ItemFetcher, StoryIndex};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

pub use aggregator::aggregate;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "hackerbeat_items_resolved_total",
            "Items resolved into a record."
        );
        describe_counter!(
            "hackerbeat_item_errors_total",
            "Item lookups that failed, by error kind."
        );
        describe_histogram!(
            "hackerbeat_item_fetch_ms",
            "Item lookup time in milliseconds."
        );
        describe_counter!(
            "hackerbeat_aggregation_timeouts_total",
            "Aggregations cut short by the deadline."
        );
        describe_counter!(
            "hackerbeat_list_errors_total",
            "Ranked list fetch/parse errors."
        );
        describe_counter!("hackerbeat_cycles_total", "Polling cycles started.");
        describe_counter!(
            "hackerbeat_cycles_skipped_total",
            "Ticks dropped because a cycle was still in flight."
        );
        describe_counter!(
            "hackerbeat_events_published_total",
            "Events handed to the sink."
        );
        describe_counter!("hackerbeat_sink_errors_total", "Sink publish errors.");
        describe_gauge!(
            "hackerbeat_last_cycle_ts",
            "Unix ts when the last polling cycle finished."
        );
    });
}

/// Fetches the ranked list and resolves its head.
#[derive(Clone)]
pub struct ListResolver {
    index: Arc<dyn StoryIndex>,
    fetcher: Arc<dyn ItemFetcher>,
    number_of_stories: usize,
    timeout: Duration,
}

impl ListResolver {
    pub fn new(
        index: Arc<dyn StoryIndex>,
        fetcher: Arc<dyn ItemFetcher>,
        number_of_stories: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            index,
            fetcher,
            number_of_stories,
            timeout,
        }
    }

    /// Resolve the first `number_of_stories` ids of the ranked list.
    /// A failing list request aborts the cycle; failing items do not.
    pub async fn resolve(&self) -> Result<BatchResult, FetchError> {
        ensure_metrics_described();

        let ids = match self.index.ranked_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                counter!("hackerbeat_list_errors_total").increment(1);
                return Err(e);
            }
        };

        let head = &ids[..ids.len().min(self.number_of_stories)];
        tracing::debug!(
            index = self.index.name(),
            listed = ids.len(),
            requested = head.len(),
            "resolving ranked list"
        );
        Ok(aggregate(Arc::clone(&self.fetcher), head, self.timeout).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::{FetchOutcome, ItemId, ItemRecord};
    use std::sync::Mutex;

    struct FixedIndex(Vec<ItemId>);

    #[async_trait::async_trait]
    impl StoryIndex for FixedIndex {
        async fn ranked_ids(&self) -> Result<Vec<ItemId>, FetchError> {
            Ok(self.0.clone())
        }
        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct BrokenIndex;

    #[async_trait::async_trait]
    impl StoryIndex for BrokenIndex {
        async fn ranked_ids(&self) -> Result<Vec<ItemId>, FetchError> {
            Err(FetchError::Status {
                url: "http://hn.test/topstories.json".into(),
                status: 500,
            })
        }
        fn name(&self) -> &'static str {
            "broken"
        }
    }

    #[derive(Default)]
    struct RecordingFetcher {
        calls: Mutex<Vec<ItemId>>,
    }

    #[async_trait::async_trait]
    impl ItemFetcher for RecordingFetcher {
        async fn fetch_item(&self, id: ItemId) -> Result<ItemRecord, FetchError> {
            self.calls.lock().unwrap().push(id);
            Ok(ItemRecord {
                id,
                ..Default::default()
            })
        }
    }

    fn resolver(
        index: Arc<dyn StoryIndex>,
        fetcher: Arc<RecordingFetcher>,
        n: usize,
    ) -> ListResolver {
        ListResolver::new(index, fetcher, n, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn takes_only_the_head_of_the_list() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let r = resolver(Arc::new(FixedIndex(vec![1, 2, 3, 4, 5])), fetcher.clone(), 3);

        let out = r.resolve().await.unwrap();

        let mut calls = fetcher.calls.lock().unwrap().clone();
        calls.sort_unstable();
        assert_eq!(calls, vec![1, 2, 3]);
        assert_eq!(out.len(), 3);
    }

    #[tokio::test]
    async fn short_list_is_used_whole() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let r = resolver(Arc::new(FixedIndex(vec![8, 9])), fetcher.clone(), 10);

        let out = r.resolve().await.unwrap();

        assert_eq!(out.len(), 2);
        assert!(out.iter().all(FetchOutcome::is_resolved));
    }

    #[tokio::test]
    async fn list_failure_skips_aggregation() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let r = resolver(Arc::new(BrokenIndex), fetcher.clone(), 10);

        let err = r.resolve().await.unwrap_err();

        assert_eq!(err.kind(), "status");
        assert!(fetcher.calls.lock().unwrap().is_empty());
    }
}

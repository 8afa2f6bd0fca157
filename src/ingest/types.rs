// src/ingest/types.rs
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of one Hacker News item (stories, jobs and comments share one counter).
pub type ItemId = u64;

/// A resolved item. Every field but `id` is optional upstream and defaults to
/// zero/empty, whether it is absent or sent as `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ItemRecord {
    pub id: ItemId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub time: u64, // unix seconds
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub by: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String, // empty for text-only items (Ask HN etc.)
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("could not parse response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{url} returned no item")]
    Missing { url: String },
}

impl FetchError {
    /// Short label used for logs and the `kind` metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport { .. } => "transport",
            FetchError::Status { .. } => "status",
            FetchError::Decode { .. } => "decode",
            FetchError::Missing { .. } => "missing",
        }
    }
}

/// Result of resolving one identifier.
#[derive(Debug)]
pub enum FetchOutcome {
    Resolved(ItemRecord),
    Failed { id: ItemId, error: FetchError },
}

impl FetchOutcome {
    pub fn id(&self) -> ItemId {
        match self {
            FetchOutcome::Resolved(item) => item.id,
            FetchOutcome::Failed { id, .. } => *id,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, FetchOutcome::Resolved(_))
    }
}

/// Outcomes collected by one aggregation, in arrival order.
pub type BatchResult = Vec<FetchOutcome>;

/// Resolves one identifier with exactly one remote call. Implementations must not retry.
#[async_trait::async_trait]
pub trait ItemFetcher: Send + Sync {
    async fn fetch_item(&self, id: ItemId) -> Result<ItemRecord, FetchError>;
}

/// Source of the ranked identifier list.
#[async_trait::async_trait]
pub trait StoryIndex: Send + Sync {
    async fn ranked_ids(&self) -> Result<Vec<ItemId>, FetchError>;
    fn name(&self) -> &'static str;
}

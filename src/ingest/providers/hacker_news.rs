// src/ingest/providers/hacker_news.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::ingest::types::{FetchError, ItemFetcher, ItemId, ItemRecord, StoryIndex};

pub const DEFAULT_API_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";

const USER_AGENT: &str = concat!("hackerbeat/", env!("CARGO_PKG_VERSION"));

/// Which ranked list to poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryFeed {
    #[default]
    Top,
    New,
    Best,
}

impl StoryFeed {
    fn path(self) -> &'static str {
        match self {
            StoryFeed::Top => "topstories.json",
            StoryFeed::New => "newstories.json",
            StoryFeed::Best => "beststories.json",
        }
    }
}

/// Client for the public Hacker News Firebase API.
#[derive(Clone)]
pub struct HackerNewsClient {
    base_url: String,
    feed: StoryFeed,
    client: Client,
}

impl HackerNewsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            feed: StoryFeed::Top,
            client: Client::new(),
        }
    }

    pub fn with_feed(mut self, feed: StoryFeed) -> Self {
        self.feed = feed;
        self
    }

    /// Rebuild the underlying HTTP client with a per-request timeout.
    /// Without one, a request that never answers is simply abandoned by the aggregator.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        self.client = builder.build().context("building hacker news http client")?;
        Ok(self)
    }

    pub fn list_url(&self) -> String {
        format!("{}/{}", self.base_url, self.feed.path())
    }

    pub fn item_url(&self, id: ItemId) -> String {
        format!("{}/item/{}.json", self.base_url, id)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, FetchError> {
        let resp = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(source) => return Err(FetchError::Transport { url, source }),
        };

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = match resp.bytes().await {
            Ok(b) => b,
            Err(source) => return Err(FetchError::Transport { url, source }),
        };
        serde_json::from_slice(&body).map_err(|source| FetchError::Decode { url, source })
    }
}

#[async_trait]
impl ItemFetcher for HackerNewsClient {
    async fn fetch_item(&self, id: ItemId) -> Result<ItemRecord, FetchError> {
        let url = self.item_url(id);
        // The API answers `null` for ids it does not know.
        let item: Option<ItemRecord> = self.get_json(url.clone()).await?;
        let item = item.ok_or(FetchError::Missing { url })?;
        tracing::debug!(id, title = %item.title, "resolved item");
        Ok(item)
    }
}

#[async_trait]
impl StoryIndex for HackerNewsClient {
    async fn ranked_ids(&self) -> Result<Vec<ItemId>, FetchError> {
        self.get_json(self.list_url()).await
    }

    fn name(&self) -> &'static str {
        match self.feed {
            StoryFeed::Top => "HN top",
            StoryFeed::New => "HN new",
            StoryFeed::Best => "HN best",
        }
    }
}

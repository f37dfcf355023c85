//! Source adapters: one fetch-and-parse unit per kind of upstream.

pub mod db;
pub mod json_api;
pub mod rss;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::article::{NormalizedArticle, SourceKind};
use crate::error::SourceError;

pub use db::{DbAdapter, StorageResolver, StorageViewUrl};
pub use json_api::JsonApiAdapter;
pub use rss::RssAdapter;

const USER_AGENT: &str = "Newsline/0.1 (News Aggregator)";

/// Per-feed parameters handed to an adapter on every fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    pub feed: String,
    pub category: String,
    pub limit: usize,
}

impl FeedRequest {
    pub fn new(feed: impl Into<String>, category: impl Into<String>, limit: usize) -> Self {
        Self {
            feed: feed.into(),
            category: category.into(),
            limit,
        }
    }
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Fetch and normalize one batch. Zero usable items is `SourceError::EmptyResult`.
    async fn fetch(&self, request: &FeedRequest) -> Result<Vec<NormalizedArticle>, SourceError>;
}

pub fn build_http_client() -> anyhow::Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// GET `url` and return the body, mapping non-success statuses to transport errors.
pub(crate) async fn get_text(client: &Client, url: &str) -> Result<String, SourceError> {
    debug!("GET {}", url);
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::status(status.as_u16()));
    }
    Ok(response.text().await?)
}

/// GET `url` and return the undecoded body.
pub(crate) async fn get_bytes(client: &Client, url: &str) -> Result<Vec<u8>, SourceError> {
    debug!("GET {}", url);
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::status(status.as_u16()));
    }
    Ok(response.bytes().await?.to_vec())
}

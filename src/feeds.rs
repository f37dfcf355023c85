//! Configured feeds and the adapter serving each one.

use std::sync::Arc;

use anyhow::anyhow;
use reqwest::Client;
use tracing::info;

use crate::adapters::{
    DbAdapter, FeedRequest, JsonApiAdapter, RssAdapter, SourceAdapter, StorageResolver,
    StorageViewUrl,
};
use crate::article::{PlaceholderImages, SourceKind};
use crate::config::{Config, FeedConfig, FeedKind};
use crate::db::Database;

pub struct Feed {
    pub key: String,
    pub request: FeedRequest,
    pub adapter: Arc<dyn SourceAdapter>,
}

impl Feed {
    pub fn kind(&self) -> SourceKind {
        self.adapter.kind()
    }
}

/// Feeds in configuration order.
#[derive(Default)]
pub struct FeedRegistry {
    feeds: Vec<Feed>,
}

impl FeedRegistry {
    pub fn new(feeds: Vec<Feed>) -> Self {
        Self { feeds }
    }

    pub fn from_config(config: &Config, client: Client, db: Arc<Database>) -> anyhow::Result<Self> {
        let placeholders = PlaceholderImages::new(config.sources.placeholder_base.clone());
        let resolver: Arc<dyn StorageResolver> = Arc::new(StorageViewUrl {
            endpoint: config.sources.storage_endpoint.clone(),
            project: config.sources.storage_project.clone(),
            bucket: config.sources.storage_bucket.clone(),
        });

        let feeds = config
            .feeds
            .iter()
            .map(|feed| -> anyhow::Result<Feed> {
                let adapter = build_adapter(feed, config, &client, &db, &resolver, &placeholders)?;
                Ok(Feed {
                    key: feed.key.clone(),
                    request: FeedRequest::new(feed.key.clone(), feed.category(), feed.limit),
                    adapter,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        info!("Registered {} feeds", feeds.len());
        Ok(Self::new(feeds))
    }

    pub fn get(&self, key: &str) -> Option<&Feed> {
        self.feeds.iter().find(|f| f.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feed> {
        self.feeds.iter()
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}

fn build_adapter(
    feed: &FeedConfig,
    config: &Config,
    client: &Client,
    db: &Arc<Database>,
    resolver: &Arc<dyn StorageResolver>,
    placeholders: &PlaceholderImages,
) -> anyhow::Result<Arc<dyn SourceAdapter>> {
    let adapter: Arc<dyn SourceAdapter> = match feed.kind {
        FeedKind::Api => {
            let mut adapter = JsonApiAdapter::new(client.clone(), config.sources.api_base_url.clone())
                .with_placeholders(placeholders.clone());
            if let Some(template) = &feed.url {
                adapter = adapter.with_url_template(template.clone());
            }
            if let Some(author) = &feed.author {
                adapter = adapter.with_author(author.clone());
            }
            Arc::new(adapter)
        }
        FeedKind::Rss => {
            let url = feed
                .url
                .clone()
                .ok_or_else(|| anyhow!("rss feed '{}' needs a url", feed.key))?;
            let mut adapter = RssAdapter::new(client.clone(), url)
                .with_proxy(config.sources.rss_proxy.clone())
                .with_placeholders(placeholders.clone());
            if let Some(author) = &feed.author {
                adapter = adapter.with_author(author.clone());
            }
            Arc::new(adapter)
        }
        FeedKind::Db => {
            let collection = feed
                .collection
                .clone()
                .ok_or_else(|| anyhow!("db feed '{}' needs a collection", feed.key))?;
            let mut adapter = DbAdapter::new(db.clone(), collection, resolver.clone())
                .with_placeholders(placeholders.clone());
            if let Some(author) = &feed.author {
                adapter = adapter.with_author(author.clone());
            }
            Arc::new(adapter)
        }
    };
    Ok(adapter)
}

//! Per-feed load orchestration: fresh cache, live fetch with retry, stale cache, synthetic.

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::adapters::{FeedRequest, SourceAdapter};
use crate::article::{NormalizedArticle, SourceKind};
use crate::cache::TtlCache;
use crate::error::RetryError;
use crate::fallback::{FallbackGenerator, DEFAULT_SYNTHETIC_COUNT};
use crate::feeds::FeedRegistry;
use crate::retry::{CancelToken, RetryPolicy, RetryingFetcher};

/// Which step of the load produced the articles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOrigin {
    FreshCache,
    Live,
    StaleCache,
    Synthetic,
}

impl LoadOrigin {
    pub fn is_degraded(&self) -> bool {
        matches!(self, LoadOrigin::StaleCache | LoadOrigin::Synthetic)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedLoad {
    pub feed: String,
    pub origin: LoadOrigin,
    pub articles: Vec<NormalizedArticle>,
}

/// Cache key for a feed: `business` is stored under `businessData`.
pub fn cache_key(feed: &str) -> String {
    format!("{}Data", feed)
}

pub struct AggregationService {
    cache: TtlCache,
    fetcher: RetryingFetcher,
    fallback: FallbackGenerator,
    synthetic_count: usize,
}

impl AggregationService {
    pub fn new(
        cache: TtlCache,
        policy: RetryPolicy,
        fallback: FallbackGenerator,
        synthetic_count: usize,
    ) -> Self {
        Self {
            cache,
            fetcher: RetryingFetcher::new(policy),
            fallback,
            synthetic_count,
        }
    }

    pub fn with_defaults(cache: TtlCache) -> Self {
        Self::new(
            cache,
            RetryPolicy::default(),
            FallbackGenerator::default(),
            DEFAULT_SYNTHETIC_COUNT,
        )
    }

    pub async fn load(&self, adapter: &dyn SourceAdapter, request: &FeedRequest) -> FeedLoad {
        self.load_with_cancel(adapter, request, &CancelToken::new())
            .await
    }

    /// Always resolves with articles. Once `cancel` fires no further attempt
    /// is made and nothing is written to the cache.
    pub async fn load_with_cancel(
        &self,
        adapter: &dyn SourceAdapter,
        request: &FeedRequest,
        cancel: &CancelToken,
    ) -> FeedLoad {
        let feed = request.feed.as_str();
        let key = cache_key(feed);

        if let Some(entry) = self.cache.get(&key).await {
            if self.cache.is_fresh(&entry) {
                debug!("Cache hit for '{}' ({} articles)", feed, entry.articles.len());
                return FeedLoad {
                    feed: feed.to_string(),
                    origin: LoadOrigin::FreshCache,
                    articles: entry.articles,
                };
            }
        }

        let result = self
            .fetcher
            .run(move || adapter.fetch(request), cancel)
            .await;

        match result {
            Ok(articles) if articles.is_empty() => {
                warn!("{} source for '{}' returned no articles", adapter.kind().as_str(), feed);
            }
            Ok(articles) => {
                if cancel.is_cancelled() {
                    info!("Load of '{}' cancelled, discarding fetched articles", feed);
                } else {
                    self.cache.put(&key, &articles).await;
                    info!("Loaded {} live articles for '{}'", articles.len(), feed);
                    return FeedLoad {
                        feed: feed.to_string(),
                        origin: LoadOrigin::Live,
                        articles,
                    };
                }
            }
            Err(RetryError::Cancelled { attempts }) => {
                info!("Load of '{}' cancelled after {} attempts", feed, attempts);
            }
            Err(e @ RetryError::Exhausted { .. }) => {
                warn!("Live fetch for '{}' failed: {}", feed, e);
            }
        }

        self.degrade(feed, &key).await
    }

    async fn degrade(&self, feed: &str, key: &str) -> FeedLoad {
        if let Some(entry) = self.cache.get(key).await {
            warn!(
                "Serving {} stale cached articles for '{}'",
                entry.articles.len(),
                feed
            );
            return FeedLoad {
                feed: feed.to_string(),
                origin: LoadOrigin::StaleCache,
                articles: entry.articles,
            };
        }

        warn!("No cache for '{}', serving synthetic articles", feed);
        FeedLoad {
            feed: feed.to_string(),
            origin: LoadOrigin::Synthetic,
            articles: self.fallback.generate(feed, self.synthetic_count),
        }
    }

    /// Drop the cached entry and load again.
    pub async fn refresh(&self, adapter: &dyn SourceAdapter, request: &FeedRequest) -> FeedLoad {
        info!("Manual refresh of '{}'", request.feed);
        self.cache.clear(&cache_key(&request.feed)).await;
        self.load(adapter, request).await
    }

    async fn load_all(&self, registry: &FeedRegistry) -> Vec<FeedLoad> {
        join_all(
            registry
                .iter()
                .map(|feed| self.load(feed.adapter.as_ref(), &feed.request)),
        )
        .await
    }

    /// Every feed merged, newest first.
    pub async fn latest(&self, registry: &FeedRegistry, limit: usize) -> Vec<NormalizedArticle> {
        let mut articles: Vec<NormalizedArticle> = self
            .load_all(registry)
            .await
            .into_iter()
            .flat_map(|load| load.articles)
            .collect();
        newest_first(&mut articles);
        articles.truncate(limit);
        articles
    }

    /// Case-insensitive title/summary match across every feed. Placeholder
    /// articles never match.
    pub async fn search(
        &self,
        registry: &FeedRegistry,
        query: &str,
        limit: usize,
    ) -> Vec<NormalizedArticle> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut articles: Vec<NormalizedArticle> = self
            .load_all(registry)
            .await
            .into_iter()
            .flat_map(|load| load.articles)
            .filter(|a| a.source_kind() != SourceKind::Synthetic && a.matches(&needle))
            .collect();
        newest_first(&mut articles);
        articles.truncate(limit);
        articles
    }
}

fn newest_first(articles: &mut [NormalizedArticle]) {
    articles.sort_by(|a, b| b.published_at().cmp(&a.published_at()));
}

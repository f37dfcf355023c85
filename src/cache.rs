//! Time-to-live article cache over a [`KeyValueStore`].
//!
//! Each entry occupies two keys: `<key>` holds the JSON article array and
//! `<key>Timestamp` the fetch time in epoch milliseconds. Stale entries are
//! kept so they can serve as a last-resort fallback. Storage failures are
//! logged here and never reach callers.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::article::NormalizedArticle;
use crate::error::StorageError;
use crate::store::KeyValueStore;

pub const CACHE_TTL: Duration = Duration::from_secs(15 * 60);

const TIMESTAMP_SUFFIX: &str = "Timestamp";

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub articles: Vec<NormalizedArticle>,
    pub fetched_at_epoch_ms: i64,
}

impl CacheEntry {
    pub fn is_fresh_at(&self, now_epoch_ms: i64) -> bool {
        now_epoch_ms - self.fetched_at_epoch_ms < CACHE_TTL.as_millis() as i64
    }
}

pub fn timestamp_key(key: &str) -> String {
    format!("{}{}", key, TIMESTAMP_SUFFIX)
}

#[derive(Clone)]
pub struct TtlCache {
    store: Arc<dyn KeyValueStore>,
}

impl TtlCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read an entry regardless of age. Missing, partial or corrupt entries read as absent.
    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        match self.read(key).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Ignoring cache entry '{}': {}", key, e);
                None
            }
        }
    }

    async fn read(&self, key: &str) -> Result<Option<CacheEntry>, StorageError> {
        let Some(raw_articles) = self.store.get(key).await? else {
            return Ok(None);
        };
        let Some(raw_timestamp) = self.store.get(&timestamp_key(key)).await? else {
            return Ok(None);
        };

        let fetched_at_epoch_ms =
            raw_timestamp
                .trim()
                .parse::<i64>()
                .map_err(|e| StorageError::Corrupt {
                    key: timestamp_key(key),
                    reason: e.to_string(),
                })?;
        let articles: Vec<NormalizedArticle> =
            serde_json::from_str(&raw_articles).map_err(|e| StorageError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Some(CacheEntry {
            key: key.to_string(),
            articles,
            fetched_at_epoch_ms,
        }))
    }

    /// Store `articles` as fetched now, replacing any previous entry.
    pub async fn put(&self, key: &str, articles: &[NormalizedArticle]) {
        if let Err(e) = self.write(key, articles, Utc::now().timestamp_millis()).await {
            warn!("Failed to cache '{}', next load will refetch: {}", key, e);
        } else {
            debug!("Cached {} articles under '{}'", articles.len(), key);
        }
    }

    async fn write(
        &self,
        key: &str,
        articles: &[NormalizedArticle],
        fetched_at_epoch_ms: i64,
    ) -> Result<(), StorageError> {
        let payload = serde_json::to_string(articles).map_err(|e| StorageError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.store.set(key, &payload).await?;
        self.store
            .set(&timestamp_key(key), &fetched_at_epoch_ms.to_string())
            .await
    }

    pub fn is_fresh(&self, entry: &CacheEntry) -> bool {
        entry.is_fresh_at(Utc::now().timestamp_millis())
    }

    pub async fn clear(&self, key: &str) {
        for k in [key.to_string(), timestamp_key(key)] {
            if let Err(e) = self.store.remove(&k).await {
                warn!("Failed to clear cache key '{}': {}", k, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{ArticleDraft, Normalizer, SourceKind};
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    fn sample_articles(n: usize) -> Vec<NormalizedArticle> {
        let drafts = (0..n)
            .map(|i| ArticleDraft {
                title: Some(format!("Story {}", i)),
                summary: Some("Body".to_string()),
                ..Default::default()
            })
            .collect();
        Normalizer::new(SourceKind::Api, "business").normalize(drafts)
    }

    fn cache_with_store() -> (TtlCache, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (TtlCache::new(store.clone()), store)
    }

    /// Store whose writes always fail, as if over quota.
    struct FullStore;

    #[async_trait]
    impl KeyValueStore for FullStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Backend("quota exceeded".to_string()))
        }

        async fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Backend("unavailable".to_string()))
        }
    }

    mod freshness_tests {
        use super::*;

        fn entry_at(fetched_at_epoch_ms: i64) -> CacheEntry {
            CacheEntry {
                key: "k".to_string(),
                articles: vec![],
                fetched_at_epoch_ms,
            }
        }

        #[test]
        fn test_fresh_within_ttl() {
            let now = 10_000_000;
            assert!(entry_at(now).is_fresh_at(now));
            assert!(entry_at(now - 14 * 60 * 1000).is_fresh_at(now));
        }

        #[test]
        fn test_stale_at_exactly_ttl() {
            let now = 10_000_000;
            assert!(!entry_at(now - 15 * 60 * 1000).is_fresh_at(now));
            assert!(!entry_at(now - 60 * 60 * 1000).is_fresh_at(now));
        }
    }

    mod read_write_tests {
        use super::*;

        #[tokio::test]
        async fn test_get_missing() {
            let (cache, _) = cache_with_store();
            assert!(cache.get("businessData").await.is_none());
        }

        #[tokio::test]
        async fn test_put_then_get() {
            let (cache, store) = cache_with_store();
            let articles = sample_articles(3);
            cache.put("businessData", &articles).await;

            let entry = cache.get("businessData").await.unwrap();
            assert_eq!(entry.key, "businessData");
            assert_eq!(entry.articles, articles);
            assert!(cache.is_fresh(&entry));

            assert!(store.get("businessData").await.unwrap().is_some());
            assert!(store
                .get("businessDataTimestamp")
                .await
                .unwrap()
                .is_some());
        }

        #[tokio::test]
        async fn test_put_overwrites() {
            let (cache, _) = cache_with_store();
            cache.put("k", &sample_articles(3)).await;
            cache.put("k", &sample_articles(1)).await;
            assert_eq!(cache.get("k").await.unwrap().articles.len(), 1);
        }

        #[tokio::test]
        async fn test_stale_entry_still_readable() {
            let (cache, store) = cache_with_store();
            cache.put("k", &sample_articles(2)).await;
            let old = Utc::now().timestamp_millis() - 16 * 60 * 1000;
            store.set("kTimestamp", &old.to_string()).await.unwrap();

            let entry = cache.get("k").await.unwrap();
            assert_eq!(entry.articles.len(), 2);
            assert!(!cache.is_fresh(&entry));
        }

        #[tokio::test]
        async fn test_clear_removes_both_keys() {
            let (cache, store) = cache_with_store();
            cache.put("k", &sample_articles(1)).await;
            cache.clear("k").await;

            assert!(cache.get("k").await.is_none());
            assert!(store.is_empty().await);
        }
    }

    mod corruption_tests {
        use super::*;

        #[tokio::test]
        async fn test_corrupt_articles_read_as_absent() {
            let (cache, store) = cache_with_store();
            store.set("k", "{not json").await.unwrap();
            store.set("kTimestamp", "1700000000000").await.unwrap();
            assert!(cache.get("k").await.is_none());
        }

        #[tokio::test]
        async fn test_corrupt_timestamp_reads_as_absent() {
            let (cache, store) = cache_with_store();
            store.set("k", "[]").await.unwrap();
            store.set("kTimestamp", "yesterday").await.unwrap();
            assert!(cache.get("k").await.is_none());
        }

        #[tokio::test]
        async fn test_missing_timestamp_reads_as_absent() {
            let (cache, store) = cache_with_store();
            store.set("k", "[]").await.unwrap();
            assert!(cache.get("k").await.is_none());
        }

        #[tokio::test]
        async fn test_write_failures_are_absorbed() {
            let cache = TtlCache::new(Arc::new(FullStore));
            cache.put("k", &sample_articles(1)).await;
            cache.clear("k").await;
            assert!(cache.get("k").await.is_none());
        }
    }
}

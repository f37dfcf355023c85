use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::bail;
use serde::Deserialize;

use crate::adapters::rss::DEFAULT_PROXY;
use crate::article::DEFAULT_PLACEHOLDER_BASE;
use crate::fallback::DEFAULT_SYNTHETIC_COUNT;
use crate::retry::{RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};
use crate::taxonomy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Articles generated when a feed has neither live nor cached data
    #[serde(default = "default_synthetic_count")]
    pub synthetic_count: usize,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_database_url() -> String {
    "sqlite:newsline.db?mode=rwc".to_string()
}

fn default_synthetic_count() -> usize {
    DEFAULT_SYNTHETIC_COUNT
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    /// Total tries per load, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY.as_millis() as u64
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourcesConfig {
    pub api_base_url: String,
    /// Prefix the URL-encoded RSS address is appended to
    pub rss_proxy: String,
    pub placeholder_base: String,
    pub storage_endpoint: String,
    pub storage_project: String,
    pub storage_bucket: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            rss_proxy: DEFAULT_PROXY.to_string(),
            placeholder_base: DEFAULT_PLACEHOLDER_BASE.to_string(),
            storage_endpoint: "https://cloud.appwrite.io/v1".to_string(),
            storage_project: String::new(),
            storage_bucket: "images".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Api,
    Rss,
    Db,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    pub key: String,
    pub kind: FeedKind,
    /// Defaults to the key's prefix, e.g. `business` for `business-api`
    pub category: Option<String>,
    /// URL template for `api` feeds, target feed address for `rss` feeds
    pub url: Option<String>,
    pub collection: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub author: Option<String>,
}

/// Items requested per fetch from API and DB feeds. RSS feeds keep every item.
pub const DEFAULT_FEED_LIMIT: usize = 15;

fn default_limit() -> usize {
    DEFAULT_FEED_LIMIT
}

impl FeedConfig {
    pub fn category(&self) -> String {
        match self.category.as_deref().map(str::trim) {
            Some(category) if !category.is_empty() => category.to_string(),
            _ => taxonomy::category_for_feed(&self.key),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }

        let mut seen = HashSet::new();
        for feed in &self.feeds {
            if feed.key.trim().is_empty() {
                bail!("feed key must not be empty");
            }
            if !seen.insert(feed.key.as_str()) {
                bail!("duplicate feed key '{}'", feed.key);
            }
            match feed.kind {
                FeedKind::Rss if feed.url.is_none() => {
                    bail!("rss feed '{}' needs a url", feed.key)
                }
                FeedKind::Db if feed.collection.is_none() => {
                    bail!("db feed '{}' needs a collection", feed.key)
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::from_str("").unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:3000");
        assert_eq!(config.database_url, "sqlite:newsline.db?mode=rwc");
        assert_eq!(config.synthetic_count, 15);
        assert_eq!(config.retry.policy(), RetryPolicy::default());
        assert_eq!(config.sources.rss_proxy, "https://api.allorigins.win/raw?url=");
        assert_eq!(config.sources.placeholder_base, "https://picsum.photos/seed");
        assert!(config.feeds.is_empty());
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
            listen_addr = "127.0.0.1:8080"
            synthetic_count = 6

            [retry]
            max_attempts = 5
            base_delay_ms = 250

            [sources]
            api_base_url = "https://api.example.com"

            [[feeds]]
            key = "business-api"
            kind = "api"

            [[feeds]]
            key = "sports-rss"
            kind = "rss"
            url = "https://feeds.example.com/sports.xml"
            author = "Wire"
            limit = 10

            [[feeds]]
            key = "local"
            kind = "db"
            category = "general"
            collection = "articles"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.synthetic_count, 6);
        assert_eq!(config.retry.policy().max_attempts, 5);
        assert_eq!(
            config.retry.policy().base_delay,
            Duration::from_millis(250)
        );
        assert_eq!(config.sources.api_base_url, "https://api.example.com");
        assert_eq!(config.sources.storage_bucket, "images");

        assert_eq!(config.feeds.len(), 3);
        assert_eq!(config.feeds[0].kind, FeedKind::Api);
        assert_eq!(config.feeds[0].category(), "business");
        assert_eq!(config.feeds[0].limit, 15);
        assert_eq!(config.feeds[1].kind, FeedKind::Rss);
        assert_eq!(config.feeds[1].author.as_deref(), Some("Wire"));
        assert_eq!(config.feeds[1].limit, 10);
        assert_eq!(config.feeds[2].category(), "general");
        assert_eq!(config.feeds[2].collection.as_deref(), Some("articles"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = Config::load("/nonexistent/path/feeds.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let content = "this is not valid toml {{{";

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();

        let result = Config::load(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_feed_kind() {
        let content = r#"
            [[feeds]]
            key = "x"
            kind = "carrier-pigeon"
        "#;
        assert!(Config::from_str(content).is_err());
    }

    #[test]
    fn test_rss_feed_requires_url() {
        let content = r#"
            [[feeds]]
            key = "sports-rss"
            kind = "rss"
        "#;
        let err = Config::from_str(content).unwrap_err();
        assert!(err.to_string().contains("needs a url"));
    }

    #[test]
    fn test_db_feed_requires_collection() {
        let content = r#"
            [[feeds]]
            key = "local"
            kind = "db"
        "#;
        let err = Config::from_str(content).unwrap_err();
        assert!(err.to_string().contains("needs a collection"));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let content = r#"
            [[feeds]]
            key = "business"
            kind = "api"

            [[feeds]]
            key = "business"
            kind = "api"
        "#;
        let err = Config::from_str(content).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_empty_key_rejected() {
        let content = r#"
            [[feeds]]
            key = "  "
            kind = "api"
        "#;
        assert!(Config::from_str(content).is_err());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let content = r#"
            [retry]
            max_attempts = 0
        "#;
        assert!(Config::from_str(content).is_err());
    }

    #[test]
    fn test_blank_category_falls_back_to_key_prefix() {
        let content = r#"
            [[feeds]]
            key = "entertainment_api"
            kind = "api"
            category = ""
        "#;
        let config = Config::from_str(content).unwrap();
        assert_eq!(config.feeds[0].category(), "entertainment");
    }
}

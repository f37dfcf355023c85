//! RSS feeds fetched through a CORS-style raw proxy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;
use reqwest::Client;
use tracing::{debug, info};

use super::{get_bytes, FeedRequest, SourceAdapter};
use crate::article::{
    first_img_src, ArticleDraft, NormalizedArticle, Normalizer, PlaceholderImages, SourceKind,
};
use crate::error::SourceError;

pub const DEFAULT_PROXY: &str = "https://api.allorigins.win/raw?url=";

pub struct RssAdapter {
    client: Client,
    proxy_prefix: String,
    feed_url: String,
    author: Option<String>,
    placeholders: PlaceholderImages,
}

impl RssAdapter {
    pub fn new(client: Client, feed_url: impl Into<String>) -> Self {
        Self {
            client,
            proxy_prefix: DEFAULT_PROXY.to_string(),
            feed_url: feed_url.into(),
            author: None,
            placeholders: PlaceholderImages::default(),
        }
    }

    pub fn with_proxy(mut self, proxy_prefix: impl Into<String>) -> Self {
        self.proxy_prefix = proxy_prefix.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_placeholders(mut self, placeholders: PlaceholderImages) -> Self {
        self.placeholders = placeholders;
        self
    }

    /// The proxy prefix followed by the URL-encoded feed address.
    pub fn proxied_url(&self) -> String {
        format!(
            "{}{}",
            self.proxy_prefix,
            urlencoding::encode(&self.feed_url)
        )
    }

    pub fn parse_document(
        &self,
        xml: &[u8],
        request: &FeedRequest,
    ) -> Result<Vec<NormalizedArticle>, SourceError> {
        let feed = parser::parse(xml)?;

        // Every <item> becomes an article; `limit` does not apply to RSS.
        let drafts: Vec<ArticleDraft> = feed.entries.into_iter().map(draft_from_entry).collect();
        if drafts.is_empty() {
            return Err(SourceError::EmptyResult);
        }

        let normalizer = Normalizer::new(SourceKind::Rss, request.category.clone())
            .with_placeholders(self.placeholders.clone());
        let normalizer = match &self.author {
            Some(author) => normalizer.with_author(author.clone()),
            None => normalizer,
        };
        Ok(normalizer.normalize(drafts))
    }
}

#[async_trait]
impl SourceAdapter for RssAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Rss
    }

    async fn fetch(&self, request: &FeedRequest) -> Result<Vec<NormalizedArticle>, SourceError> {
        info!("Fetching RSS feed '{}' ({})", request.feed, self.feed_url);

        // Raw bytes so the XML prolog decides the encoding.
        let body = get_bytes(&self.client, &self.proxied_url()).await?;
        let articles = self.parse_document(&body, request)?;

        debug!("Parsed {} RSS items for '{}'", articles.len(), request.feed);
        Ok(articles)
    }
}

fn draft_from_entry(entry: Entry) -> ArticleDraft {
    let raw_summary = entry
        .summary
        .map(|t| t.content)
        .or_else(|| entry.content.and_then(|c| c.body));

    // media:thumbnail first, then the first <img> inside the description.
    let image = entry
        .media
        .iter()
        .flat_map(|m| m.thumbnails.iter())
        .map(|t| t.image.uri.clone())
        .find(|uri| !uri.trim().is_empty())
        .or_else(|| raw_summary.as_deref().and_then(first_img_src));

    let published: Option<DateTime<Utc>> = entry.published.or(entry.updated);

    ArticleDraft {
        id: Some(entry.id),
        title: entry.title.map(|t| t.content),
        summary: raw_summary,
        image,
        published,
        link: entry.links.first().map(|l| l.href.clone()),
        author: entry.authors.first().map(|p| p.name.clone()),
        category: None,
        subcategory: None,
    }
}

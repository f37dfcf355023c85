//! JSON REST backend adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::{get_text, FeedRequest, SourceAdapter};
use crate::article::{
    from_epoch, parse_timestamp, ArticleDraft, NormalizedArticle, Normalizer, PlaceholderImages,
    SourceKind,
};
use crate::error::SourceError;

pub const DEFAULT_URL_TEMPLATE: &str = "{base}/api/news?category={category}&limit={limit}";

const SUMMARY_FIELDS: &[&str] = &["description", "summary", "content"];
const IMAGE_FIELDS: &[&str] = &["image_url", "image", "urlToImage"];
const DATE_FIELDS: &[&str] = &["pubDate", "publishedAt", "date"];
const ID_FIELDS: &[&str] = &["article_id", "id"];
const LINK_FIELDS: &[&str] = &["link", "url"];

pub struct JsonApiAdapter {
    client: Client,
    base_url: String,
    url_template: String,
    author: Option<String>,
    placeholders: PlaceholderImages,
}

impl JsonApiAdapter {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            author: None,
            placeholders: PlaceholderImages::default(),
        }
    }

    /// Template placeholders: `{base}`, `{feed}`, `{category}`, `{limit}`.
    pub fn with_url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = template.into();
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

    pub fn url_for(&self, request: &FeedRequest) -> String {
        self.url_template
            .replace("{base}", self.base_url.trim_end_matches('/'))
            .replace("{feed}", &urlencoding::encode(&request.feed))
            .replace("{category}", &urlencoding::encode(&request.category))
            .replace("{limit}", &request.limit.to_string())
    }

    fn normalizer(&self, request: &FeedRequest) -> Normalizer {
        let normalizer = Normalizer::new(SourceKind::Api, request.category.clone())
            .with_placeholders(self.placeholders.clone());
        match &self.author {
            Some(author) => normalizer.with_author(author.clone()),
            None => normalizer,
        }
    }

    /// Parse a response body into articles without any I/O.
    pub fn parse_body(
        &self,
        body: &str,
        request: &FeedRequest,
    ) -> Result<Vec<NormalizedArticle>, SourceError> {
        let payload: Value = serde_json::from_str(body)?;
        let items = extract_items(&payload)?;

        let mut drafts: Vec<ArticleDraft> = items
            .iter()
            .filter_map(Value::as_object)
            .map(draft_from_item)
            .filter(ArticleDraft::has_content)
            .collect();

        if drafts.is_empty() {
            return Err(SourceError::EmptyResult);
        }
        if request.limit > 0 {
            drafts.truncate(request.limit);
        }

        Ok(self.normalizer(request).normalize(drafts))
    }
}

#[async_trait]
impl SourceAdapter for JsonApiAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Api
    }

    async fn fetch(&self, request: &FeedRequest) -> Result<Vec<NormalizedArticle>, SourceError> {
        let url = self.url_for(request);
        info!("Fetching API feed '{}' from {}", request.feed, url);

        let body = get_text(&self.client, &url).await?;
        let articles = self.parse_body(&body, request)?;

        debug!("Parsed {} API articles for '{}'", articles.len(), request.feed);
        Ok(articles)
    }
}

/// Locate the article array: bare array, then `data`, then `articles`,
/// then the first array-valued field in document order.
pub fn extract_items(payload: &Value) -> Result<&Vec<Value>, SourceError> {
    match payload {
        Value::Array(items) => Ok(items),
        Value::Object(map) => ["data", "articles"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .or_else(|| map.values().find_map(Value::as_array))
            .ok_or_else(|| SourceError::Parse("response object has no array field".to_string())),
        other => Err(SourceError::Parse(format!(
            "unexpected response shape: {}",
            type_name(other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn draft_from_item(item: &Map<String, Value>) -> ArticleDraft {
    ArticleDraft {
        id: scalar_field(item, ID_FIELDS),
        title: scalar_field(item, &["title"]),
        summary: scalar_field(item, SUMMARY_FIELDS),
        image: scalar_field(item, IMAGE_FIELDS),
        published: published_field(item),
        link: scalar_field(item, LINK_FIELDS),
        author: list_or_string(item.get("author"), ", "),
        category: item.get("category").and_then(first_string),
        subcategory: None,
    }
}

/// First of `keys` holding a non-empty string or a number.
fn scalar_field(item: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match item.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn published_field(item: &Map<String, Value>) -> Option<chrono::DateTime<chrono::Utc>> {
    DATE_FIELDS.iter().find_map(|key| match item.get(*key) {
        Some(Value::String(s)) => parse_timestamp(s),
        Some(Value::Number(n)) => n.as_i64().and_then(from_epoch),
        _ => None,
    })
}

fn list_or_string(value: Option<&Value>, separator: &str) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Array(values) => {
            let parts: Vec<&str> = values
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            (!parts.is_empty()).then(|| parts.join(separator))
        }
        _ => None,
    }
}

fn first_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(values) => values.iter().find_map(|v| v.as_str().map(str::to_string)),
        _ => None,
    }
}

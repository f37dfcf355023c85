//! The canonical article record every source is normalized onto.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::taxonomy;

pub const NO_TITLE: &str = "No title available";
pub const NO_DESCRIPTION: &str = "No description available";
pub const DEFAULT_PLACEHOLDER_BASE: &str = "https://picsum.photos/seed";

/// Where an article came from. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceKind {
    Api,
    Rss,
    Db,
    Synthetic,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Api => "API",
            SourceKind::Rss => "RSS",
            SourceKind::Db => "DB",
            SourceKind::Synthetic => "SYNTHETIC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedArticle {
    id: String,
    title: String,
    summary: String,
    image: String,
    date: String,
    published_at: DateTime<Utc>,
    link: String,
    author: String,
    category: String,
    subcategory: String,
    source_kind: SourceKind,
}

impl NormalizedArticle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    /// Human-readable publish date, e.g. `January 1, 2024`.
    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn subcategory(&self) -> &str {
        &self.subcategory
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source_kind
    }

    /// Case-insensitive substring match over title and summary.
    pub fn matches(&self, needle_lowercase: &str) -> bool {
        self.title.to_lowercase().contains(needle_lowercase)
            || self.summary.to_lowercase().contains(needle_lowercase)
    }
}

/// Loosely-populated article as read from a source payload, before fallbacks apply.
#[derive(Debug, Clone, Default)]
pub struct ArticleDraft {
    pub id: Option<String>,
    pub title: Option<String>,
    /// Raw summary, possibly HTML.
    pub summary: Option<String>,
    pub image: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub link: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

impl ArticleDraft {
    /// False when no title, summary or link is present.
    pub fn has_content(&self) -> bool {
        [&self.title, &self.summary, &self.link]
            .iter()
            .any(|field| field.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

/// Deterministic placeholder image URLs keyed by a label and slot index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderImages {
    base: String,
}

impl PlaceholderImages {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn for_slot(&self, key: &str, index: usize) -> String {
        format!(
            "{}/{}-{}/800/450",
            self.base.trim_end_matches('/'),
            slug(key),
            index
        )
    }
}

impl Default for PlaceholderImages {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER_BASE)
    }
}

/// Turns drafts from one fetch batch into normalized articles.
#[derive(Debug, Clone)]
pub struct Normalizer {
    kind: SourceKind,
    category: String,
    author: String,
    placeholders: PlaceholderImages,
}

impl Normalizer {
    pub fn new(kind: SourceKind, category: impl Into<String>) -> Self {
        let author = match kind {
            SourceKind::Db | SourceKind::Synthetic => "System",
            SourceKind::Api | SourceKind::Rss => "News Staff",
        };
        Self {
            kind,
            category: category.into(),
            author: author.to_string(),
            placeholders: PlaceholderImages::default(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_placeholders(mut self, placeholders: PlaceholderImages) -> Self {
        self.placeholders = placeholders;
        self
    }

    pub fn normalize(&self, drafts: Vec<ArticleDraft>) -> Vec<NormalizedArticle> {
        let now = Utc::now();
        let mut seen = HashSet::with_capacity(drafts.len());

        drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| {
                let category = non_empty(draft.category).unwrap_or_else(|| self.category.clone());

                let title = non_empty(draft.title.map(|t| strip_html(&t)))
                    .unwrap_or_else(|| NO_TITLE.to_string());
                let summary = non_empty(draft.summary.map(|s| strip_html(&s)))
                    .unwrap_or_else(|| NO_DESCRIPTION.to_string());

                let subcategory = non_empty(draft.subcategory)
                    .or_else(|| {
                        let text = format!("{} {}", title, summary);
                        taxonomy::infer_subcategory(&category, &text).map(str::to_string)
                    })
                    .unwrap_or_else(|| taxonomy::DEFAULT_SUBCATEGORY.to_string());

                let image = non_empty(draft.image)
                    .unwrap_or_else(|| self.placeholders.for_slot(&category, index));

                let id = non_empty(draft.id).unwrap_or_else(|| {
                    format!("{}-{}-{}", slug(&category), index, now.timestamp_millis())
                });
                let id = unique_id(id, index, &mut seen);

                let published_at = draft.published.unwrap_or(now);

                NormalizedArticle {
                    id,
                    title,
                    summary,
                    image,
                    date: display_date(&published_at),
                    published_at,
                    link: draft.link.map(|l| l.trim().to_string()).unwrap_or_default(),
                    author: non_empty(draft.author).unwrap_or_else(|| self.author.clone()),
                    category,
                    subcategory,
                    source_kind: self.kind,
                }
            })
            .collect()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn unique_id(id: String, index: usize, seen: &mut HashSet<String>) -> String {
    let mut candidate = id.clone();
    let mut round = 0;
    while !seen.insert(candidate.clone()) {
        round += 1;
        candidate = if round == 1 {
            format!("{}-{}", id, index)
        } else {
            format!("{}-{}-{}", id, index, round)
        };
    }
    candidate
}

pub fn slug(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "news".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn display_date(dt: &DateTime<Utc>) -> String {
    dt.format("%B %-d, %Y").to_string()
}

/// Parse the timestamp shapes seen across sources.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Epoch seconds, or epoch milliseconds for values past 10^12.
pub fn from_epoch(value: i64) -> Option<DateTime<Utc>> {
    if value.abs() > 1_000_000_000_000 {
        Utc.timestamp_millis_opt(value).single()
    } else {
        Utc.timestamp_opt(value, 0).single()
    }
}

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<[^>]+>").unwrap());
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_IMG_SRC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).unwrap()
});

/// Drop tags, then decode entities and collapse whitespace.
/// Escaped brackets survive as literal text.
pub fn strip_html(input: &str) -> String {
    let without_tags = RE_TAGS.replace_all(input, " ");
    let decoded = html_escape::decode_html_entities(&without_tags);
    RE_WS.replace_all(&decoded, " ").trim().to_string()
}

/// `src` of the first `<img>` tag in an HTML fragment.
pub fn first_img_src(html: &str) -> Option<String> {
    RE_IMG_SRC
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

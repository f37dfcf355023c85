//! Document-collection adapter.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{FeedRequest, SourceAdapter};
use crate::article::{
    parse_timestamp, ArticleDraft, NormalizedArticle, Normalizer, PlaceholderImages, SourceKind,
};
use crate::db::{Database, Document};
use crate::error::SourceError;

/// Turns a stored image reference into a displayable URL.
pub trait StorageResolver: Send + Sync {
    fn resolve(&self, reference: &str) -> String;
}

/// File-view URLs of the form `{endpoint}/storage/buckets/{bucket}/files/{id}/view?project={project}`.
#[derive(Debug, Clone)]
pub struct StorageViewUrl {
    pub endpoint: String,
    pub project: String,
    pub bucket: String,
}

impl StorageResolver for StorageViewUrl {
    fn resolve(&self, reference: &str) -> String {
        let reference = reference.trim();
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return reference.to_string();
        }
        format!(
            "{}/storage/buckets/{}/files/{}/view?project={}",
            self.endpoint.trim_end_matches('/'),
            urlencoding::encode(&self.bucket),
            urlencoding::encode(reference),
            urlencoding::encode(&self.project)
        )
    }
}

pub struct DbAdapter {
    db: Arc<Database>,
    collection: String,
    resolver: Arc<dyn StorageResolver>,
    author: Option<String>,
    placeholders: PlaceholderImages,
}

impl DbAdapter {
    pub fn new(
        db: Arc<Database>,
        collection: impl Into<String>,
        resolver: Arc<dyn StorageResolver>,
    ) -> Self {
        Self {
            db,
            collection: collection.into(),
            resolver,
            author: None,
            placeholders: PlaceholderImages::default(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_placeholders(mut self, placeholders: PlaceholderImages) -> Self {
        self.placeholders = placeholders;
        self
    }

    fn draft_from_document(&self, doc: Document) -> ArticleDraft {
        let image = doc
            .image_ref
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(|r| self.resolver.resolve(r));

        ArticleDraft {
            subcategory: doc.tag_list().into_iter().next(),
            published: parse_timestamp(&doc.created_at),
            id: Some(doc.id),
            title: Some(doc.title),
            summary: Some(doc.content),
            image,
            link: None,
            author: doc.author,
            category: None,
        }
    }
}

#[async_trait]
impl SourceAdapter for DbAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Db
    }

    async fn fetch(&self, request: &FeedRequest) -> Result<Vec<NormalizedArticle>, SourceError> {
        info!(
            "Querying collection '{}' for feed '{}'",
            self.collection, request.feed
        );

        // SQLite treats a negative LIMIT as unbounded.
        let limit = if request.limit == 0 {
            -1
        } else {
            request.limit as i64
        };
        let documents = self.db.list_documents(&self.collection, limit).await?;
        if documents.is_empty() {
            return Err(SourceError::EmptyResult);
        }

        let drafts: Vec<ArticleDraft> = documents
            .into_iter()
            .map(|doc| self.draft_from_document(doc))
            .collect();

        let normalizer = Normalizer::new(SourceKind::Db, request.category.clone())
            .with_placeholders(self.placeholders.clone());
        let normalizer = match &self.author {
            Some(author) => normalizer.with_author(author.clone()),
            None => normalizer,
        };
        let articles = normalizer.normalize(drafts);

        debug!("Mapped {} documents for '{}'", articles.len(), request.feed);
        Ok(articles)
    }
}

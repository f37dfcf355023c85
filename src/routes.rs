use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::article::{NormalizedArticle, SourceKind};
use crate::feeds::{Feed, FeedRegistry};
use crate::service::{AggregationService, FeedLoad};

const DEFAULT_LIMIT: usize = 15;

pub struct AppState {
    pub service: Arc<AggregationService>,
    pub feeds: Arc<FeedRegistry>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/feeds", get(list_feeds))
        .route("/api/feeds/:key", get(get_feed))
        .route("/api/feeds/:key/refresh", post(refresh_feed))
        .route("/api/latest", get(latest))
        .route("/api/search", get(search))
        .with_state(state)
}

// Custom error type
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct FeedSummary {
    pub key: String,
    pub category: String,
    pub kind: SourceKind,
}

impl From<&Feed> for FeedSummary {
    fn from(feed: &Feed) -> Self {
        Self {
            key: feed.key.clone(),
            category: feed.request.category.clone(),
            kind: feed.kind(),
        }
    }
}

#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

fn find_feed<'a>(state: &'a AppState, key: &str) -> Result<&'a Feed, AppError> {
    state
        .feeds
        .get(key)
        .ok_or_else(|| AppError::not_found(format!("Unknown feed '{}'", key)))
}

fn truncated(mut load: FeedLoad, limit: Option<usize>) -> FeedLoad {
    if let Some(limit) = limit {
        load.articles.truncate(limit);
    }
    load
}

// Route handlers
pub async fn list_feeds(State(state): State<Arc<AppState>>) -> Json<Vec<FeedSummary>> {
    Json(state.feeds.iter().map(FeedSummary::from).collect())
}

pub async fn get_feed(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<FeedLoad>, AppError> {
    let feed = find_feed(&state, &key)?;
    let load = state
        .service
        .load(feed.adapter.as_ref(), &feed.request)
        .await;
    Ok(Json(truncated(load, query.limit)))
}

pub async fn refresh_feed(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<FeedLoad>, AppError> {
    let feed = find_feed(&state, &key)?;
    let load = state
        .service
        .refresh(feed.adapter.as_ref(), &feed.request)
        .await;
    Ok(Json(truncated(load, query.limit)))
}

pub async fn latest(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<NormalizedArticle>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    Json(state.service.latest(&state.feeds, limit).await)
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<NormalizedArticle>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    Json(state.service.search(&state.feeds, &query.q, limit).await)
}

pub async fn health() -> &'static str {
    "OK"
}

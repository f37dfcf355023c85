//! Newsline - a resilient news aggregation layer
//!
//! Loads articles from JSON APIs, proxied RSS feeds and a document store,
//! normalizes them onto one record, and keeps every feed answerable through a
//! fresh cache, live fetch with retry, stale cache and synthetic fallback chain.

pub mod adapters;
pub mod article;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod fallback;
pub mod feeds;
pub mod retry;
pub mod routes;
pub mod service;
pub mod store;
pub mod taxonomy;

//! Error types for the aggregation layer.

use thiserror::Error;

/// Coarse classification of a [`SourceError`], used for logging and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Http,
    Parse,
    EmptyResult,
}

/// Failure raised by a source adapter while fetching or parsing a feed.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Non-success status or network failure talking to the source.
    #[error("transport error: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The payload could not be parsed or had an unrecognized shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// The payload was well-formed but held no usable items.
    #[error("source returned no usable items")]
    EmptyResult,
}

impl SourceError {
    pub fn kind(&self) -> SourceErrorKind {
        match self {
            SourceError::Transport { .. } => SourceErrorKind::Http,
            SourceError::Parse(_) => SourceErrorKind::Parse,
            SourceError::EmptyResult => SourceErrorKind::EmptyResult,
        }
    }

    pub fn status(status: u16) -> Self {
        SourceError::Transport {
            status: Some(status),
            message: format!("HTTP status {}", status),
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        SourceError::Transport {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

impl From<sqlx::Error> for SourceError {
    fn from(e: sqlx::Error) -> Self {
        SourceError::Transport {
            status: None,
            message: format!("document query failed: {}", e),
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Parse(e.to_string())
    }
}

impl From<feed_rs::parser::ParseFeedError> for SourceError {
    fn from(e: feed_rs::parser::ParseFeedError) -> Self {
        SourceError::Parse(format!("invalid feed document: {}", e))
    }
}

/// Failure of the persistent key/value store. Never escapes the cache layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("corrupt value for '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}

/// Outcome of a retried operation that did not succeed.
#[derive(Error, Debug)]
pub enum RetryError {
    #[error("gave up after {attempts} attempts: {source}")]
    Exhausted { attempts: u32, source: SourceError },

    #[error("cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}

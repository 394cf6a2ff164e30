//! Error types for the news pipeline
//!
//! - `FeedError`: fetching or decoding the feed
//! - `ContainerError`: writing the result into its container

use thiserror::Error;

/// Feed fetch / decode errors
#[derive(Debug, Error)]
pub enum FeedError {
    /// The proxy answered but did not report `status: "ok"`.
    #[error("Feed unavailable (status: {})", .status.as_deref().unwrap_or("missing"))]
    Unavailable { status: Option<String> },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid RSS document: {0}")]
    Rss(#[from] rss::Error),
}

impl FeedError {
    /// Upstream reachable but reporting a bad status, as opposed to a
    /// transport or decoding failure.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, FeedError::Unavailable { .. })
    }
}

/// Container write errors
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No element with id \"{0}\" found")]
    ElementNotFound(String),

    #[error("Element with id \"{0}\" is not closed")]
    Unclosed(String),

    #[error("Viewer closed")]
    ViewerClosed,
}

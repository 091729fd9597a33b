//! Type definitions for the RSS module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Duration;

/// A configured feed: display name, category label, and feed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub category: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(name: &str, category: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            url: url.to_string(),
        }
    }
}

/// A single feed entry, normalized. Never mutated once built by the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    /// HTML content, summary, or the title as a last resort.
    pub body_text: String,
    pub source_name: String,
    pub category: String,
    pub published_at: Option<DateTime<Utc>>,
    /// Publish date as RFC 3339, empty if the feed gave none.
    pub published: String,
    pub link: String,
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("HTTP error fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: reqwest::StatusCode },

    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),

    #[error("{url} is not an RSS or Atom feed: {preview}")]
    NotAFeed { url: String, preview: String },

    #[error("Failed to parse feed {url}: {message}")]
    Parse { url: String, message: String },
}

pub const UNTITLED: &str = "Untitled";

// Constants
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const FEED_ACCEPT: &str = "application/rss+xml, application/atom+xml, application/feed+json, application/xml, text/xml, */*;q=0.9";

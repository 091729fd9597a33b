//! Feed fetching: the seam between the aggregator and the network.

use async_trait::async_trait;
use tracing::{debug, info};

use super::client::{create_http_client, fetch_text};
use super::parser::parse_feed;
use super::types::{Article, FeedError, FeedSource, FEED_ACCEPT, REQUEST_TIMEOUT};
use super::util::is_valid_url;
use crate::TARGET_WEB_REQUEST;

/// Anything that can turn a configured source into its current entries.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<Article>, FeedError>;
}

/// Fetches over HTTP and parses with feed-rs.
#[derive(Clone)]
pub struct HttpFeedFetcher {
    client: reqwest::Client,
}

impl HttpFeedFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: create_http_client(REQUEST_TIMEOUT)?,
        })
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<Article>, FeedError> {
        if !is_valid_url(&source.url) {
            return Err(FeedError::InvalidUrl(source.url.clone()));
        }

        debug!(target: TARGET_WEB_REQUEST, "Loading feed {} from {}", source.name, source.url);
        let body = fetch_text(&self.client, &source.url, FEED_ACCEPT).await?;
        let articles = parse_feed(&body, source)?;

        info!(
            target: TARGET_WEB_REQUEST,
            source = %source.name,
            entries = articles.len(),
            "Fetched feed"
        );
        Ok(articles)
    }
}

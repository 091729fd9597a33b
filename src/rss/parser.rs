//! Feed parsing for RSS, Atom, and JSON Feed documents.

use feed_rs::model::Entry;
use feed_rs::parser;
use std::io::Cursor;
use tracing::{debug, warn};

use super::types::{Article, FeedSource, UNTITLED};
use super::util::{cleanup_xml, looks_like_feed};
use super::FeedError;
use crate::TARGET_WEB_REQUEST;

/// Parses a feed body into articles, retrying once on cleaned-up XML.
pub fn parse_feed(body: &str, source: &FeedSource) -> Result<Vec<Article>, FeedError> {
    let feed = match parser::parse(Cursor::new(body.as_bytes())) {
        Ok(feed) => feed,
        Err(first_err) => {
            let cleaned = cleanup_xml(body);
            if !looks_like_feed(&cleaned) {
                let preview: String = body.chars().take(100).collect();
                return Err(FeedError::NotAFeed {
                    url: source.url.clone(),
                    preview,
                });
            }
            match parser::parse(Cursor::new(cleaned.as_bytes())) {
                Ok(feed) => {
                    warn!(target: TARGET_WEB_REQUEST, "Feed {} parsed only after XML cleanup", source.url);
                    feed
                }
                Err(second_err) => {
                    return Err(FeedError::Parse {
                        url: source.url.clone(),
                        message: format!("first error: {}; after cleanup: {}", first_err, second_err),
                    });
                }
            }
        }
    };

    debug!(target: TARGET_WEB_REQUEST, "Parsed {} entries from {}", feed.entries.len(), source.url);
    Ok(feed
        .entries
        .into_iter()
        .map(|entry| entry_to_article(entry, source))
        .collect())
}

fn entry_to_article(entry: Entry, source: &FeedSource) -> Article {
    let title = entry
        .title
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    // content, then summary, then the title itself
    let body_text = entry
        .content
        .and_then(|c| c.body)
        .filter(|b| !b.trim().is_empty())
        .or_else(|| {
            entry
                .summary
                .map(|s| s.content)
                .filter(|s| !s.trim().is_empty())
        })
        .unwrap_or_else(|| title.clone());

    let published_at = entry.published.or(entry.updated);
    let link = entry
        .links
        .first()
        .map(|link| link.href.clone())
        .unwrap_or_default();

    Article {
        title,
        body_text,
        source_name: source.name.clone(),
        category: source.category.clone(),
        published_at,
        published: published_at.map(|d| d.to_rfc3339()).unwrap_or_default(),
        link,
    }
}

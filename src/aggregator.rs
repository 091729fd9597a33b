//! Multi-source collection: fetch, filter, cap per source, rank by recency, truncate.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::relevance::RelevanceClassifier;
use crate::rss::{Article, FeedFetcher, FeedSource};
use crate::TARGET_WEB_REQUEST;

pub const DEFAULT_PER_SOURCE_CAP: usize = 3;

pub struct Aggregator {
    classifier: RelevanceClassifier,
    per_source_cap: usize,
}

impl Aggregator {
    pub fn new(classifier: RelevanceClassifier, per_source_cap: usize) -> Self {
        Self {
            classifier,
            per_source_cap,
        }
    }

    /// Queries every source in turn and returns at most `requested_count` relevant
    /// articles, newest first. A failing source contributes nothing; an empty
    /// result is not an error.
    pub async fn collect(
        &self,
        fetcher: &dyn FeedFetcher,
        sources: &[FeedSource],
        requested_count: usize,
    ) -> Vec<Article> {
        let mut merged = Vec::new();

        for source in sources {
            let entries = match fetcher.fetch(source).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(target: TARGET_WEB_REQUEST, source = %source.name, "Feed failed, skipping: {}", e);
                    continue;
                }
            };

            let total = entries.len();
            let kept = self.select_from_source(entries);
            debug!(
                source = %source.name,
                total,
                kept = kept.len(),
                "Filtered feed entries"
            );
            merged.extend(kept);
        }

        let ranked = rank_by_recency(merged, Utc::now());
        let selected: Vec<Article> = ranked.into_iter().take(requested_count).collect();

        if selected.is_empty() {
            info!("No relevant articles found across {} sources", sources.len());
        } else {
            info!("Selected {} articles from {} sources", selected.len(), sources.len());
        }
        selected
    }

    /// Relevant entries of one source, in feed order, up to the cap.
    pub fn select_from_source(&self, entries: Vec<Article>) -> Vec<Article> {
        entries
            .into_iter()
            .filter(|a| self.classifier.is_relevant(a))
            .take(self.per_source_cap)
            .collect()
    }
}

/// Stable sort by publish time, newest first. Undated articles rank as `now`.
pub fn rank_by_recency(mut articles: Vec<Article>, now: DateTime<Utc>) -> Vec<Article> {
    articles.sort_by_key(|a| std::cmp::Reverse(a.published_at.unwrap_or(now)));
    articles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rss::FeedError;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::collections::HashMap;

    fn article(title: &str, source: &str, published_at: Option<DateTime<Utc>>) -> Article {
        Article {
            title: title.to_string(),
            body_text: "A psychology study.".to_string(),
            source_name: source.to_string(),
            category: "psychology".to_string(),
            published_at,
            published: String::new(),
            link: format!("https://example.com/{}", title.replace(' ', "-")),
        }
    }

    struct StaticFetcher {
        feeds: HashMap<String, Result<Vec<Article>, String>>,
    }

    #[async_trait]
    impl FeedFetcher for StaticFetcher {
        async fn fetch(&self, source: &FeedSource) -> Result<Vec<Article>, FeedError> {
            match self.feeds.get(&source.url) {
                Some(Ok(articles)) => Ok(articles.clone()),
                Some(Err(message)) => Err(FeedError::Parse {
                    url: source.url.clone(),
                    message: message.clone(),
                }),
                None => Ok(Vec::new()),
            }
        }
    }

    fn source(name: &str) -> FeedSource {
        FeedSource::new(name, "psychology", &format!("https://{}.example/rss", name))
    }

    fn at(day: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap())
    }

    #[test]
    fn undated_articles_rank_as_now() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let articles = vec![
            article("old", "a", at(1)),
            article("undated one", "a", None),
            article("newer", "a", at(20)),
            article("undated two", "b", None),
            article("middle", "b", at(10)),
        ];
        let ranked = rank_by_recency(articles, now);
        let titles: Vec<&str> = ranked.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["undated one", "undated two", "newer", "middle", "old"]);
    }

    #[test]
    fn future_dated_articles_still_outrank_undated() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let articles = vec![
            article("undated", "a", None),
            article("future", "a", Some(now + Duration::days(1))),
        ];
        let ranked = rank_by_recency(articles, now);
        assert_eq!(ranked[0].title, "future");
    }

    #[test]
    fn per_source_cap_keeps_feed_order() {
        let aggregator = Aggregator::new(RelevanceClassifier::default(), 2);
        let mut noisy = article("football psychology", "a", at(5));
        noisy.body_text = "football".to_string();
        let entries = vec![
            noisy,
            article("first", "a", at(1)),
            article("second", "a", at(2)),
            article("third", "a", at(3)),
        ];
        let kept = aggregator.select_from_source(entries);
        let titles: Vec<&str> = kept.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["first", "second"]);
    }

    #[tokio::test]
    async fn failing_source_does_not_abort_others() {
        let mut feeds = HashMap::new();
        feeds.insert(source("broken").url, Err("boom".to_string()));
        feeds.insert(
            source("good").url,
            Ok(vec![article("kept", "good", at(3))]),
        );
        let fetcher = StaticFetcher { feeds };
        let aggregator = Aggregator::new(RelevanceClassifier::default(), 3);

        let result = aggregator
            .collect(&fetcher, &[source("broken"), source("good")], 5)
            .await;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "kept");
    }

    #[tokio::test]
    async fn output_is_bounded_by_request_and_cap() {
        let mut feeds = HashMap::new();
        for name in ["a", "b"] {
            let entries = (1..=6)
                .map(|d| article(&format!("{} {}", name, d), name, at(d)))
                .collect();
            feeds.insert(source(name).url, Ok(entries));
        }
        let fetcher = StaticFetcher { feeds };
        let aggregator = Aggregator::new(RelevanceClassifier::default(), 3);
        let sources = [source("a"), source("b")];

        let all = aggregator.collect(&fetcher, &sources, 100).await;
        assert_eq!(all.len(), 6);

        let few = aggregator.collect(&fetcher, &sources, 4).await;
        assert_eq!(few.len(), 4);
        assert!(few
            .windows(2)
            .all(|w| w[0].published_at >= w[1].published_at));
    }

    #[tokio::test]
    async fn nothing_relevant_is_an_empty_result() {
        let mut irrelevant = article("Market update", "a", at(1));
        irrelevant.body_text = "Stocks rose.".to_string();
        let mut feeds = HashMap::new();
        feeds.insert(source("a").url, Ok(vec![irrelevant]));
        let fetcher = StaticFetcher { feeds };
        let aggregator = Aggregator::new(RelevanceClassifier::default(), 3);

        let result = aggregator.collect(&fetcher, &[source("a")], 3).await;
        assert!(result.is_empty());
    }
}

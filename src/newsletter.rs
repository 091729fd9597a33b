//! One newsletter run: collect articles, summarize each, attach page metadata.
//!
//! Articles are isolated from each other: a failed article is logged and left
//! out, the rest are still returned in ranked order.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::aggregator::Aggregator;
use crate::metadata::MetadataExtractor;
use crate::pipeline::{PipelineError, Summarizer};
use crate::record::SummaryRecord;
use crate::rss::{Article, FeedFetcher, FeedSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleFailure {
    pub title: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub records: Vec<SummaryRecord>,
    pub failures: Vec<ArticleFailure>,
}

impl RunReport {
    pub fn degraded_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_degraded()).count()
    }
}

pub struct Newsletter {
    aggregator: Aggregator,
    fetcher: Arc<dyn FeedFetcher>,
    summarizer: Summarizer,
    extractor: Arc<dyn MetadataExtractor>,
    feeds: Vec<FeedSource>,
    concurrency: usize,
}

impl Newsletter {
    pub fn new(
        aggregator: Aggregator,
        fetcher: Arc<dyn FeedFetcher>,
        summarizer: Summarizer,
        extractor: Arc<dyn MetadataExtractor>,
        feeds: Vec<FeedSource>,
    ) -> Self {
        Self {
            aggregator,
            fetcher,
            summarizer,
            extractor,
            feeds,
            concurrency: 1,
        }
    }

    /// Articles summarized at once. Output order is ranked order regardless.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn run(&self, requested_count: usize) -> RunReport {
        let articles = self
            .aggregator
            .collect(self.fetcher.as_ref(), &self.feeds, requested_count)
            .await;
        if articles.is_empty() {
            info!("Nothing to summarize");
            return RunReport::default();
        }

        let results: Vec<Result<SummaryRecord, PipelineError>> = stream::iter(articles.iter())
            .map(|article| self.process(article))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = RunReport::default();
        for (article, result) in articles.iter().zip(results) {
            match result {
                Ok(record) => report.records.push(record),
                Err(e) => {
                    error!(title = %article.title, source = %article.source_name, "Article failed: {}", e);
                    report.failures.push(ArticleFailure {
                        title: article.title.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            summarized = report.records.len(),
            degraded = report.degraded_count(),
            failed = report.failures.len(),
            "Newsletter run complete"
        );
        report
    }

    async fn process(&self, article: &Article) -> Result<SummaryRecord, PipelineError> {
        let output = self.summarizer.summarize(article).await?;
        let metadata = if article.link.trim().is_empty() {
            None
        } else {
            Some(self.extractor.extract(&article.link).await)
        };
        Ok(SummaryRecord::assemble(article, output, metadata, Utc::now()))
    }
}

/// Reads the summary specification document. A missing or unreadable file
/// gives an empty specification.
pub fn load_spec(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(spec) => {
            info!("Loaded summary specification from {}", path.display());
            spec
        }
        Err(e) => {
            warn!("No summary specification at {} ({}), continuing without one", path.display(), e);
            String::new()
        }
    }
}

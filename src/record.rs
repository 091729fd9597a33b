use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::metadata::{ImageRef, PageMetadata, Reference};
use crate::pipeline::{KeywordSet, PipelineOutput, SummaryQuality, Tone};
use crate::rss::Article;

/// One finished article, ready for whatever renders the newsletter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRecord {
    pub title: String,
    pub keywords: KeywordSet,
    pub summary: String,
    /// Parsed from the summary's tone marker; absent for some degraded summaries.
    pub tone: Option<Tone>,
    pub quality: SummaryQuality,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub link: String,
    pub published: String,
    pub category: String,
    pub images: Vec<ImageRef>,
    pub references: Vec<Reference>,
    pub author: String,
    pub description: String,
}

impl SummaryRecord {
    /// Merges pipeline output with the article's own fields and, when the page
    /// was fetched, its metadata. No metadata means empty page fields.
    pub fn assemble(
        article: &Article,
        output: PipelineOutput,
        metadata: Option<PageMetadata>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let page = metadata.unwrap_or_default();
        Self {
            title: article.title.clone(),
            keywords: output.keywords,
            summary: output.summary,
            tone: output.tone,
            quality: output.quality,
            source: article.source_name.clone(),
            timestamp,
            link: article.link.clone(),
            published: article.published.clone(),
            category: article.category.clone(),
            images: page.images,
            references: page.references,
            author: page.author,
            description: page.description,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.quality.is_degraded()
    }
}

//! Article page metadata: title, description, author, date, images and
//! citation-like links, scraped from the page HTML.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::rss::{create_http_client, fetch_text};
use crate::TARGET_WEB_REQUEST;

pub const PAGE_TIMEOUT: Duration = Duration::from_secs(10);

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

const AUTHOR_SELECTORS: &[&str] = &[
    r#"meta[name="author"]"#,
    r#"meta[property="article:author"]"#,
    ".author",
    r#"[class*="author"]"#,
    r#"[class*="byline"]"#,
];

const DATE_SELECTORS: &[&str] = &[
    r#"meta[property="article:published_time"]"#,
    r#"meta[name="date"]"#,
    "time",
    r#"[class*="date"]"#,
    r#"[class*="published"]"#,
];

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".svg"];
const IMAGE_KEYWORDS: &[&str] = &["image", "img", "photo", "picture", "graphic"];

const REFERENCE_KEYWORDS: &[&str] = &[
    "reference",
    "bibliography",
    "citation",
    "source",
    "study",
    "research",
    "paper",
    "article",
    "publication",
    "journal",
];

const ACADEMIC_DOMAINS: &[&str] = &[
    "doi.org",
    "pubmed.ncbi.nlm.nih.gov",
    "scholar.google.com",
    "researchgate.net",
    "academia.edu",
    "arxiv.org",
    "biorxiv.org",
    "nature.com",
    "science.org",
    "cell.com",
    "thelancet.com",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    pub alt: String,
    pub title: String,
    pub width: Option<String>,
    pub height: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub url: String,
    pub text: String,
    pub title: String,
}

/// Everything defaults to empty, which is also what a failed fetch yields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub author: String,
    pub published_date: String,
    pub images: Vec<ImageRef>,
    pub references: Vec<Reference>,
}

/// Never fails: problems are logged and produce `PageMetadata::default()`.
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> PageMetadata;
}

pub struct HtmlMetadataExtractor {
    client: Option<reqwest::Client>,
}

impl HtmlMetadataExtractor {
    pub fn new() -> Self {
        let client = match create_http_client(PAGE_TIMEOUT) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(target: TARGET_WEB_REQUEST, "Metadata extraction disabled, HTTP client unavailable: {}", e);
                None
            }
        };
        Self { client }
    }
}

impl Default for HtmlMetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataExtractor for HtmlMetadataExtractor {
    async fn extract(&self, url: &str) -> PageMetadata {
        let Some(client) = &self.client else {
            return PageMetadata::default();
        };
        let Ok(base) = Url::parse(url) else {
            warn!(target: TARGET_WEB_REQUEST, "Not extracting metadata from invalid URL {}", url);
            return PageMetadata::default();
        };

        match fetch_text(client, url, HTML_ACCEPT).await {
            Ok(html) => {
                let metadata = extract_from_html(&html, &base);
                info!(
                    target: TARGET_WEB_REQUEST,
                    url,
                    images = metadata.images.len(),
                    references = metadata.references.len(),
                    "Extracted page metadata"
                );
                metadata
            }
            Err(e) => {
                warn!(target: TARGET_WEB_REQUEST, "Metadata extraction failed for {}: {}", url, e);
                PageMetadata::default()
            }
        }
    }
}

/// Pure HTML pass; relative links resolve against `base`.
pub fn extract_from_html(html: &str, base: &Url) -> PageMetadata {
    let document = Html::parse_document(html);

    let title = select_first(&document, "title")
        .map(element_text)
        .unwrap_or_default();
    let description = select_first(&document, r#"meta[name="description"]"#)
        .and_then(|e| e.value().attr("content"))
        .map(|c| c.trim().to_string())
        .unwrap_or_default();

    PageMetadata {
        title,
        description,
        author: first_value(&document, AUTHOR_SELECTORS),
        published_date: first_value(&document, DATE_SELECTORS),
        images: extract_images(&document, base),
        references: extract_references(&document, base),
    }
}

fn select_first<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// `content` for meta tags, `datetime` for time tags, text otherwise.
fn element_value(element: ElementRef<'_>) -> String {
    let attrs = element.value();
    let attr_value = match attrs.name() {
        "meta" => attrs.attr("content"),
        "time" => attrs.attr("datetime"),
        _ => None,
    };
    match attr_value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => element_text(element),
    }
}

fn first_value(document: &Html, selectors: &[&str]) -> String {
    selectors
        .iter()
        .filter_map(|s| select_first(document, s))
        .map(element_value)
        .find(|v| !v.is_empty())
        .unwrap_or_default()
}

fn extract_images(document: &Html, base: &Url) -> Vec<ImageRef> {
    let Ok(selector) = Selector::parse("img") else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    let mut images = Vec::new();

    for img in document.select(&selector) {
        let attrs = img.value();
        let Some(src) = attrs
            .attr("src")
            .filter(|s| !s.trim().is_empty())
            .or_else(|| attrs.attr("data-src"))
        else {
            continue;
        };
        let Ok(absolute) = base.join(src.trim()) else {
            continue;
        };
        if !is_image_url(&absolute) || !seen.insert(absolute.to_string()) {
            continue;
        }
        debug!(target: TARGET_WEB_REQUEST, "Found image {}", absolute);
        images.push(ImageRef {
            url: absolute.to_string(),
            alt: attrs.attr("alt").unwrap_or_default().to_string(),
            title: attrs.attr("title").unwrap_or_default().to_string(),
            width: attrs.attr("width").map(str::to_string),
            height: attrs.attr("height").map(str::to_string),
        });
    }
    images
}

fn is_image_url(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    if IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return true;
    }
    let full = url.as_str().to_lowercase();
    IMAGE_KEYWORDS.iter().any(|k| full.contains(k))
}

fn extract_references(document: &Html, base: &Url) -> Vec<Reference> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    let mut references = Vec::new();

    for link in document.select(&selector) {
        let Some(href) = link.value().attr("href").map(str::trim).filter(|h| !h.is_empty()) else {
            continue;
        };
        let text = element_text(link);
        let Ok(absolute) = base.join(href) else {
            continue;
        };
        if !is_reference_link(href, &text, &absolute) || !seen.insert(absolute.to_string()) {
            continue;
        }
        references.push(Reference {
            url: absolute.to_string(),
            text,
            title: link.value().attr("title").unwrap_or_default().to_string(),
        });
    }
    references
}

fn is_reference_link(href: &str, text: &str, absolute: &Url) -> bool {
    let href = href.to_lowercase();
    let text = text.to_lowercase();
    if REFERENCE_KEYWORDS
        .iter()
        .any(|k| href.contains(k) || text.contains(k))
    {
        return true;
    }
    let host = absolute.host_str().unwrap_or_default().to_lowercase();
    ACADEMIC_DOMAINS.iter().any(|d| host.contains(d))
}

//! # newsbrief
//!
//! Collects relevant articles from the configured feeds and prints a short,
//! tone-annotated summary of each.
//!
//! ```
//! # Summarize the default number of articles
//! cargo run
//!
//! # Summarize 5 articles, two at a time, and keep a JSON copy
//! cargo run -- 5 --concurrency 2 --output summaries.json
//!
//! # Show the configured feeds
//! cargo run -- --list-feeds
//! ```
//!
//! Configuration comes from the environment; see `environment.rs`.

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use newsbrief::aggregator::Aggregator;
use newsbrief::environment::{default_feeds, parse_feeds, Config};
use newsbrief::logging::configure_logging;
use newsbrief::metadata::HtmlMetadataExtractor;
use newsbrief::newsletter::{load_spec, Newsletter, RunReport};
use newsbrief::pipeline::{SummaryQuality, Summarizer};
use newsbrief::record::SummaryRecord;
use newsbrief::relevance::RelevanceClassifier;
use newsbrief::rss::{FeedSource, HttpFeedFetcher};

const MAX_LISTED_LINKS: usize = 3;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Summarizes relevant RSS articles with a three-stage LLM pipeline",
    long_about = None
)]
struct Args {
    /// Number of articles to summarize (default: ARTICLE_LIMIT or 3)
    limit: Option<usize>,

    /// Print the configured feeds and exit
    #[arg(long)]
    list_feeds: bool,

    /// Also write the summaries as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Articles to summarize at the same time
    #[arg(short, long)]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_feeds {
        let _ = dotenvy::dotenv();
        let feeds = match env::var("FEEDS") {
            Ok(raw) if !raw.trim().is_empty() => parse_feeds(&raw)?,
            _ => default_feeds(),
        };
        print_feeds(&feeds);
        return Ok(());
    }

    let config = Config::from_env().context("Invalid configuration")?;
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("Failed to create log directory {}", config.log_dir.display()))?;
    let _log_guard = configure_logging(&config.log_dir);
    if let Some(path) = &config.env_file {
        info!("Loaded environment from {}", path.display());
    }

    let limit = args.limit.unwrap_or(config.article_limit);
    if limit == 0 {
        bail!("Article limit must be at least 1");
    }
    let concurrency = args.concurrency.unwrap_or(config.concurrency);

    let spec = load_spec(&config.spec_file);
    let service = Arc::new(config.build_llm_client());
    let newsletter = Newsletter::new(
        Aggregator::new(
            RelevanceClassifier::new(&config.include_terms, &config.exclude_terms),
            config.per_source_cap,
        ),
        Arc::new(HttpFeedFetcher::new().context("Failed to build HTTP client")?),
        Summarizer::new(service, config.pipeline.clone(), spec),
        Arc::new(HtmlMetadataExtractor::new()),
        config.feeds.clone(),
    )
    .with_concurrency(concurrency);

    info!("Summarizing up to {} articles from {} feeds", limit, config.feeds.len());
    let report = newsletter.run(limit).await;

    print_report(&report);

    if let Some(path) = args.output {
        let json = serde_json::to_string_pretty(&report.records)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Saved {} summaries to {}", report.records.len(), path.display());
    }

    Ok(())
}

fn print_feeds(feeds: &[FeedSource]) {
    println!("{}", "Configured feeds".bright_blue());
    println!("{}", "─".repeat(80).dimmed());
    for (i, feed) in feeds.iter().enumerate() {
        println!(
            "{}. {} [{}]\n   {}",
            i + 1,
            feed.name.bright_white(),
            feed.category.dimmed(),
            feed.url.bright_cyan()
        );
    }
}

fn print_report(report: &RunReport) {
    if report.records.is_empty() {
        println!("{}", "No relevant articles found.".bright_yellow());
    }

    for (i, record) in report.records.iter().enumerate() {
        print_record(i + 1, record);
    }

    for failure in &report.failures {
        eprintln!(
            "{} {}: {}",
            "Failed".bright_red(),
            failure.title,
            failure.error
        );
    }

    println!("\n{}", "═".repeat(100).bright_blue());
    println!(
        "{} summarized, {} degraded, {} failed",
        report.records.len(),
        report.degraded_count(),
        report.failures.len()
    );
}

fn print_record(index: usize, record: &SummaryRecord) {
    println!("\n{}", "═".repeat(100).bright_blue());
    println!("{}. {}", index, record.title.bright_white().bold());
    println!(
        "{}: {} | {}: {}",
        "Source".bright_blue(),
        record.source,
        "Published".bright_blue(),
        if record.published.is_empty() {
            "unknown".dimmed().to_string()
        } else {
            record.published.clone()
        }
    );
    if !record.link.is_empty() {
        println!("{}: {}", "Link".bright_blue(), record.link.bright_cyan());
    }
    if !record.author.is_empty() {
        println!("{}: {}", "Author".bright_blue(), record.author);
    }
    println!(
        "{}: {}",
        "Keywords".bright_blue(),
        record.keywords.as_slice().join(", ").bright_magenta()
    );
    if let Some(tone) = record.tone {
        println!("{}: {}", "Tone".bright_blue(), tone);
    }
    println!("{}", "─".repeat(80).dimmed());
    println!("{}", record.summary);

    if let SummaryQuality::Degraded { attempts, reason } = &record.quality {
        println!(
            "{}",
            format!("Summary did not pass validation after {} attempts: {}", attempts, reason)
                .bright_yellow()
        );
    }

    if !record.images.is_empty() {
        println!("{} ({})", "Images".bright_blue(), record.images.len());
        for image in record.images.iter().take(MAX_LISTED_LINKS) {
            println!("  - {}", image.url.bright_cyan());
        }
    }
    if !record.references.is_empty() {
        println!("{} ({})", "References".bright_blue(), record.references.len());
        for reference in record.references.iter().take(MAX_LISTED_LINKS) {
            println!("  - {} {}", reference.text, reference.url.bright_cyan());
        }
    }
}

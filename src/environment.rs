//! Process configuration, read from the environment (and an optional `.env`).
//!
//! Lists use `;` between entries. Feeds are `name|category|url` entries, e.g.
//! `FEEDS="NPR Health|health|https://feeds.npr.org/1007/rss.xml;..."`.

use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use ollama_rs::Ollama;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

use crate::aggregator::DEFAULT_PER_SOURCE_CAP;
use crate::pipeline::{
    AcceptanceCriteria, PipelineSettings, DEFAULT_MAX_REFINE_ATTEMPTS, DEFAULT_MAX_TEXT_CHARS,
};
use crate::relevance::{DEFAULT_EXCLUDE_TERMS, DEFAULT_INCLUDE_TERMS};
use crate::rss::{is_valid_url, FeedSource};
use crate::{LLMClient, LLMParams};

pub const DEFAULT_ARTICLE_LIMIT: usize = 3;
pub const DEFAULT_SPEC_FILE: &str = "summary_spec.md";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost";
pub const DEFAULT_OLLAMA_PORT: u16 = 11434;

pub fn default_feeds() -> Vec<FeedSource> {
    vec![
        FeedSource::new(
            "NPR Mental Health",
            "mental_health",
            "https://feeds.npr.org/1126/rss.xml",
        ),
        FeedSource::new(
            "ScienceDaily Mind & Brain",
            "psychology",
            "https://www.sciencedaily.com/rss/mind_brain.xml",
        ),
        FeedSource::new("NPR Health", "health", "https://feeds.npr.org/1007/rss.xml"),
    ]
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable must be set")]
    Missing(&'static str),

    #[error("Invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Unknown LLM backend {0:?}, expected \"openai\" or \"ollama\"")]
    UnknownBackend(String),

    #[error("Malformed feed entry {0:?}, expected name|category|url")]
    MalformedFeed(String),

    #[error("No feeds configured")]
    NoFeeds,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Backend {
    OpenAI { api_key: String },
    Ollama { host: String, port: u16 },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub pipeline: PipelineSettings,
    pub feeds: Vec<FeedSource>,
    pub include_terms: Vec<String>,
    pub exclude_terms: Vec<String>,
    pub per_source_cap: usize,
    pub article_limit: usize,
    pub concurrency: usize,
    pub spec_file: PathBuf,
    pub log_dir: PathBuf,
    /// The `.env` file that was loaded, if any. Logged once logging is up.
    pub env_file: Option<PathBuf>,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_file = dotenvy::dotenv().ok();
        let mut config = Self::from_lookup(|key| env::var(key).ok())?;
        config.env_file = env_file;
        Ok(config)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend = match get("LLM_BACKEND")
            .unwrap_or_else(|| "openai".to_string())
            .to_lowercase()
            .as_str()
        {
            "openai" => Backend::OpenAI {
                api_key: get("OPENAI_API_KEY").ok_or(ConfigError::Missing("OPENAI_API_KEY"))?,
            },
            "ollama" => {
                let host = get("OLLAMA_HOST").unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string());
                let host = if host.contains("://") {
                    host
                } else {
                    format!("http://{}", host)
                };
                Backend::Ollama {
                    host,
                    port: parse_var(&get, "OLLAMA_PORT", DEFAULT_OLLAMA_PORT)?,
                }
            }
            other => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        let pipeline = PipelineSettings {
            keywords: LLMParams {
                model: get("KEYWORD_MODEL").unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
                temperature: parse_var(&get, "KEYWORD_TEMPERATURE", 0.3)?,
            },
            draft: LLMParams {
                model: get("DRAFT_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
                temperature: parse_var(&get, "DRAFT_TEMPERATURE", 0.4)?,
            },
            refine: LLMParams {
                model: get("REFINE_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
                temperature: parse_var(&get, "REFINE_TEMPERATURE", 0.2)?,
            },
            max_text_chars: positive(&get, "MAX_TEXT_CHARS", DEFAULT_MAX_TEXT_CHARS)?,
            max_refine_attempts: positive(&get, "MAX_REFINE_ATTEMPTS", DEFAULT_MAX_REFINE_ATTEMPTS)?,
            criteria: AcceptanceCriteria {
                require_keyword_density: parse_var(&get, "REQUIRE_KEYWORD_DENSITY", false)?,
                ..AcceptanceCriteria::default()
            },
        };

        let feeds = match get("FEEDS") {
            Some(raw) => parse_feeds(&raw)?,
            None => default_feeds(),
        };
        if feeds.is_empty() {
            return Err(ConfigError::NoFeeds);
        }

        let include_terms = get("INCLUDE_TERMS")
            .map(|v| split_list(&v, ';'))
            .unwrap_or_else(|| DEFAULT_INCLUDE_TERMS.iter().map(|t| t.to_string()).collect());
        let exclude_terms = get("EXCLUDE_TERMS")
            .map(|v| split_list(&v, ';'))
            .unwrap_or_else(|| DEFAULT_EXCLUDE_TERMS.iter().map(|t| t.to_string()).collect());

        Ok(Self {
            backend,
            pipeline,
            feeds,
            include_terms,
            exclude_terms,
            per_source_cap: positive(&get, "PER_SOURCE_CAP", DEFAULT_PER_SOURCE_CAP)?,
            article_limit: positive(&get, "ARTICLE_LIMIT", DEFAULT_ARTICLE_LIMIT)?,
            concurrency: positive(&get, "CONCURRENCY", 1)?,
            spec_file: PathBuf::from(get("SPEC_FILE").unwrap_or_else(|| DEFAULT_SPEC_FILE.to_string())),
            log_dir: PathBuf::from(get("LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string())),
            env_file: None,
        })
    }

    pub fn build_llm_client(&self) -> LLMClient {
        match &self.backend {
            Backend::OpenAI { api_key } => {
                let config = OpenAIConfig::new().with_api_key(api_key);
                LLMClient::OpenAI(OpenAIClient::with_config(config))
            }
            Backend::Ollama { host, port } => {
                info!("Connecting to Ollama at {}:{}", host, port);
                LLMClient::Ollama(Ollama::new(host.clone(), *port))
            }
        }
    }
}

/// Splits on `delimiter`, trimming entries and dropping empty ones.
pub fn split_list(value: &str, delimiter: char) -> Vec<String> {
    value
        .split(delimiter)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn parse_feeds(value: &str) -> Result<Vec<FeedSource>, ConfigError> {
    split_list(value, ';')
        .into_iter()
        .map(|entry| {
            let parts: Vec<&str> = entry.split('|').map(str::trim).collect();
            match parts.as_slice() {
                [name, category, url] if !name.is_empty() && is_valid_url(url) => {
                    Ok(FeedSource::new(name, category, url))
                }
                _ => Err(ConfigError::MalformedFeed(entry.clone())),
            }
        })
        .collect()
}

fn parse_var<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

fn positive<G>(get: &G, var: &'static str, default: usize) -> Result<usize, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let value = parse_var(get, var, default)?;
    if value == 0 {
        return Err(ConfigError::Invalid {
            var,
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(value)
}

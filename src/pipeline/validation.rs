//! Acceptance rules for refined summaries.
//!
//! A summary passes when it has at most three sentence-ending periods and carries
//! a well-formed `(Tone: Positive|Neutral|Negative)` marker. The comma-count rule
//! is opt-in.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

pub const MAX_SENTENCE_TERMINATORS: usize = 3;
pub const MIN_KEYWORD_COMMAS: usize = 3;

static TONE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\(\s*tone\s*:\s*([^)]*?)\s*\)").expect("valid tone regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tone {
    Positive,
    Neutral,
    Negative,
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tone::Positive => "Positive",
            Tone::Neutral => "Neutral",
            Tone::Negative => "Negative",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("empty summary")]
    Empty,

    #[error("{count} sentence terminators, at most {max} allowed")]
    TooManySentences { count: usize, max: usize },

    #[error("no tone marker")]
    MissingTone,

    #[error("unrecognized tone {0:?}")]
    MalformedTone(String),

    #[error("{count} commas, at least {min} required")]
    TooFewCommas { count: usize, min: usize },
}

/// Finds the last `(Tone: X)` marker. Any other value inside a tone marker is malformed.
pub fn parse_tone(text: &str) -> Result<Tone, Rejection> {
    let value = TONE_TOKEN
        .captures_iter(text)
        .last()
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or(Rejection::MissingTone)?;

    match value.to_lowercase().as_str() {
        "positive" => Ok(Tone::Positive),
        "neutral" => Ok(Tone::Neutral),
        "negative" => Ok(Tone::Negative),
        _ => Err(Rejection::MalformedTone(value.to_string())),
    }
}

/// Periods that end a sentence. A period between two digits is a decimal point.
pub fn count_sentence_terminators(text: &str) -> usize {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .filter(|&(i, &c)| {
            if c != '.' {
                return false;
            }
            let before = i.checked_sub(1).and_then(|j| chars.get(j));
            let after = chars.get(i + 1);
            !matches!((before, after), (Some(b), Some(a)) if b.is_ascii_digit() && a.is_ascii_digit())
        })
        .count()
}

#[derive(Debug, Clone, PartialEq)]
pub struct AcceptanceCriteria {
    pub max_terminators: usize,
    /// Also require `MIN_KEYWORD_COMMAS` commas as a rough keyword-density proxy.
    pub require_keyword_density: bool,
}

impl Default for AcceptanceCriteria {
    fn default() -> Self {
        Self {
            max_terminators: MAX_SENTENCE_TERMINATORS,
            require_keyword_density: false,
        }
    }
}

impl AcceptanceCriteria {
    pub fn check(&self, summary: &str) -> Result<Tone, Rejection> {
        if summary.trim().is_empty() {
            return Err(Rejection::Empty);
        }

        let count = count_sentence_terminators(summary);
        if count > self.max_terminators {
            return Err(Rejection::TooManySentences {
                count,
                max: self.max_terminators,
            });
        }

        let tone = parse_tone(summary)?;

        if self.require_keyword_density {
            let commas = summary.matches(',').count();
            if commas < MIN_KEYWORD_COMMAS {
                return Err(Rejection::TooFewCommas {
                    count: commas,
                    min: MIN_KEYWORD_COMMAS,
                });
            }
        }

        Ok(tone)
    }
}

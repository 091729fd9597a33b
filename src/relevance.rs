//! Topical relevance filter.
//!
//! An article is relevant when none of the exclude terms and at least one of the
//! include terms occur in its title or body. Matching is a case-insensitive
//! substring test, so "stress" also matches "stressful".

use tracing::debug;

use crate::rss::Article;

pub const DEFAULT_INCLUDE_TERMS: &[&str] = &[
    "psychology",
    "psychological",
    "psychologist",
    "psychotherapy",
    "therapy",
    "mental health",
    "mental illness",
    "depression",
    "anxiety",
    "stress",
    "cognitive",
    "behavioral",
    "behavior",
    "cognition",
    "memory",
    "learning",
    "emotion",
    "emotional",
    "mood",
    "personality",
    "intelligence",
    "iq",
    "mental disorder",
    "psychiatric",
    "psychiatry",
    "psychiatrist",
    "bipolar",
    "schizophrenia",
    "ptsd",
    "ocd",
    "adhd",
    "autism",
    "addiction",
    "substance abuse",
    "alcohol",
    "drug",
    "recovery",
    "brain",
    "neuroscience",
    "neural",
    "neuron",
    "neurotransmitter",
    "dopamine",
    "serotonin",
    "endorphin",
    "cortisol",
    "oxytocin",
    "child development",
    "adolescent",
    "teen",
    "youth",
    "aging",
    "elderly",
    "senior",
    "cognitive decline",
    "dementia",
    "alzheimer",
    "social psychology",
    "group behavior",
    "conformity",
    "obedience",
    "prejudice",
    "discrimination",
    "stereotype",
    "attitude",
    "belief",
    "clinical psychology",
    "diagnosis",
    "treatment",
    "intervention",
    "counseling",
    "counselor",
    "therapist",
    "psychoanalysis",
    "study",
    "research",
    "experiment",
    "survey",
    "clinical trial",
    "meta-analysis",
    "systematic review",
    "longitudinal study",
];

pub const DEFAULT_EXCLUDE_TERMS: &[&str] = &[
    "politics",
    "election",
    "president",
    "congress",
    "government",
    "economy",
    "business",
    "finance",
    "stock",
    "market",
    "trade",
    "war",
    "military",
    "weapon",
    "conflict",
    "violence",
    "crime",
    "sports",
    "football",
    "basketball",
    "baseball",
    "soccer",
    "entertainment",
    "movie",
    "music",
    "celebrity",
    "hollywood",
    "technology",
    "computer",
    "software",
    "hardware",
    "internet",
];

/// Why an article was accepted or rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Excluded(String),
    Included(String),
    NoMatch,
}

impl Verdict {
    pub fn is_relevant(&self) -> bool {
        matches!(self, Verdict::Included(_))
    }
}

#[derive(Debug, Clone)]
pub struct RelevanceClassifier {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl RelevanceClassifier {
    pub fn new<I, E, S, T>(include: I, exclude: E) -> Self
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            include: fold_terms(include),
            exclude: fold_terms(exclude),
        }
    }

    pub fn classify(&self, article: &Article) -> Verdict {
        self.classify_text(&format!("{} {}", article.title, article.body_text))
    }

    pub fn is_relevant(&self, article: &Article) -> bool {
        let verdict = self.classify(article);
        debug!(title = %article.title, ?verdict, "Relevance verdict");
        verdict.is_relevant()
    }

    /// Exclusion is checked first and always wins.
    pub fn classify_text(&self, text: &str) -> Verdict {
        let haystack = text.to_lowercase();
        if haystack.trim().is_empty() {
            return Verdict::NoMatch;
        }
        if let Some(term) = self.exclude.iter().find(|t| haystack.contains(t.as_str())) {
            return Verdict::Excluded(term.clone());
        }
        if let Some(term) = self.include.iter().find(|t| haystack.contains(t.as_str())) {
            return Verdict::Included(term.clone());
        }
        Verdict::NoMatch
    }
}

impl Default for RelevanceClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_INCLUDE_TERMS, DEFAULT_EXCLUDE_TERMS)
    }
}

fn fold_terms<I, S>(terms: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    terms
        .into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

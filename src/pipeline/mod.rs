//! Three-stage summarization: keywords, draft, then refinement under an
//! acceptance gate with a bounded number of attempts.

mod keywords;
mod retry;
mod validation;

pub use keywords::{truncate_chars, KeywordSet, MAX_KEYWORDS};
pub use retry::{Attempt, BoundedRetry};
pub use validation::{
    count_sentence_terminators, parse_tone, AcceptanceCriteria, Rejection, Tone,
    MAX_SENTENCE_TERMINATORS, MIN_KEYWORD_COMMAS,
};

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::llm::{GenerationRequest, GenerativeService, LlmError, Stage};
use crate::prompt::{draft_prompt, keyword_prompt, refine_prompt};
use crate::rss::Article;
use crate::LLMParams;

pub const DEFAULT_MAX_TEXT_CHARS: usize = 6000;
pub const DEFAULT_MAX_REFINE_ATTEMPTS: usize = 3;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub keywords: LLMParams,
    pub draft: LLMParams,
    pub refine: LLMParams,
    pub max_text_chars: usize,
    pub max_refine_attempts: usize,
    pub criteria: AcceptanceCriteria,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            keywords: LLMParams::new("gpt-3.5-turbo", 0.3),
            draft: LLMParams::new("gpt-4o-mini", 0.4),
            refine: LLMParams::new("gpt-4o-mini", 0.2),
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
            max_refine_attempts: DEFAULT_MAX_REFINE_ATTEMPTS,
            criteria: AcceptanceCriteria::default(),
        }
    }
}

/// Whether the final summary passed the acceptance gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummaryQuality {
    Accepted { attempts: usize },
    Degraded { attempts: usize, reason: String },
}

impl SummaryQuality {
    pub fn is_degraded(&self) -> bool {
        matches!(self, SummaryQuality::Degraded { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub keywords: KeywordSet,
    pub draft: String,
    pub summary: String,
    /// Absent only when the summary was kept after failing the gate.
    pub tone: Option<Tone>,
    pub quality: SummaryQuality,
}

#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: LlmError,
}

pub struct Summarizer {
    service: Arc<dyn GenerativeService>,
    settings: PipelineSettings,
    spec: String,
}

impl Summarizer {
    pub fn new(service: Arc<dyn GenerativeService>, settings: PipelineSettings, spec: String) -> Self {
        Self {
            service,
            settings,
            spec,
        }
    }

    /// Runs all three stages over the article body.
    pub async fn summarize(&self, article: &Article) -> Result<PipelineOutput, PipelineError> {
        info!(title = %article.title, source = %article.source_name, "Summarizing article");

        let keywords = self.extract_keywords(&article.body_text).await?;
        let draft = self.draft_summary(&keywords, &article.body_text).await?;
        let outcome = self.refine_summary(&draft).await?;

        let (summary, quality) = match outcome {
            Attempt::Accepted { value, attempts } => (value, SummaryQuality::Accepted { attempts }),
            Attempt::ExhaustedFailOpen {
                value,
                attempts,
                last_rejection,
            } => {
                warn!(
                    title = %article.title,
                    attempts,
                    reason = %last_rejection,
                    "Keeping summary that failed validation"
                );
                (
                    value,
                    SummaryQuality::Degraded {
                        attempts,
                        reason: last_rejection.to_string(),
                    },
                )
            }
        };
        let tone = parse_tone(&summary).ok();

        info!(title = %article.title, degraded = quality.is_degraded(), "Article summarized");
        Ok(PipelineOutput {
            keywords,
            draft,
            summary,
            tone,
            quality,
        })
    }

    pub async fn extract_keywords(&self, text: &str) -> Result<KeywordSet, PipelineError> {
        let text = truncate_chars(text, self.settings.max_text_chars);
        let raw = self
            .call(Stage::Keywords, &self.settings.keywords, keyword_prompt(text))
            .await?;

        let keywords = KeywordSet::parse(&raw);
        if !keywords.is_complete() {
            warn!(count = keywords.len(), "Fewer than {} keywords extracted", MAX_KEYWORDS);
        }
        info!(keywords = ?keywords.as_slice(), "Keywords extracted");
        Ok(keywords)
    }

    pub async fn draft_summary(&self, keywords: &KeywordSet, text: &str) -> Result<String, PipelineError> {
        let text = truncate_chars(text, self.settings.max_text_chars);
        let draft = self
            .call(
                Stage::Draft,
                &self.settings.draft,
                draft_prompt(keywords.as_slice(), text),
            )
            .await?;
        Ok(draft.trim().to_string())
    }

    /// Same prompt every attempt. If none pass, the last non-empty result is
    /// kept; only a run of empty replies is an error.
    pub async fn refine_summary(&self, draft: &str) -> Result<Attempt<String, Rejection>, PipelineError> {
        let prompt = refine_prompt(&self.spec, draft);
        let policy = BoundedRetry::new(self.settings.max_refine_attempts);
        let criteria = &self.settings.criteria;
        let mut last_non_empty: Option<String> = None;

        let outcome = policy
            .run(
                |attempt| {
                    let prompt = prompt.clone();
                    async move {
                        info!(attempt, max_attempts = policy.max_attempts(), "Refining summary");
                        let refined = self
                            .call(Stage::Refine, &self.settings.refine, prompt)
                            .await?;
                        Ok(refined.trim().to_string())
                    }
                },
                |summary: &String| {
                    if !summary.is_empty() {
                        last_non_empty = Some(summary.clone());
                    }
                    criteria.check(summary).map(|_| ())
                },
            )
            .await?;

        match outcome {
            Attempt::ExhaustedFailOpen { value, attempts, .. } if value.is_empty() => {
                let Some(value) = last_non_empty else {
                    return Err(PipelineError {
                        stage: Stage::Refine,
                        source: LlmError::EmptyResponse {
                            model: self.settings.refine.model.clone(),
                        },
                    });
                };
                let last_rejection = criteria.check(&value).err().unwrap_or(Rejection::Empty);
                Ok(Attempt::ExhaustedFailOpen {
                    value,
                    attempts,
                    last_rejection,
                })
            }
            outcome => Ok(outcome),
        }
    }

    async fn call(&self, stage: Stage, params: &LLMParams, prompt: String) -> Result<String, PipelineError> {
        let request = GenerationRequest {
            stage,
            model: params.model.clone(),
            temperature: params.temperature,
            prompt,
        };
        self.service
            .generate(&request)
            .await
            .map_err(|source| PipelineError { stage, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedService;

    const KEYWORDS: &str = "sleep, memory, teens, school, mood";
    const DRAFT: &str = "  Teens who sleep more remember more. School start times matter. Mood improves too. Parents noticed. Researchers agree.  ";
    const GOOD: &str = "Teens who sleep more remember more. Later school start times help memory and mood. Researchers recommend change (Tone: Positive)";
    const TOO_LONG: &str = "One. Two. Three. Four. (Tone: Neutral)";

    fn article(body: &str) -> Article {
        Article {
            title: "Sleep and memory".to_string(),
            body_text: body.to_string(),
            source_name: "Mind Feed".to_string(),
            category: "psychology".to_string(),
            published_at: None,
            published: String::new(),
            link: String::new(),
        }
    }

    fn summarizer(service: Arc<ScriptedService>, settings: PipelineSettings) -> Summarizer {
        Summarizer::new(service, settings, "Three sentences, one paragraph.".to_string())
    }

    #[tokio::test]
    async fn accepted_on_first_refine() {
        let service = Arc::new(ScriptedService::new());
        service
            .reply(Stage::Keywords, KEYWORDS)
            .reply(Stage::Draft, DRAFT)
            .reply(Stage::Refine, GOOD);
        let output = summarizer(service.clone(), PipelineSettings::default())
            .summarize(&article("Teen sleep study body."))
            .await
            .unwrap();

        assert_eq!(output.summary, GOOD);
        assert_eq!(output.quality, SummaryQuality::Accepted { attempts: 1 });
        assert_eq!(output.tone, Some(Tone::Positive));
        assert_eq!(output.keywords.len(), 5);
        assert_eq!(output.draft, DRAFT.trim());
        assert_eq!(service.calls_for(Stage::Refine), 1);
        assert_eq!(service.calls().len(), 3);
    }

    #[tokio::test]
    async fn exhausted_refine_fails_open() {
        let service = Arc::new(ScriptedService::new());
        service
            .reply(Stage::Keywords, KEYWORDS)
            .reply(Stage::Draft, DRAFT)
            .reply(Stage::Refine, "First. Try. Was. Long. (Tone: Neutral)")
            .reply(Stage::Refine, "No tone at all.")
            .reply(Stage::Refine, TOO_LONG);
        let output = summarizer(service.clone(), PipelineSettings::default())
            .summarize(&article("Body."))
            .await
            .unwrap();

        assert_eq!(service.calls_for(Stage::Refine), DEFAULT_MAX_REFINE_ATTEMPTS);
        assert_eq!(output.summary, TOO_LONG);
        assert!(output.quality.is_degraded());
        assert_eq!(
            output.quality,
            SummaryQuality::Degraded {
                attempts: 3,
                reason: "4 sentence terminators, at most 3 allowed".to_string()
            }
        );
    }

    #[tokio::test]
    async fn retry_reuses_the_same_prompt() {
        let service = Arc::new(ScriptedService::new());
        service
            .reply(Stage::Keywords, KEYWORDS)
            .reply(Stage::Draft, DRAFT)
            .reply(Stage::Refine, TOO_LONG)
            .reply(Stage::Refine, GOOD);
        let output = summarizer(service.clone(), PipelineSettings::default())
            .summarize(&article("Body."))
            .await
            .unwrap();

        assert_eq!(output.quality, SummaryQuality::Accepted { attempts: 2 });
        let refine_prompts: Vec<String> = service
            .calls()
            .into_iter()
            .filter(|c| c.stage == Stage::Refine)
            .map(|c| c.prompt)
            .collect();
        assert_eq!(refine_prompts.len(), 2);
        assert_eq!(refine_prompts[0], refine_prompts[1]);
        assert!(refine_prompts[0].contains("Three sentences, one paragraph."));
        assert!(refine_prompts[0].contains(DRAFT.trim()));
    }

    #[tokio::test]
    async fn transport_error_aborts_without_retry() {
        let service = Arc::new(ScriptedService::new());
        service
            .reply(Stage::Keywords, KEYWORDS)
            .push(Stage::Draft, Err(LlmError::Ollama("connection refused".to_string())));
        let err = summarizer(service.clone(), PipelineSettings::default())
            .summarize(&article("Body."))
            .await
            .unwrap_err();

        assert_eq!(err.stage, Stage::Draft);
        assert_eq!(service.calls_for(Stage::Draft), 1);
        assert_eq!(service.calls_for(Stage::Refine), 0);
    }

    #[tokio::test]
    async fn refine_transport_error_is_not_retried() {
        let service = Arc::new(ScriptedService::new());
        service
            .reply(Stage::Keywords, KEYWORDS)
            .reply(Stage::Draft, DRAFT)
            .push(Stage::Refine, Err(LlmError::Timeout(std::time::Duration::from_secs(1))))
            .reply(Stage::Refine, GOOD);
        let err = summarizer(service.clone(), PipelineSettings::default())
            .summarize(&article("Body."))
            .await
            .unwrap_err();

        assert_eq!(err.stage, Stage::Refine);
        assert_eq!(service.calls_for(Stage::Refine), 1);
    }

    #[tokio::test]
    async fn short_keyword_list_is_accepted_and_text_is_truncated() {
        let service = Arc::new(ScriptedService::new());
        service
            .reply(Stage::Keywords, "sleep\nmemory")
            .reply(Stage::Draft, DRAFT)
            .reply(Stage::Refine, GOOD);
        let settings = PipelineSettings {
            max_text_chars: 10,
            ..PipelineSettings::default()
        };
        let body = "0123456789ABCDEFGHIJ";
        let output = summarizer(service.clone(), settings)
            .summarize(&article(body))
            .await
            .unwrap();

        assert_eq!(output.keywords.as_slice(), ["sleep", "memory"]);
        let calls = service.calls();
        assert!(calls[0].prompt.contains("0123456789\n"));
        assert!(!calls[0].prompt.contains("ABCDEFGHIJ"));
        assert!(calls[1].prompt.contains("Keywords: sleep, memory"));
        assert!(!calls[1].prompt.contains("ABCDEFGHIJ"));
    }

    #[tokio::test]
    async fn empty_keyword_reply_is_not_fatal() {
        let service = Arc::new(ScriptedService::new());
        service
            .reply(Stage::Keywords, "")
            .reply(Stage::Draft, DRAFT)
            .reply(Stage::Refine, GOOD);
        let output = summarizer(service.clone(), PipelineSettings::default())
            .summarize(&article("Body."))
            .await
            .unwrap();

        assert!(output.keywords.is_empty());
        assert_eq!(output.quality, SummaryQuality::Accepted { attempts: 1 });
        assert_eq!(service.calls().len(), 3);
    }

    #[tokio::test]
    async fn empty_refine_reply_is_retried() {
        let service = Arc::new(ScriptedService::new());
        service
            .reply(Stage::Keywords, KEYWORDS)
            .reply(Stage::Draft, DRAFT)
            .reply(Stage::Refine, "")
            .reply(Stage::Refine, GOOD);
        let output = summarizer(service.clone(), PipelineSettings::default())
            .summarize(&article("Body."))
            .await
            .unwrap();

        assert_eq!(output.summary, GOOD);
        assert_eq!(output.quality, SummaryQuality::Accepted { attempts: 2 });
        assert_eq!(service.calls_for(Stage::Refine), 2);
    }

    #[tokio::test]
    async fn trailing_empty_refine_keeps_earlier_text() {
        let service = Arc::new(ScriptedService::new());
        service
            .reply(Stage::Keywords, KEYWORDS)
            .reply(Stage::Draft, DRAFT)
            .reply(Stage::Refine, TOO_LONG)
            .always(Stage::Refine, "   ");
        let output = summarizer(service.clone(), PipelineSettings::default())
            .summarize(&article("Body."))
            .await
            .unwrap();

        assert_eq!(service.calls_for(Stage::Refine), 3);
        assert_eq!(output.summary, TOO_LONG);
        assert_eq!(
            output.quality,
            SummaryQuality::Degraded {
                attempts: 3,
                reason: "4 sentence terminators, at most 3 allowed".to_string()
            }
        );
    }

    #[tokio::test]
    async fn all_empty_refine_replies_fail_the_article() {
        let service = Arc::new(ScriptedService::new());
        service
            .reply(Stage::Keywords, KEYWORDS)
            .reply(Stage::Draft, DRAFT)
            .always(Stage::Refine, "");
        let err = summarizer(service.clone(), PipelineSettings::default())
            .summarize(&article("Body."))
            .await
            .unwrap_err();

        assert_eq!(err.stage, Stage::Refine);
        assert!(matches!(err.source, LlmError::EmptyResponse { .. }));
        assert_eq!(service.calls_for(Stage::Refine), DEFAULT_MAX_REFINE_ATTEMPTS);
    }

    #[tokio::test]
    async fn stage_models_come_from_settings() {
        let service = Arc::new(ScriptedService::new());
        service
            .reply(Stage::Keywords, KEYWORDS)
            .reply(Stage::Draft, DRAFT)
            .reply(Stage::Refine, GOOD);
        let settings = PipelineSettings {
            keywords: LLMParams::new("kw-model", 0.1),
            draft: LLMParams::new("draft-model", 0.5),
            refine: LLMParams::new("refine-model", 0.0),
            ..PipelineSettings::default()
        };
        summarizer(service.clone(), settings)
            .summarize(&article("Body."))
            .await
            .unwrap();

        let models: Vec<(String, f32)> = service
            .calls()
            .into_iter()
            .map(|c| (c.model, c.temperature))
            .collect();
        assert_eq!(
            models,
            [
                ("kw-model".to_string(), 0.1),
                ("draft-model".to_string(), 0.5),
                ("refine-model".to_string(), 0.0)
            ]
        );
    }
}

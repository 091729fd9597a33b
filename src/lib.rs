pub mod aggregator;
pub mod environment;
pub mod llm;
pub mod logging;
pub mod metadata;
pub mod newsletter;
pub mod pipeline;
pub mod prompt;
pub mod record;
pub mod relevance;
pub mod rss;

use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use ollama_rs::Ollama;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_LLM_REQUEST: &str = "llm_request";

#[derive(Clone, Debug)]
pub enum LLMClient {
    Ollama(Ollama),
    OpenAI(OpenAIClient<OpenAIConfig>),
}

/// Model and temperature for one pipeline stage.
#[derive(Clone, Debug, PartialEq)]
pub struct LLMParams {
    pub model: String,
    pub temperature: f32,
}

impl LLMParams {
    pub fn new(model: &str, temperature: f32) -> Self {
        Self {
            model: model.to_string(),
            temperature,
        }
    }
}

//! Text generation backends.
//!
//! The pipeline only sees [`GenerativeService`]; [`LLMClient`] implements it for
//! OpenAI chat completions and for Ollama.

use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use ollama_rs::generation::completion::request::GenerationRequest as OllamaRequest;
use ollama_rs::generation::options::GenerationOptions;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{LLMClient, TARGET_LLM_REQUEST};

pub const LLM_TIMEOUT: Duration = Duration::from_secs(120);

/// Which pipeline step a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Stage {
    Keywords,
    Draft,
    Refine,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Keywords => "keywords",
            Stage::Draft => "draft",
            Stage::Refine => "refine",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub stage: Stage,
    pub model: String,
    pub temperature: f32,
    pub prompt: String,
}

/// Transport-level failures. Never retried by the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("OpenAI request failed: {0}")]
    OpenAI(#[from] OpenAIError),

    #[error("Ollama request failed: {0}")]
    Ollama(String),

    #[error("LLM request timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    /// Raised by the pipeline when no refine attempt produced any text.
    #[error("Model {model} returned no content")]
    EmptyResponse { model: String },
}

#[async_trait]
pub trait GenerativeService: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError>;
}

#[async_trait]
impl GenerativeService for LLMClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        debug!(
            target: TARGET_LLM_REQUEST,
            stage = %request.stage,
            model = %request.model,
            "Sending LLM request with prompt: {}",
            request.prompt
        );

        let response = match timeout(LLM_TIMEOUT, self.complete(request)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(target: TARGET_LLM_REQUEST, stage = %request.stage, "LLM request timed out");
                return Err(LlmError::Timeout(LLM_TIMEOUT));
            }
        };

        if response.trim().is_empty() {
            warn!(
                target: TARGET_LLM_REQUEST,
                stage = %request.stage,
                model = %request.model,
                "LLM returned an empty response"
            );
        }

        info!(
            target: TARGET_LLM_REQUEST,
            stage = %request.stage,
            model = %request.model,
            chars = response.len(),
            "LLM response received"
        );
        debug!(target: TARGET_LLM_REQUEST, "LLM response: {}", response);
        Ok(response)
    }
}

impl LLMClient {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        match self {
            LLMClient::OpenAI(client) => {
                let messages: Vec<ChatCompletionRequestMessage> =
                    vec![ChatCompletionRequestUserMessageArgs::default()
                        .content(request.prompt.as_str())
                        .build()?
                        .into()];
                let chat_request = CreateChatCompletionRequestArgs::default()
                    .model(request.model.as_str())
                    .temperature(request.temperature)
                    .messages(messages)
                    .build()?;
                let response = client.chat().create(chat_request).await?;
                Ok(response
                    .choices
                    .into_iter()
                    .find_map(|choice| choice.message.content)
                    .unwrap_or_default())
            }
            LLMClient::Ollama(ollama) => {
                let mut ollama_request =
                    OllamaRequest::new(request.model.clone(), request.prompt.clone());
                ollama_request.options =
                    Some(GenerationOptions::default().temperature(request.temperature));
                let response = ollama
                    .generate(ollama_request)
                    .await
                    .map_err(|e| LlmError::Ollama(e.to_string()))?;
                Ok(response.response)
            }
        }
    }
}

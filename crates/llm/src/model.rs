//! Language model handle used by the QA strategies.
//!
//! Bundles a provider client with the generation settings that determine the
//! prompt budget: the context window and the tokens reserved for the answer.

use crate::client::{LlmClient, LlmRequest};
use crate::tokens::TokenCounter;
use docqa_core::{AppError, AppResult, QaSettings};
use std::sync::Arc;

/// Generation settings applied to every prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    /// Model identifier passed to the provider
    pub model: String,

    /// Total tokens the model accepts (prompt + completion)
    pub context_size: u32,

    /// Tokens reserved for the completion
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Stop sequences
    pub stop: Vec<String>,
}

impl ModelSettings {
    /// Create settings with the given window sizes and default sampling.
    pub fn new(model: impl Into<String>, context_size: u32, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            context_size,
            max_tokens,
            temperature: 0.8,
            stop: Vec::new(),
        }
    }

    /// Build settings from the QA section of the application config.
    pub fn from_qa(model: impl Into<String>, qa: &QaSettings) -> Self {
        Self {
            model: model.into(),
            context_size: qa.context_size,
            max_tokens: qa.max_tokens,
            temperature: qa.temperature,
            stop: qa.stop.clone(),
        }
    }
}

/// A provider client plus its generation settings.
///
/// Prompt tokens are counted with the attached [`TokenCounter`] if there is
/// one, otherwise by the client.
#[derive(Clone)]
pub struct LanguageModel {
    client: Arc<dyn LlmClient>,
    settings: ModelSettings,
    counter: Option<Arc<dyn TokenCounter>>,
}

impl std::fmt::Debug for LanguageModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageModel")
            .field("provider", &self.client.provider_name())
            .field("settings", &self.settings)
            .field("tokenizer", &self.counter.is_some())
            .finish()
    }
}

impl LanguageModel {
    /// Wrap a client.
    ///
    /// Fails if the reserved output tokens leave no room for a prompt.
    pub fn new(client: Arc<dyn LlmClient>, settings: ModelSettings) -> AppResult<Self> {
        if settings.max_tokens >= settings.context_size {
            return Err(AppError::Config(format!(
                "max_tokens ({}) must be smaller than context_size ({})",
                settings.max_tokens, settings.context_size
            )));
        }

        Ok(Self {
            client,
            settings,
            counter: None,
        })
    }

    /// Count prompt tokens with `counter` instead of the client.
    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Send a fully rendered prompt and return the completion text.
    pub async fn predict(&self, prompt: &str) -> AppResult<String> {
        let request = LlmRequest::new(prompt, &self.settings.model)
            .with_max_tokens(self.settings.max_tokens)
            .with_context_size(self.settings.context_size)
            .with_temperature(self.settings.temperature)
            .with_stop(self.settings.stop.clone());

        let response = self.client.complete(&request).await?;

        tracing::debug!(
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "Prediction finished"
        );

        Ok(response.content)
    }

    /// Token count of `text`.
    pub fn count_tokens(&self, text: &str) -> usize {
        match &self.counter {
            Some(counter) => counter.count_tokens(text),
            None => self.client.count_tokens(text),
        }
    }

    /// Total context window.
    pub fn context_size(&self) -> u32 {
        self.settings.context_size
    }

    /// Tokens reserved for the completion.
    pub fn max_output_tokens(&self) -> u32 {
        self.settings.max_tokens
    }

    /// Tokens available for the prompt: `context_size - max_output_tokens`.
    pub fn prompt_budget(&self) -> usize {
        self.settings
            .context_size
            .saturating_sub(self.settings.max_tokens) as usize
    }

    /// Generation settings.
    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    /// Provider name of the wrapped client.
    pub fn provider_name(&self) -> &str {
        self.client.provider_name()
    }
}

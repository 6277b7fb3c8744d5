//! Provider-facing completion types and the `LlmClient` trait.
//!
//! A request is one fully rendered prompt plus the generation limits the
//! caller budgeted for. Providers translate it to their own wire format.

use docqa_core::AppResult;

use crate::tokens::estimate_tokens;

/// One completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    /// Rendered prompt, sent verbatim
    pub prompt: String,

    /// Model identifier (e.g. "llama3.2")
    pub model: String,

    /// Output tokens the provider may generate
    pub max_tokens: Option<u32>,

    /// Window the model is loaded with
    pub context_size: Option<u32>,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Generation ends at any of these
    pub stop: Vec<String>,
}

impl LlmRequest {
    /// Request with provider defaults for every limit.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: None,
            context_size: None,
            temperature: None,
            stop: Vec::new(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_context_size(mut self, context_size: u32) -> Self {
        self.context_size = Some(context_size);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = stop;
        self
    }
}

/// Completion text and what it cost.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,

    /// Model that actually answered, as reported by the provider
    pub model: String,

    pub usage: LlmUsage,
}

/// Token accounting reported by the provider (zero when unknown).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl LlmUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// A language model backend.
///
/// Implementations are shared behind an `Arc` across concurrent questions and
/// must not keep per-question state.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Short provider identifier ("ollama", "mock").
    fn provider_name(&self) -> &str;

    /// Run one non-streaming completion.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;

    /// Tokens `text` occupies in the model's window.
    ///
    /// Defaults to a word-boundary estimate for providers without a
    /// tokenizer of their own.
    fn count_tokens(&self, text: &str) -> usize {
        estimate_tokens(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait::async_trait]
    impl LlmClient for Echo {
        fn provider_name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            Ok(LlmResponse {
                content: request.prompt.clone(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
        }
    }

    #[test]
    fn test_request_limits() {
        let request = LlmRequest::new("Hello", "llama3.2")
            .with_max_tokens(128)
            .with_context_size(2048)
            .with_temperature(0.2)
            .with_stop(vec!["[STOP]".to_string()]);

        assert_eq!(request.max_tokens, Some(128));
        assert_eq!(request.context_size, Some(2048));
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.stop, vec!["[STOP]"]);
    }

    #[test]
    fn test_usage_total() {
        assert_eq!(LlmUsage::new(100, 20).total_tokens, 120);
        assert_eq!(LlmUsage::new(u32::MAX, 1).total_tokens, u32::MAX);
    }

    #[test]
    fn test_default_token_count_is_estimate() {
        let text = "Insulin lowers blood glucose.";
        assert_eq!(Echo.count_tokens(text), estimate_tokens(text));
    }

    #[tokio::test]
    async fn test_trait_object_completion() {
        let client: Box<dyn LlmClient> = Box::new(Echo);
        let response = client.complete(&LlmRequest::new("ping", "m")).await.unwrap();
        assert_eq!(response.content, "ping");
        assert_eq!(client.provider_name(), "echo");
    }
}

//! Scripted LLM provider for tests and offline demos.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use docqa_core::{AppError, AppResult};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Mock provider that replays scripted completions.
///
/// Every request is recorded. When the script runs out, the client answers
/// `answer-<n>` where `n` is the 1-based call number. Token counts are
/// whitespace-separated words so budget arithmetic in tests is exact.
#[derive(Debug, Default)]
pub struct MockClient {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<LlmRequest>>,
    fail_on_call: Option<usize>,
}

impl MockClient {
    /// Create a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that replays `responses` in order.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Make the `call`-th request (1-based) fail with an LLM error.
    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    /// All requests received so far, oldest first.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Number of completions requested so far.
    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .map(|requests| requests.len())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let call = {
            let mut requests = self
                .requests
                .lock()
                .map_err(|_| AppError::Llm("mock request log poisoned".to_string()))?;
            requests.push(request.clone());
            requests.len()
        };

        if self.fail_on_call == Some(call) {
            return Err(AppError::Llm(format!("mock failure on call {}", call)));
        }

        let scripted = self
            .responses
            .lock()
            .map_err(|_| AppError::Llm("mock script poisoned".to_string()))?
            .pop_front();
        let content = scripted.unwrap_or_else(|| format!("answer-{}", call));

        let usage = LlmUsage::new(
            self.count_tokens(&request.prompt) as u32,
            self.count_tokens(&content) as u32,
        );

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage,
        })
    }

    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_then_fallback() {
        let client = MockClient::with_responses(["first"]);
        let request = LlmRequest::new("q", "mock");

        assert_eq!(client.complete(&request).await.unwrap().content, "first");
        assert_eq!(client.complete(&request).await.unwrap().content, "answer-2");
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failing_call_is_recorded() {
        let client = MockClient::new().failing_on(1);
        let result = client.complete(&LlmRequest::new("q", "mock")).await;

        assert!(matches!(result, Err(AppError::Llm(_))));
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn test_word_token_count() {
        let client = MockClient::new();
        assert_eq!(client.count_tokens("one two  three\nfour"), 4);
    }
}

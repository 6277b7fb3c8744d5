//! Ollama provider.
//!
//! Talks to the non-streaming `/api/generate` endpoint. The window size,
//! output budget, temperature and stop sequences travel in the `options`
//! object so the server applies the same limits the QA strategies budget
//! against. API reference: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default local Ollama address.
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions<'a>,
}

#[derive(Debug, Default, Serialize)]
struct GenerateOptions<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    stop: &'a [String],
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    model: String,
    response: String,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

impl GenerateReply {
    fn into_response(self) -> LlmResponse {
        if self.done_reason.as_deref() == Some("length") {
            tracing::warn!(
                model = %self.model,
                "Completion was cut off by the output token limit"
            );
        }

        LlmResponse {
            content: self.response,
            model: self.model,
            usage: LlmUsage::new(self.prompt_eval_count, self.eval_count),
        }
    }
}

/// Client for a local or remote Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    generate_url: String,
    http: reqwest::Client,
}

impl OllamaClient {
    /// Client for the default local server.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_OLLAMA_ENDPOINT)
    }

    /// Client for the server at `base_url` (e.g. `http://gpu-box:11434`).
    pub fn with_base_url(base_url: impl AsRef<str>) -> Self {
        Self::from_parts(base_url.as_ref(), reqwest::Client::new())
    }

    /// Client whose requests give up after `timeout`.
    pub fn with_timeout(base_url: impl AsRef<str>, timeout: Duration) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::from_parts(base_url.as_ref(), http))
    }

    fn from_parts(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            generate_url: format!("{}/api/generate", base_url.trim_end_matches('/')),
            http,
        }
    }

    fn body<'a>(request: &'a LlmRequest) -> GenerateBody<'a> {
        GenerateBody {
            model: &request.model,
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                num_ctx: request.context_size,
                num_predict: request.max_tokens,
                temperature: request.temperature,
                stop: &request.stop,
            },
        }
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(
            url = %self.generate_url,
            model = %request.model,
            prompt_chars = request.prompt.len(),
            "Requesting Ollama completion"
        );

        let response = self
            .http
            .post(&self.generate_url)
            .json(&Self::body(request))
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Ollama request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Llm(format!(
                "Ollama returned {}: {}",
                status,
                detail.trim()
            )));
        }

        let reply: GenerateReply = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Malformed Ollama reply: {}", e)))?;

        tracing::debug!(
            prompt_tokens = reply.prompt_eval_count,
            completion_tokens = reply.eval_count,
            "Ollama completion received"
        );

        Ok(reply.into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_url() {
        assert_eq!(
            OllamaClient::new().generate_url,
            "http://localhost:11434/api/generate"
        );
        assert_eq!(
            OllamaClient::with_base_url("http://gpu-box:11434/").generate_url,
            "http://gpu-box:11434/api/generate"
        );
    }

    #[test]
    fn test_body_carries_model_settings() {
        let request = LlmRequest::new("Hello", "llama3.2")
            .with_temperature(0.7)
            .with_max_tokens(100)
            .with_context_size(2048)
            .with_stop(vec!["[STOP]".to_string()]);

        let body = serde_json::to_value(OllamaClient::body(&request)).unwrap();
        assert_eq!(body["model"], "llama3.2");
        assert_eq!(body["prompt"], "Hello");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_ctx"], 2048);
        assert_eq!(body["options"]["num_predict"], 100);
        assert_eq!(body["options"]["stop"][0], "[STOP]");
    }

    #[test]
    fn test_body_omits_unset_options() {
        let request = LlmRequest::new("Hi", "m");
        let body = serde_json::to_value(OllamaClient::body(&request)).unwrap();
        assert_eq!(body["options"], serde_json::json!({}));
    }

    #[test]
    fn test_reply_usage() {
        let reply: GenerateReply = serde_json::from_str(
            r#"{"model":"llama3.2","response":"Paris","done":true,"done_reason":"stop","prompt_eval_count":12,"eval_count":3}"#,
        )
        .unwrap();

        let response = reply.into_response();
        assert_eq!(response.content, "Paris");
        assert_eq!(response.usage.total_tokens, 15);
    }

    #[test]
    fn test_reply_without_counts() {
        let reply: GenerateReply =
            serde_json::from_str(r#"{"model":"m","response":"ok"}"#).unwrap();
        assert_eq!(reply.into_response().usage.total_tokens, 0);
    }
}

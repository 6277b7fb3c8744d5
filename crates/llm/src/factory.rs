//! LLM provider factory.
//!
//! Creates LLM clients from a provider name and its connection options.

use crate::client::LlmClient;
use crate::providers::ollama::DEFAULT_OLLAMA_ENDPOINT;
use crate::providers::{MockClient, OllamaClient};
use std::sync::Arc;
use std::time::Duration;

/// Provider connection options.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Custom endpoint URL
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Scripted completions for the mock provider
    pub mock_responses: Vec<String>,
}

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "mock")
/// * `options` - Endpoint, timeout and mock script
///
/// # Errors
/// Returns an error message if the provider is unknown or the HTTP client
/// cannot be built.
pub fn create_client(
    provider: &str,
    options: &ClientOptions,
) -> Result<Arc<dyn LlmClient>, String> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            let base_url = options
                .endpoint
                .as_deref()
                .unwrap_or(DEFAULT_OLLAMA_ENDPOINT);

            let client = match options.timeout_secs {
                Some(secs) => OllamaClient::with_timeout(base_url, Duration::from_secs(secs))
                    .map_err(|e| e.to_string())?,
                None => OllamaClient::with_base_url(base_url),
            };
            Ok(Arc::new(client))
        }
        "mock" => Ok(Arc::new(MockClient::with_responses(
            options.mock_responses.clone(),
        ))),
        _ => Err(format!("Unknown provider: {}", provider)),
    }
}

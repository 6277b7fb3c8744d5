//! LLM integration crate for docqa.
//!
//! Provider-agnostic access to language models: a `LlmClient` trait for
//! providers, and a `LanguageModel` handle that adds the generation settings
//! (context window, reserved output tokens) the QA strategies budget against.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **Mock**: Scripted completions for tests and demos
//!
//! # Example
//! ```no_run
//! use docqa_llm::{LanguageModel, ModelSettings, providers::OllamaClient};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let model = LanguageModel::new(
//!     Arc::new(OllamaClient::new()),
//!     ModelSettings::new("llama3.2", 2048, 256),
//! )?;
//! let answer = model.predict("Hello, world!").await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod model;
pub mod providers;
pub mod tokens;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, ClientOptions};
pub use model::{LanguageModel, ModelSettings};
pub use providers::{MockClient, OllamaClient};
pub use tokens::{estimate_tokens, TokenCounter, TokenizerCounter};

//! Prompt system for docqa.
//!
//! This crate provides:
//! - Compiled Handlebars prompt templates with declared input slots
//! - The built-in stuffing and refinement templates
//! - YAML prompt overrides loaded from the workspace
//! - Answer format contracts (structured JSON or plain text)

pub mod defaults;
pub mod format;
pub mod loader;
pub mod types;

// Re-export main types
pub use format::{FormatContract, ResponseFormat};
pub use loader::{list_prompts, load_prompt};
pub use types::{PromptDefinition, PromptTemplate};

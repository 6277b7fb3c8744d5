//! QA type definitions.

use serde::{Deserialize, Serialize};

/// A retrieved unit of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Opaque source identifier (file path, URL, ...)
    pub source: String,

    /// Passage body
    pub content: String,
}

impl Passage {
    /// Create a passage.
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
        }
    }
}

/// Final answer plus the passages that were sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    /// Parsed answer
    pub result: String,

    /// Passages in rank order, exactly as they were presented to the model
    #[serde(rename = "sourceDocuments")]
    pub source_documents: Vec<Passage>,
}

impl AnswerResult {
    /// Create an answer result.
    pub fn new(result: impl Into<String>, source_documents: Vec<Passage>) -> Self {
        Self {
            result: result.into(),
            source_documents,
        }
    }
}

/// Retrieval tuning hints, fixed when a strategy is configured.
///
/// Retrievers may honor them; the stuffing assembler enforces the real limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHints {
    /// How many candidates the retriever ranks
    pub fetch_depth: usize,

    /// How many ranked candidates are intended for use
    pub forward_count: usize,
}

impl Default for SearchHints {
    fn default() -> Self {
        Self {
            fetch_depth: 25,
            forward_count: 3,
        }
    }
}

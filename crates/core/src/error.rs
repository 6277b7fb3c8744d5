//! Error types for docqa.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! model, retrieval, prompt and answer-format failures.

use thiserror::Error;

/// Unified error type for docqa.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// Model and transport failures are carried unchanged in `Llm`; nothing in the
/// QA engine retries or salvages a partial answer.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid or unrecognized configuration (response format, chain type, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Retriever errors
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Iterative refinement was asked to answer with zero passages
    #[error("No documents were retrieved for the query")]
    NoDocuments,

    /// Model output did not match the structured answer contract
    #[error("Failed to parse model output: {0}")]
    FormatParse(String),

    /// Operation not offered by the selected strategy
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

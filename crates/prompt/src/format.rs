//! Answer format contracts.
//!
//! A contract tells the model what shape its answer must take and turns the
//! raw completion back into the answer text.

use docqa_core::{AppError, AppResult};
use std::fmt;
use std::str::FromStr;

/// Field the structured contract asks the model to fill.
pub const ANSWER_FIELD: &str = "resp_str";

/// Configured response format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// JSON snippet with a single answer field
    Structured,
    /// Free text, passed through unchanged
    Plain,
}

impl FromStr for ResponseFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" | "structured" => Ok(Self::Structured),
            "text" | "plain" => Ok(Self::Plain),
            other => Err(AppError::Config(format!(
                "Unrecognised response format '{}'. Use 'json' or 'text'",
                other
            ))),
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured => write!(f, "json"),
            Self::Plain => write!(f, "text"),
        }
    }
}

/// Output contract chosen once per strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatContract {
    /// Model answers with a fenced JSON object holding `field`.
    Structured { field: String, description: String },
    /// Model answers in free text.
    Plain,
}

impl FormatContract {
    /// Contract matching a configured format.
    pub fn for_format(format: ResponseFormat) -> Self {
        match format {
            ResponseFormat::Structured => Self::Structured {
                field: ANSWER_FIELD.to_string(),
                description: "your response".to_string(),
            },
            ResponseFormat::Plain => Self::Plain,
        }
    }

    /// Format this contract was built for.
    pub fn format(&self) -> ResponseFormat {
        match self {
            Self::Structured { .. } => ResponseFormat::Structured,
            Self::Plain => ResponseFormat::Plain,
        }
    }

    /// Instructions describing the expected answer shape. Empty for plain.
    pub fn describe_format(&self) -> String {
        match self {
            Self::Structured { field, description } => format!(
                "The output should be a markdown code snippet formatted in the following schema, \
                 including the leading and trailing \"```json\" and \"```\":\n\n\
                 ```json\n{{\n\t\"{}\": string  // {}\n}}\n```",
                field, description
            ),
            Self::Plain => String::new(),
        }
    }

    /// Turn a raw completion into the answer text.
    pub fn parse(&self, raw: &str) -> AppResult<String> {
        match self {
            Self::Structured { field, .. } => parse_structured(raw, field),
            Self::Plain => Ok(raw.to_string()),
        }
    }
}

fn parse_structured(raw: &str, field: &str) -> AppResult<String> {
    let snippet = extract_json_snippet(raw);

    let value: serde_json::Value = serde_json::from_str(snippet).map_err(|e| {
        AppError::FormatParse(format!("expected a JSON object, got {:?}: {}", raw, e))
    })?;

    match value.get(field) {
        Some(serde_json::Value::String(text)) => Ok(text.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(AppError::FormatParse(format!(
            "missing field '{}' in {}",
            field, snippet
        ))),
    }
}

/// Locate the JSON body: a ```json fence if present, else the outermost braces.
fn extract_json_snippet(raw: &str) -> &str {
    let trimmed = raw.trim();

    if let Some(start) = trimmed.find("```json") {
        let body = &trimmed[start + "```json".len()..];
        let end = body.find("```").unwrap_or(body.len());
        return body[..end].trim();
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

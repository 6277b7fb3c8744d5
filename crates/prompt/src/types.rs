//! Prompt types for docqa.
//!
//! A `PromptDefinition` is what lives on disk; a `PromptTemplate` is the
//! compiled, immutable form the QA strategies render.

use docqa_core::{AppError, AppResult};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name under which the template is registered in its private registry.
const TEMPLATE_NAME: &str = "prompt";

/// A prompt definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Variables the caller must supply when rendering
    #[serde(rename = "inputVariables", default)]
    pub input_variables: Vec<String>,

    /// Template string with Handlebars syntax
    pub template: String,
}

impl PromptDefinition {
    /// Compile this definition into a renderable template.
    pub fn into_template(self) -> AppResult<PromptTemplate> {
        PromptTemplate::new(self.id, &self.template, self.input_variables)
    }
}

/// A compiled prompt template with named placeholder slots.
///
/// Cheap to clone and safe to share across concurrent queries.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    id: String,
    source: String,
    input_variables: Vec<String>,
    registry: Handlebars<'static>,
}

impl PromptTemplate {
    /// Compile `template`, declaring the variables every render must supply.
    pub fn new<S>(id: impl Into<String>, template: &str, input_variables: Vec<S>) -> AppResult<Self>
    where
        S: Into<String>,
    {
        let id = id.into();
        let mut registry = Handlebars::new();

        // Prompts are plain text
        registry.register_escape_fn(handlebars::no_escape);

        registry
            .register_template_string(TEMPLATE_NAME, template)
            .map_err(|e| {
                AppError::Prompt(format!("Failed to register template '{}': {}", id, e))
            })?;

        Ok(Self {
            id,
            source: template.to_string(),
            input_variables: input_variables.into_iter().map(Into::into).collect(),
            registry,
        })
    }

    /// Render the template.
    ///
    /// Fails if a declared input variable is missing. Extra variables are
    /// ignored.
    pub fn render(&self, variables: &HashMap<String, String>) -> AppResult<String> {
        if let Some(missing) = self
            .input_variables
            .iter()
            .find(|name| !variables.contains_key(name.as_str()))
        {
            return Err(AppError::Prompt(format!(
                "Template '{}' is missing variable '{}'",
                self.id, missing
            )));
        }

        self.registry
            .render(TEMPLATE_NAME, variables)
            .map_err(|e| AppError::Prompt(format!("Failed to render template '{}': {}", self.id, e)))
    }

    /// Template identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Declared input variables.
    pub fn input_variables(&self) -> &[String] {
        &self.input_variables
    }

    /// Whether `name` is declared and placed somewhere in the template text.
    pub fn fills(&self, name: &str) -> bool {
        self.input_variables.iter().any(|v| v == name)
            && self
                .source
                .split("{{")
                .skip(1)
                .filter_map(|rest| rest.split_once("}}"))
                .any(|(inner, _)| inner.trim_start_matches('{').trim() == name)
    }
}

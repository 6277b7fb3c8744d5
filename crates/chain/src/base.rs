//! Shared QA configuration and the strategy trait.
//!
//! `BaseQa` owns everything the strategies have in common: the model, the
//! retriever, the optional prompt override, the answer format contract and
//! the retrieval hints. Each strategy wraps one and implements `QaStrategy`.

use crate::progress::ProgressReporter;
use crate::retriever::Retriever;
use crate::types::{AnswerResult, Passage, SearchHints};
use docqa_core::{AppError, AppResult};
use docqa_llm::LanguageModel;
use docqa_prompt::defaults::{self, QUESTION};
use docqa_prompt::{FormatContract, PromptTemplate, ResponseFormat};
use std::collections::HashMap;
use std::sync::Arc;

/// Configuration shared by every QA strategy.
#[derive(Clone)]
pub struct BaseQa {
    model: LanguageModel,
    retriever: Arc<dyn Retriever>,
    prompt: Option<PromptTemplate>,
    contract: FormatContract,
    hints: SearchHints,
    hard_coded_response: Option<String>,
    progress: ProgressReporter,
}

impl std::fmt::Debug for BaseQa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseQa")
            .field("model", &self.model)
            .field("prompt", &self.prompt.as_ref().map(PromptTemplate::id))
            .field("format", &self.contract.format())
            .field("hints", &self.hints)
            .field("hard_coded_response", &self.hard_coded_response.is_some())
            .finish()
    }
}

impl BaseQa {
    /// Configure a strategy base.
    ///
    /// `response_format` must be "json"/"structured" or "text"/"plain";
    /// anything else is a configuration error. `prompt` replaces the
    /// strategy's built-in template when given.
    pub fn configure(
        model: LanguageModel,
        retriever: Arc<dyn Retriever>,
        prompt: Option<PromptTemplate>,
        response_format: &str,
    ) -> AppResult<Self> {
        let format: ResponseFormat = response_format.parse()?;

        Ok(Self {
            model,
            retriever,
            prompt,
            contract: FormatContract::for_format(format),
            hints: SearchHints::default(),
            hard_coded_response: None,
            progress: ProgressReporter::noop(),
        })
    }

    /// Set the retrieval hints passed to the retriever.
    pub fn with_hints(mut self, hints: SearchHints) -> AppResult<Self> {
        if hints.fetch_depth == 0 || hints.forward_count == 0 {
            return Err(AppError::Config(
                "fetch_depth and forward_count must be positive".to_string(),
            ));
        }
        self.hints = hints;
        Ok(self)
    }

    /// Answer with `response` instead of calling the model (stuffing only).
    ///
    /// A blank response counts as none.
    pub fn with_hard_coded_response(mut self, response: Option<String>) -> Self {
        self.hard_coded_response = response.filter(|r| !r.trim().is_empty());
        self
    }

    /// Route progress notifications to `progress`.
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Fetch passages for `query`, most relevant first.
    ///
    /// The retriever's order is kept as is.
    pub async fn fetch_documents(&self, query: &str) -> AppResult<Vec<Passage>> {
        let passages = self.retriever.fetch(query, &self.hints).await?;
        tracing::info!("Retrieved {} passages", passages.len());
        self.progress.fetched(passages.len());
        Ok(passages)
    }

    /// Description of the expected answer shape; empty for plain text.
    pub fn format_instructions(&self) -> String {
        self.contract.describe_format()
    }

    /// One-shot answer from the question alone, without retrieval.
    pub async fn answer_directly(&self, query: &str) -> AppResult<String> {
        let mut variables = HashMap::new();
        variables.insert(QUESTION.to_string(), query.to_string());

        let prompt = defaults::direct_prompt()?.render(&variables)?;
        self.model.predict(&prompt).await
    }

    /// Language model handle.
    pub fn model(&self) -> &LanguageModel {
        &self.model
    }

    /// Prompt override, rejected unless it fills every slot in `slots`.
    ///
    /// An override that drops the passages or the question would still be
    /// sent, and the answer would cite passages the model never saw.
    pub fn checked_override(&self, slots: &[&str]) -> AppResult<Option<PromptTemplate>> {
        let Some(prompt) = &self.prompt else {
            return Ok(None);
        };

        if let Some(missing) = slots.iter().find(|slot| !prompt.fills(slot)) {
            return Err(AppError::Config(format!(
                "Prompt '{}' must declare and use the '{}' variable",
                prompt.id(),
                missing
            )));
        }
        Ok(Some(prompt.clone()))
    }

    /// Answer format contract.
    pub fn contract(&self) -> &FormatContract {
        &self.contract
    }

    /// Retrieval hints.
    pub fn hints(&self) -> SearchHints {
        self.hints
    }

    /// Literal answer that bypasses the model.
    pub fn hard_coded_response(&self) -> Option<&str> {
        self.hard_coded_response.as_deref()
    }

    /// Progress reporter.
    pub fn progress(&self) -> &ProgressReporter {
        &self.progress
    }
}

/// A question-answering strategy.
#[async_trait::async_trait]
pub trait QaStrategy: Send + Sync {
    /// Short strategy name used in logs.
    fn name(&self) -> &'static str;

    /// Shared configuration.
    fn base(&self) -> &BaseQa;

    /// Fetch ranked passages for `query`.
    async fn fetch_documents(&self, query: &str) -> AppResult<Vec<Passage>> {
        self.base().fetch_documents(query).await
    }

    /// Description of the expected answer shape.
    fn format_instructions(&self) -> String {
        self.base().format_instructions()
    }

    /// Answer `query`.
    ///
    /// Defaults to a single prediction over the bare question.
    async fn answer(&self, query: &str) -> AppResult<AnswerResult> {
        let result = self.base().answer_directly(query).await?;
        Ok(AnswerResult::new(result, Vec::new()))
    }

    /// The exact prompt `answer` would send, without calling the model.
    async fn rendered_prompt(&self, _query: &str) -> AppResult<String> {
        Err(AppError::Unsupported(format!(
            "the {} strategy does not assemble a single prompt",
            self.name()
        )))
    }
}

#[async_trait::async_trait]
impl QaStrategy for BaseQa {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn base(&self) -> &BaseQa {
        self
    }
}

//! Single-pass stuffing strategy.
//!
//! Packs as many top-ranked passages as the model's prompt budget allows into
//! one prompt and asks the model once.

use crate::base::{BaseQa, QaStrategy};
use crate::types::{AnswerResult, Passage};
use docqa_core::AppResult;
use docqa_prompt::defaults::{self, CONTEXT, FORMAT_INSTRUCTIONS, QUESTION};
use docqa_prompt::PromptTemplate;
use std::collections::HashMap;

/// The prompt chosen by the assembler and the passages inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct StuffedPrompt {
    /// Fully rendered prompt
    pub prompt: String,

    /// Passages included in `prompt`, a prefix of the fetched ranking
    pub passages: Vec<Passage>,

    /// Token count of `prompt`
    pub tokens: usize,
}

/// Bounded-stuffing QA strategy.
#[derive(Debug, Clone)]
pub struct StuffQa {
    base: BaseQa,
    prompt: PromptTemplate,
}

impl StuffQa {
    /// Build the strategy, using the base's prompt override if present.
    ///
    /// The override must fill both the question and the context slot.
    pub fn new(base: BaseQa) -> AppResult<Self> {
        let prompt = match base.checked_override(&[QUESTION, CONTEXT])? {
            Some(prompt) => prompt,
            None => defaults::stuff_prompt()?,
        };

        Ok(Self { base, prompt })
    }

    /// Label passages `Extract 1:`, `Extract 2:`, ... separated by blank lines.
    pub fn context_block(passages: &[Passage]) -> String {
        passages
            .iter()
            .enumerate()
            .map(|(i, passage)| format!("Extract {}: {}", i + 1, passage.content))
            .collect::<Vec<_>>()
            .join("\n\n")
            .trim()
            .to_string()
    }

    fn render(&self, query: &str, passages: &[Passage], instructions: &str) -> AppResult<String> {
        let mut variables = HashMap::new();
        variables.insert(QUESTION.to_string(), query.to_string());
        variables.insert(CONTEXT.to_string(), Self::context_block(passages));
        variables.insert(FORMAT_INSTRUCTIONS.to_string(), instructions.to_string());

        self.prompt.render(&variables)
    }

    /// Fetch passages and stuff the longest ranked prefix that fits.
    ///
    /// Scanning stops at the first passage that would overflow the budget,
    /// even if a later, shorter passage would fit.
    pub async fn prepare(&self, query: &str) -> AppResult<StuffedPrompt> {
        let fetched = self.base.fetch_documents(query).await?;
        let instructions = self.base.format_instructions();

        let model = self.base.model();
        let budget = model.prompt_budget();

        let mut included: Vec<Passage> = Vec::with_capacity(fetched.len());
        let mut prompt = self.render(query, &included, &instructions)?;
        let mut tokens = model.count_tokens(&prompt);

        for passage in &fetched {
            included.push(passage.clone());

            let candidate = self.render(query, &included, &instructions)?;
            let candidate_tokens = model.count_tokens(&candidate);

            if candidate_tokens > budget {
                included.pop();
                tracing::debug!(
                    rank = included.len() + 1,
                    tokens = candidate_tokens,
                    budget,
                    "Passage overflows the prompt budget"
                );
                break;
            }

            prompt = candidate;
            tokens = candidate_tokens;
        }

        tracing::info!(
            "Stuffed {} of {} documents in the context ({} / {} tokens)",
            included.len(),
            fetched.len(),
            tokens,
            budget
        );
        self.base.progress().stuffed(included.len(), fetched.len());

        Ok(StuffedPrompt {
            prompt,
            passages: included,
            tokens,
        })
    }
}

#[async_trait::async_trait]
impl QaStrategy for StuffQa {
    fn name(&self) -> &'static str {
        "stuff"
    }

    fn base(&self) -> &BaseQa {
        &self.base
    }

    async fn answer(&self, query: &str) -> AppResult<AnswerResult> {
        let stuffed = self.prepare(query).await?;

        if let Some(response) = self.base.hard_coded_response() {
            tracing::info!("Returning hard-coded response");
            return Ok(AnswerResult::new(response, stuffed.passages));
        }

        let raw = self.base.model().predict(&stuffed.prompt).await?;
        let result = self.base.contract().parse(&raw)?;

        Ok(AnswerResult::new(result, stuffed.passages))
    }

    async fn rendered_prompt(&self, query: &str) -> AppResult<String> {
        Ok(self.prepare(query).await?.prompt)
    }
}

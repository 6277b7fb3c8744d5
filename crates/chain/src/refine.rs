//! Iterative refinement strategy.
//!
//! Visits every retrieved passage with its own model call, threading the
//! running answer from one call to the next. No prompt ever holds more than
//! one passage.

use crate::base::{BaseQa, QaStrategy};
use crate::types::{AnswerResult, Passage};
use docqa_core::{AppError, AppResult};
use docqa_prompt::defaults::{self, CONTEXT, FORMAT_INSTRUCTIONS, PREVIOUS_ANSWER, QUESTION};
use docqa_prompt::PromptTemplate;
use std::collections::HashMap;

/// Where a refinement run stands.
///
/// Finishing a run (see [`RefineState::finish`]) consumes the state and
/// yields the final answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefineState {
    /// No passage consumed yet
    Start,
    /// First passage answered
    Seeded { answer: String },
    /// `step` passages consumed (step >= 2)
    Refining { answer: String, step: usize },
}

impl RefineState {
    /// Adopt the answer produced for the next passage.
    pub fn advance(self, answer: String) -> Self {
        match self {
            Self::Start => Self::Seeded { answer },
            Self::Seeded { .. } => Self::Refining { answer, step: 2 },
            Self::Refining { step, .. } => Self::Refining {
                answer,
                step: step + 1,
            },
        }
    }

    /// Close the run once the passages are exhausted.
    ///
    /// A run that never left `Start` had nothing to answer from.
    pub fn finish(self) -> AppResult<String> {
        match self {
            Self::Start => Err(AppError::NoDocuments),
            Self::Seeded { answer } | Self::Refining { answer, .. } => Ok(answer),
        }
    }

    /// Running answer, if any passage has been consumed.
    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::Start => None,
            Self::Seeded { answer } | Self::Refining { answer, .. } => Some(answer),
        }
    }
}

/// Iterative refinement QA strategy.
#[derive(Debug, Clone)]
pub struct RefineQa {
    base: BaseQa,
    question_prompt: PromptTemplate,
    refine_prompt: PromptTemplate,
}

impl RefineQa {
    /// Build the strategy.
    ///
    /// A prompt override on the base replaces the first-step template and
    /// must fill both the question and the context slot. Later steps always
    /// use the built-in refine template.
    pub fn new(base: BaseQa) -> AppResult<Self> {
        let question_prompt = match base.checked_override(&[QUESTION, CONTEXT])? {
            Some(prompt) => prompt,
            None => defaults::refine_question_prompt()?,
        };

        Ok(Self {
            base,
            question_prompt,
            refine_prompt: defaults::refine_prompt()?,
        })
    }

    fn render_step(
        &self,
        state: &RefineState,
        query: &str,
        passage: &Passage,
        instructions: &str,
    ) -> AppResult<String> {
        let mut variables = HashMap::new();
        variables.insert(QUESTION.to_string(), query.to_string());
        variables.insert(CONTEXT.to_string(), passage.content.clone());
        variables.insert(FORMAT_INSTRUCTIONS.to_string(), instructions.to_string());

        match state.answer() {
            None => self.question_prompt.render(&variables),
            Some(previous) => {
                variables.insert(PREVIOUS_ANSWER.to_string(), previous.to_string());
                self.refine_prompt.render(&variables)
            }
        }
    }
}

#[async_trait::async_trait]
impl QaStrategy for RefineQa {
    fn name(&self) -> &'static str {
        "refine"
    }

    fn base(&self) -> &BaseQa {
        &self.base
    }

    async fn answer(&self, query: &str) -> AppResult<AnswerResult> {
        let passages = self.base.fetch_documents(query).await?;
        if passages.is_empty() {
            return Err(AppError::NoDocuments);
        }

        let instructions = self.base.format_instructions();
        let model = self.base.model();
        let contract = self.base.contract();
        let total = passages.len();

        let mut state = RefineState::Start;
        for (i, passage) in passages.iter().enumerate() {
            tracing::info!("Refining from document {}/{}", i + 1, total);
            self.base.progress().refining(i + 1, total);

            let prompt = self.render_step(&state, query, passage, &instructions)?;
            tracing::debug!(tokens = model.count_tokens(&prompt), "Refinement prompt");

            let raw = model.predict(&prompt).await?;
            state = state.advance(contract.parse(&raw)?);
        }

        Ok(AnswerResult::new(state.finish()?, passages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::StaticRetriever;
    use docqa_llm::{LanguageModel, MockClient, ModelSettings};
    use std::sync::Arc;

    fn refine_qa(client: Arc<MockClient>, passages: Vec<Passage>, format: &str) -> RefineQa {
        let model = LanguageModel::new(client, ModelSettings::new("mock", 4096, 256)).unwrap();
        let base = BaseQa::configure(
            model,
            Arc::new(StaticRetriever::new(passages)),
            None,
            format,
        )
        .unwrap();
        RefineQa::new(base).unwrap()
    }

    fn three_passages() -> Vec<Passage> {
        vec![
            Passage::new("a.md", "alpha extract"),
            Passage::new("b.md", "beta extract"),
            Passage::new("c.md", "gamma extract"),
        ]
    }

    #[test]
    fn test_state_transitions() {
        let state = RefineState::Start.advance("one".to_string());
        assert_eq!(
            state,
            RefineState::Seeded {
                answer: "one".to_string()
            }
        );

        let state = state.advance("two".to_string()).advance("three".to_string());
        assert_eq!(
            state,
            RefineState::Refining {
                answer: "three".to_string(),
                step: 3
            }
        );

        assert_eq!(state.answer(), Some("three"));
        assert_eq!(state.finish().unwrap(), "three");
    }

    #[test]
    fn test_finish_from_start_is_no_documents() {
        assert!(matches!(
            RefineState::Start.finish(),
            Err(AppError::NoDocuments)
        ));
    }

    #[tokio::test]
    async fn test_threads_running_answer() {
        let client = Arc::new(MockClient::with_responses(["first", "second", "third"]));
        let qa = refine_qa(client.clone(), three_passages(), "text");

        let answer = qa.answer("q").await.unwrap();
        assert_eq!(answer.result, "third");

        let requests = client.requests();
        assert_eq!(requests.len(), 3);

        // Seed step: base template, no previous answer
        assert!(requests[0].prompt.contains("alpha extract"));
        assert!(!requests[0].prompt.contains("Original answer"));

        // Refine steps carry the previous answer and only their own extract
        assert!(requests[1].prompt.contains("Original answer:\n-----------------\nfirst"));
        assert!(requests[1].prompt.contains("beta extract"));
        assert!(!requests[1].prompt.contains("alpha extract"));
        assert!(requests[2].prompt.contains("Original answer:\n-----------------\nsecond"));
        assert!(requests[2].prompt.contains("gamma extract"));
    }

    #[tokio::test]
    async fn test_structured_answers_are_parsed_each_step() {
        let client = Arc::new(MockClient::with_responses([
            "{\"resp_str\": \"seed\"}",
            "```json\n{\"resp_str\": \"refined\"}\n```",
        ]));
        let qa = refine_qa(client.clone(), three_passages()[..2].to_vec(), "json");

        let answer = qa.answer("q").await.unwrap();
        assert_eq!(answer.result, "refined");

        let requests = client.requests();
        assert!(requests[0].prompt.contains("\"resp_str\": string"));
        assert!(requests[1].prompt.contains("Original answer:\n-----------------\nseed"));
    }

    fn base_with_override(client: Arc<MockClient>, template: &str, variables: Vec<&str>) -> BaseQa {
        let model = LanguageModel::new(client, ModelSettings::new("mock", 4096, 256)).unwrap();
        let prompt = PromptTemplate::new("custom", template, variables).unwrap();
        BaseQa::configure(
            model,
            Arc::new(StaticRetriever::new(three_passages())),
            Some(prompt),
            "text",
        )
        .unwrap()
    }

    #[test]
    fn test_override_without_context_is_rejected() {
        let base = base_with_override(Arc::new(MockClient::new()), "Q: {{question}}", vec!["question"]);
        match RefineQa::new(base) {
            Err(AppError::Config(msg)) => assert!(msg.contains("context")),
            other => panic!("expected config error, got {:?}", other),
        }

        let base = base_with_override(Arc::new(MockClient::new()), "{{context}}", vec!["context"]);
        assert!(matches!(RefineQa::new(base), Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_override_seeds_with_first_extract() {
        let client = Arc::new(MockClient::new());
        let base = base_with_override(
            client.clone(),
            "{{context}}\nQ: {{question}}",
            vec!["question", "context"],
        );

        RefineQa::new(base).unwrap().answer("why?").await.unwrap();

        let requests = client.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].prompt, "alpha extract\nQ: why?");
        assert!(requests[1].prompt.contains("beta extract"));
    }

    #[tokio::test]
    async fn test_failure_mid_refinement_aborts() {
        let client = Arc::new(MockClient::new().failing_on(2));
        let qa = refine_qa(client.clone(), three_passages(), "text");

        let result = qa.answer("q").await;
        assert!(matches!(result, Err(AppError::Llm(_))));
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_hard_coded_response_is_ignored() {
        let client = Arc::new(MockClient::new());
        let model = LanguageModel::new(client.clone(), ModelSettings::new("mock", 4096, 256)).unwrap();
        let base = BaseQa::configure(
            model,
            Arc::new(StaticRetriever::new(three_passages())),
            None,
            "text",
        )
        .unwrap()
        .with_hard_coded_response(Some("canned".to_string()));

        let answer = RefineQa::new(base).unwrap().answer("q").await.unwrap();
        assert_eq!(answer.result, "answer-3");
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_rendered_prompt_unsupported() {
        let qa = refine_qa(Arc::new(MockClient::new()), three_passages(), "text");
        assert!(matches!(
            qa.rendered_prompt("q").await,
            Err(AppError::Unsupported(_))
        ));
    }
}

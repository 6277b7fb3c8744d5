//! Ask command handler.
//!
//! Answers a question from the passage corpus with the configured strategy.

use super::{build_base, read_question};
use clap::Args;
use docqa_chain::{build_strategy, AnswerResult, ChainType};
use docqa_core::{config::AppConfig, AppResult};
use std::path::PathBuf;

/// Answer a question from the passage corpus
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "question")]
    pub file: Option<PathBuf>,

    /// Passage corpus in JSONL (default: .docqa/passages.jsonl)
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Prompt template to use instead of the built-in one (.docqa/prompts/<id>.yml)
    #[arg(long)]
    pub prompt_id: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = read_question(self.question.as_deref(), self.file.as_deref())?;
        let chain_type: ChainType = config.qa.chain_type.parse()?;

        let base = build_base(config, self.corpus.as_deref(), self.prompt_id.as_deref())?;
        let strategy = build_strategy(chain_type, base)?;
        tracing::info!("Answering with the {} strategy", strategy.name());

        let answer = strategy.answer(&question).await?;
        println!("{}", self.render(&answer)?);

        Ok(())
    }

    fn render(&self, answer: &AnswerResult) -> AppResult<String> {
        if self.json {
            let output = serde_json::json!({
                "answer": answer.result,
                "sources": answer.source_documents,
            });
            return Ok(serde_json::to_string_pretty(&output)?);
        }

        let mut text = answer.result.trim().to_string();
        if !answer.source_documents.is_empty() {
            text.push_str("\n\nSources:");
            for passage in &answer.source_documents {
                text.push_str(&format!("\n- {}", passage.source));
            }
        }
        Ok(text)
    }
}

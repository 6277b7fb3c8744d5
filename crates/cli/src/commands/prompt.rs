//! Prompt command handler.
//!
//! Prints the exact stuffed prompt a question would produce, or lists the
//! prompt templates available in the workspace.

use super::{build_base, read_question};
use clap::Args;
use docqa_chain::{build_strategy, ChainType};
use docqa_core::{config::AppConfig, AppResult};
use docqa_prompt::list_prompts;
use std::path::PathBuf;

/// Print the stuffed prompt for a question without calling the model
#[derive(Args, Debug)]
pub struct PromptCommand {
    /// The question to render a prompt for
    #[arg(required_unless_present_any = ["file", "list"])]
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

    /// List prompt templates in the workspace instead
    #[arg(long)]
    pub list: bool,
}

impl PromptCommand {
    /// Execute the prompt command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing prompt command");

        if self.list {
            for id in list_prompts(&config.workspace)? {
                println!("{}", id);
            }
            return Ok(());
        }

        let question = read_question(self.question.as_deref(), self.file.as_deref())?;

        let base = build_base(config, self.corpus.as_deref(), self.prompt_id.as_deref())?;
        let strategy = build_strategy(ChainType::Stuff, base)?;

        println!("{}", strategy.rendered_prompt(&question).await?);
        Ok(())
    }
}

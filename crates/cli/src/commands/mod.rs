//! Command handlers for the docqa CLI.
//!
//! Each command lives in its own submodule. Both build their QA base through
//! [`build_base`].

pub mod ask;
pub mod prompt;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use prompt::PromptCommand;

use docqa_chain::{BaseQa, CorpusRetriever, ProgressEvent, ProgressReporter, SearchHints};
use docqa_core::config::{AppConfig, ProviderConfig};
use docqa_core::{AppError, AppResult};
use docqa_llm::{create_client, ClientOptions, LanguageModel, ModelSettings, TokenizerCounter};
use docqa_prompt::load_prompt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Corpus file used when `--corpus` is not given, relative to `.docqa/`.
const DEFAULT_CORPUS: &str = "passages.jsonl";

/// Resolve the question from a positional argument or a file.
pub(crate) fn read_question(question: Option<&str>, file: Option<&Path>) -> AppResult<String> {
    let text = match (question, file) {
        (Some(question), _) => question.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => return Err(AppError::Config("No question provided".to_string())),
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Config("Question is empty".to_string()));
    }
    Ok(text.to_string())
}

/// Client options for the active provider.
fn client_options(config: &AppConfig) -> ClientOptions {
    let mut options = ClientOptions {
        endpoint: config.endpoint.clone(),
        ..Default::default()
    };

    match config.get_provider_config(&config.provider) {
        Some(ProviderConfig::Ollama { timeout, .. }) => options.timeout_secs = *timeout,
        Some(ProviderConfig::Mock { responses }) => options.mock_responses = responses.clone(),
        None => {}
    }

    options
}

/// Assemble the shared QA configuration from the app config.
pub(crate) fn build_base(
    config: &AppConfig,
    corpus: Option<&Path>,
    prompt_id: Option<&str>,
) -> AppResult<BaseQa> {
    let client =
        create_client(&config.provider, &client_options(config)).map_err(AppError::Config)?;
    let mut model =
        LanguageModel::new(client, ModelSettings::from_qa(&config.model, &config.qa))?;
    match config.tokenizer_path() {
        Some(path) => {
            let counter = TokenizerCounter::from_file(&path)?;
            tracing::info!("Counting prompt tokens with {:?}", counter.source());
            model = model.with_token_counter(Arc::new(counter));
        }
        None => tracing::debug!("No tokenizer configured, estimating prompt tokens"),
    }

    let corpus_path: PathBuf = corpus
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.docqa_dir().join(DEFAULT_CORPUS));
    let retriever = CorpusRetriever::load(&corpus_path)?;
    tracing::info!("Loaded {} passages from {:?}", retriever.len(), corpus_path);

    let prompt = match prompt_id {
        Some(id) => Some(load_prompt(&config.workspace, id)?),
        None => None,
    };

    let hints = SearchHints {
        fetch_depth: config.qa.fetch_depth as usize,
        forward_count: config.qa.forward_count as usize,
    };

    let progress = if config.verbose {
        ProgressReporter::new(Arc::new(|event: ProgressEvent| {
            eprintln!("{}", event.format_simple())
        }))
    } else {
        ProgressReporter::noop()
    };

    Ok(
        BaseQa::configure(model, Arc::new(retriever), prompt, &config.qa.response_format)?
            .with_hints(hints)?
            .with_hard_coded_response(config.qa.hard_coded_response.clone())
            .with_progress(progress),
    )
}

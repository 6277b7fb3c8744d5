//! Token counting.
//!
//! Prompt budgets are checked against a [`TokenCounter`]. When the model's
//! HuggingFace `tokenizer.json` is available, [`TokenizerCounter`] gives
//! exact counts; otherwise [`estimate_tokens`] stands in. The estimate leans
//! high so that budget checks built on it stay on the safe side.

use docqa_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// Average characters per BPE token for long words.
const CHARS_PER_TOKEN: usize = 4;

/// Estimate the number of tokens in `text`.
///
/// Every word and punctuation segment counts as at least one token; long
/// words count one token per four characters.
pub fn estimate_tokens(text: &str) -> usize {
    text.split_word_bounds()
        .filter(|segment| !segment.trim().is_empty())
        .map(|segment| {
            let chars = segment.chars().count();
            chars.div_ceil(CHARS_PER_TOKEN).max(1)
        })
        .sum()
}

/// Counts the tokens a text occupies in a model's window.
pub trait TokenCounter: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;
}

/// Exact counts from a HuggingFace tokenizer.
#[derive(Clone)]
pub struct TokenizerCounter {
    tokenizer: Arc<tokenizers::Tokenizer>,
    source: PathBuf,
}

impl TokenizerCounter {
    /// Load a `tokenizer.json` file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let tokenizer = tokenizers::Tokenizer::from_file(path).map_err(|e| {
            AppError::Config(format!("Failed to load tokenizer {:?}: {}", path, e))
        })?;

        tracing::debug!(
            path = ?path,
            vocab_size = tokenizer.get_vocab_size(true),
            "Loaded tokenizer"
        );

        Ok(Self {
            tokenizer: Arc::new(tokenizer),
            source: path.to_path_buf(),
        })
    }

    /// File the tokenizer was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl TokenCounter for TokenizerCounter {
    /// Includes the special tokens the tokenizer adds around an input.
    fn count_tokens(&self, text: &str) -> usize {
        match self.tokenizer.encode(text, true) {
            Ok(encoding) => encoding.get_ids().len(),
            Err(e) => {
                tracing::warn!(error = %e, "Tokenizer failed, estimating token count");
                estimate_tokens(text)
            }
        }
    }
}

impl std::fmt::Debug for TokenizerCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenizerCounter")
            .field("source", &self.source)
            .finish()
    }
}

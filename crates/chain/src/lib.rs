//! Retrieval-augmented question answering for docqa.
//!
//! Two strategies answer a question from ranked passages:
//! - **Stuff**: packs the longest ranked prefix of passages that fits the
//!   model's prompt budget into a single prompt
//! - **Refine**: walks every passage in order, one model call each, refining
//!   a running answer
//!
//! Both share a `BaseQa` (model, retriever, prompt override, answer format)
//! and implement `QaStrategy`.

pub mod base;
pub mod factory;
pub mod progress;
pub mod refine;
pub mod retriever;
pub mod stuff;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export main types
pub use base::{BaseQa, QaStrategy};
pub use factory::{build_strategy, ChainType};
pub use progress::{ProgressCallback, ProgressEvent, ProgressReporter};
pub use refine::{RefineQa, RefineState};
pub use retriever::{CorpusRetriever, Retriever, StaticRetriever};
pub use stuff::{StuffQa, StuffedPrompt};
pub use types::{AnswerResult, Passage, SearchHints};

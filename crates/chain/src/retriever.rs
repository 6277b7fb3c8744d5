//! Passage retrievers.
//!
//! The QA strategies only see the `Retriever` trait. Two implementations ship
//! with the crate: a fixed list for tests and demos, and a keyword-ranked
//! corpus loaded from a JSONL file.

use crate::types::{Passage, SearchHints};
use docqa_core::{AppError, AppResult};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Mutex;

/// Source of ranked passages.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Fetch passages for `query`, most relevant first.
    async fn fetch(&self, query: &str, hints: &SearchHints) -> AppResult<Vec<Passage>>;
}

/// Retriever returning the same ranked passages for every query.
#[derive(Debug, Default)]
pub struct StaticRetriever {
    passages: Vec<Passage>,
    last_hints: Mutex<Option<SearchHints>>,
}

impl StaticRetriever {
    /// Create a retriever over `passages`, already in rank order.
    pub fn new(passages: Vec<Passage>) -> Self {
        Self {
            passages,
            last_hints: Mutex::new(None),
        }
    }

    /// Hints received by the most recent fetch.
    pub fn last_hints(&self) -> Option<SearchHints> {
        self.last_hints.lock().ok().and_then(|hints| *hints)
    }
}

#[async_trait::async_trait]
impl Retriever for StaticRetriever {
    async fn fetch(&self, _query: &str, hints: &SearchHints) -> AppResult<Vec<Passage>> {
        if let Ok(mut last) = self.last_hints.lock() {
            *last = Some(*hints);
        }
        Ok(self.passages.clone())
    }
}

/// Keyword-ranked passage corpus.
///
/// Passages are scored by how often the query's terms occur in them. Ties
/// keep corpus order. Passages sharing no term with the query are dropped.
#[derive(Debug, Clone)]
pub struct CorpusRetriever {
    passages: Vec<Passage>,
}

impl CorpusRetriever {
    /// Create a retriever over in-memory passages.
    pub fn from_passages(passages: Vec<Passage>) -> Self {
        Self { passages }
    }

    /// Load passages from a JSONL file, one `{"source", "content"}` object per line.
    pub fn load(path: &Path) -> AppResult<Self> {
        let file = File::open(path).map_err(|e| {
            AppError::Retrieval(format!("Failed to open corpus {:?}: {}", path, e))
        })?;

        let reader = BufReader::new(file);
        let mut passages = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                AppError::Retrieval(format!("Failed to read line {}: {}", line_num + 1, e))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let passage: Passage = serde_json::from_str(&line).map_err(|e| {
                AppError::Retrieval(format!(
                    "Failed to parse line {} in {:?}: {}",
                    line_num + 1,
                    path,
                    e
                ))
            })?;

            passages.push(passage);
        }

        tracing::debug!("Loaded {} passages from {:?}", passages.len(), path);
        Ok(Self { passages })
    }

    /// Number of passages in the corpus.
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    /// Whether the corpus is empty.
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    fn rank(&self, query: &str, hints: &SearchHints) -> Vec<Passage> {
        let terms = query_terms(query);

        let mut scored: Vec<(usize, &Passage)> = self
            .passages
            .iter()
            .map(|passage| (term_frequency(&terms, &passage.content), passage))
            .filter(|(score, _)| *score > 0)
            .collect();

        // Stable sort keeps corpus order among equal scores
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(hints.fetch_depth);
        scored.truncate(hints.forward_count);

        scored.into_iter().map(|(_, p)| p.clone()).collect()
    }
}

#[async_trait::async_trait]
impl Retriever for CorpusRetriever {
    async fn fetch(&self, query: &str, hints: &SearchHints) -> AppResult<Vec<Passage>> {
        let ranked = self.rank(query, hints);
        tracing::debug!(
            candidates = self.passages.len(),
            returned = ranked.len(),
            "Ranked corpus passages"
        );
        Ok(ranked)
    }
}

/// Lowercased alphanumeric query terms longer than two characters.
fn query_terms(query: &str) -> HashSet<String> {
    tokenize(query).filter(|t| t.chars().count() > 2).collect()
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn term_frequency(terms: &HashSet<String>, content: &str) -> usize {
    tokenize(content).filter(|t| terms.contains(t)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn corpus() -> CorpusRetriever {
        CorpusRetriever::from_passages(vec![
            Passage::new("cardio.md", "Aspirin thins the blood."),
            Passage::new("diabetes.md", "Insulin lowers blood glucose. Insulin is a hormone."),
            Passage::new("renal.md", "Metformin is cleared by the kidneys; glucose control."),
            Passage::new("misc.md", "Unrelated text about gardening."),
        ])
    }

    #[tokio::test]
    async fn test_corpus_ranks_by_term_frequency() {
        let hints = SearchHints {
            fetch_depth: 10,
            forward_count: 10,
        };
        let passages = corpus().fetch("How does insulin affect glucose?", &hints).await.unwrap();

        let sources: Vec<&str> = passages.iter().map(|p| p.source.as_str()).collect();
        assert_eq!(sources, vec!["diabetes.md", "renal.md"]);
    }

    #[tokio::test]
    async fn test_corpus_honors_forward_count() {
        let hints = SearchHints {
            fetch_depth: 10,
            forward_count: 1,
        };
        let passages = corpus().fetch("blood glucose", &hints).await.unwrap();
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].source, "diabetes.md");
    }

    #[tokio::test]
    async fn test_corpus_ties_keep_corpus_order() {
        let hints = SearchHints::default();
        let passages = corpus().fetch("blood", &hints).await.unwrap();
        let sources: Vec<&str> = passages.iter().map(|p| p.source.as_str()).collect();
        assert_eq!(sources, vec!["cardio.md", "diabetes.md"]);
    }

    #[test]
    fn test_load_jsonl() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"source": "a.md", "content": "alpha"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"source": "b.md", "content": "beta"}}"#).unwrap();

        let retriever = CorpusRetriever::load(file.path()).unwrap();
        assert_eq!(retriever.len(), 2);
    }

    #[test]
    fn test_load_reports_bad_line() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"source": "a.md", "content": "alpha"}}"#).unwrap();
        writeln!(file, "not json").unwrap();

        match CorpusRetriever::load(file.path()) {
            Err(AppError::Retrieval(msg)) => assert!(msg.contains("line 2")),
            other => panic!("expected retrieval error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_static_retriever_records_hints() {
        let retriever = StaticRetriever::new(vec![Passage::new("a", "b")]);
        let hints = SearchHints {
            fetch_depth: 7,
            forward_count: 2,
        };

        let passages = retriever.fetch("anything", &hints).await.unwrap();
        assert_eq!(passages.len(), 1);
        assert_eq!(retriever.last_hints(), Some(hints));
    }
}

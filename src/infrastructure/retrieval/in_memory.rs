//! In-memory lexical retriever

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::RetrievalConfig;
use crate::domain::retrieval::{Document, Retriever};
use crate::domain::DomainError;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "did", "do", "does", "for", "from",
    "how", "i", "in", "is", "it", "its", "me", "of", "on", "or", "that", "the", "this", "to",
    "was", "were", "what", "when", "where", "which", "who", "why", "will", "with", "you",
];

/// Scores passages by the share of distinct query terms they contain
///
/// Scores below `score_threshold` are dropped, ties keep insertion order and
/// at most `top_k` passages are returned.
#[derive(Debug, Clone)]
pub struct InMemoryRetriever {
    config: RetrievalConfig,
    passages: Arc<RwLock<Vec<IndexedPassage>>>,
}

#[derive(Debug)]
struct IndexedPassage {
    document: Document,
    terms: HashSet<String>,
}

impl InMemoryRetriever {
    pub fn new(config: RetrievalConfig) -> Self {
        Self {
            config,
            passages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_documents(config: RetrievalConfig, documents: Vec<Document>) -> Self {
        let passages = documents.into_iter().map(IndexedPassage::new).collect();

        Self {
            config,
            passages: Arc::new(RwLock::new(passages)),
        }
    }

    pub async fn add_documents(&self, documents: Vec<Document>) -> usize {
        let count = documents.len();
        self.passages
            .write()
            .await
            .extend(documents.into_iter().map(IndexedPassage::new));
        count
    }

    pub async fn len(&self) -> usize {
        self.passages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.passages.read().await.is_empty()
    }
}

impl IndexedPassage {
    fn new(document: Document) -> Self {
        let terms = terms(&document.text);
        Self { document, terms }
    }
}

/// Distinct lower-cased words, stop words removed
fn terms(text: &str) -> HashSet<String> {
    text.unicode_words()
        .map(str::to_lowercase)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

#[async_trait]
impl Retriever for InMemoryRetriever {
    async fn retrieve(&self, question: &str) -> Result<Vec<Document>, DomainError> {
        let query_terms = terms(question);
        if query_terms.is_empty() {
            debug!("Question has no searchable terms");
            return Ok(Vec::new());
        }

        let passages = self.passages.read().await;
        let total = query_terms.len() as f32;

        let mut scored: Vec<(f32, &Document)> = passages
            .iter()
            .map(|p| {
                let hits = query_terms.intersection(&p.terms).count() as f32;
                (hits / total, &p.document)
            })
            .filter(|(score, _)| *score >= self.config.score_threshold)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        debug!(
            candidates = passages.len(),
            matched = scored.len(),
            top_k = self.config.top_k,
            "Scored passages"
        );

        Ok(scored
            .into_iter()
            .take(self.config.top_k)
            .map(|(_, document)| document.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(top_k: usize, score_threshold: f32) -> RetrievalConfig {
        RetrievalConfig {
            top_k,
            score_threshold,
        }
    }

    fn corpus() -> Vec<Document> {
        vec![
            Document::on_page("Rust ownership rules prevent data races.", 1),
            Document::on_page("The borrow checker enforces ownership.", 2),
            Document::on_page("Tokio is an asynchronous runtime.", 3),
            Document::on_page("Ownership in Rust is checked at compile time.", 4),
        ]
    }

    fn pages(documents: &[Document]) -> Vec<u32> {
        documents.iter().filter_map(|d| d.source.page).collect()
    }

    #[tokio::test]
    async fn test_ranks_by_term_overlap() {
        let retriever = InMemoryRetriever::with_documents(config(4, 0.4), corpus());

        let results = retriever.retrieve("What is Rust ownership?").await.unwrap();

        // pages 1 and 4 match both terms; page 2 matches one of two
        assert_eq!(pages(&results), vec![1, 4, 2]);
    }

    #[tokio::test]
    async fn test_threshold_filters_weak_matches() {
        let retriever = InMemoryRetriever::with_documents(config(4, 0.9), corpus());

        let results = retriever.retrieve("rust ownership").await.unwrap();
        assert_eq!(pages(&results), vec![1, 4]);
    }

    #[tokio::test]
    async fn test_top_k_truncates() {
        let retriever = InMemoryRetriever::with_documents(config(1, 0.0), corpus());

        let results = retriever.retrieve("ownership").await.unwrap();
        assert_eq!(pages(&results), vec![1]);
    }

    #[tokio::test]
    async fn test_no_match_is_empty_not_error() {
        let retriever = InMemoryRetriever::with_documents(config(4, 0.4), corpus());

        assert!(retriever.retrieve("quantum chromodynamics").await.unwrap().is_empty());
        assert!(retriever.retrieve("what is the").await.unwrap().is_empty());
        assert!(retriever.retrieve("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_matching_is_case_insensitive() {
        let retriever = InMemoryRetriever::new(config(4, 0.4));
        assert!(retriever.is_empty().await);

        let added = retriever
            .add_documents(vec![Document::on_page("TOKIO RUNTIME", 7)])
            .await;
        assert_eq!(added, 1);
        assert_eq!(retriever.len().await, 1);

        let results = retriever.retrieve("tokio").await.unwrap();
        assert_eq!(pages(&results), vec![7]);
    }
}

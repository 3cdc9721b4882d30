use serde::{Deserialize, Serialize};

use crate::domain::retrieval::Document;

/// Mutable record threaded through every node of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Current, possibly rewritten, question
    pub question: String,
    /// Candidate passages; replaced wholesale by retrieval and filtering
    pub documents: Vec<Document>,
    /// Latest generated answer
    pub generation: Option<String>,
    /// Number of query rewrites performed so far
    pub iterations: u32,
}

impl WorkflowState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            documents: Vec::new(),
            generation: None,
            iterations: 0,
        }
    }

    pub fn has_documents(&self) -> bool {
        !self.documents.is_empty()
    }

    /// Whether no further query rewrite is allowed
    pub fn budget_exhausted(&self, max_iterations: u32) -> bool {
        self.iterations >= max_iterations
    }
}

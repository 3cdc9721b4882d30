//! Workflow error types

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::NodeId;
use crate::domain::DomainError;

/// External collaborators the loop depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collaborator {
    Retriever,
    AnswerGenerator,
    RelevanceGrader,
    GroundednessGrader,
    AnswerGrader,
    QuestionRewriter,
}

impl Collaborator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retriever => "retriever",
            Self::AnswerGenerator => "answer generator",
            Self::RelevanceGrader => "relevance grader",
            Self::GroundednessGrader => "groundedness grader",
            Self::AnswerGrader => "answer grader",
            Self::QuestionRewriter => "question rewriter",
        }
    }
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that abort a workflow run
///
/// Exhausting the retry budget and retrieving nothing are outcomes, not errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorkflowError {
    #[error("{collaborator} failed: {source}")]
    Collaborator {
        collaborator: Collaborator,
        source: DomainError,
    },

    #[error("Workflow cancelled before node '{node}'")]
    Cancelled { node: NodeId },
}

impl WorkflowError {
    pub fn collaborator(collaborator: Collaborator, source: DomainError) -> Self {
        Self::Collaborator {
            collaborator,
            source,
        }
    }

    pub fn cancelled(node: NodeId) -> Self {
        Self::Cancelled { node }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Curried constructor for `map_err`
    pub fn from_collaborator(collaborator: Collaborator) -> impl FnOnce(DomainError) -> Self {
        move |source| Self::collaborator(collaborator, source)
    }
}

//! Language-model collaborators consumed by the loop
//!
//! Each trait is a narrow seam: the loop only cares about the text or the
//! binary verdict returned, never about prompts or models.

use async_trait::async_trait;

use super::GradeResult;
use crate::domain::retrieval::Document;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Produces an answer from context passages
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, context: &[Document], question: &str) -> Result<String, DomainError>;
}

/// Judges whether one passage is relevant to the question
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RelevanceGrader: Send + Sync {
    async fn grade_relevance(
        &self,
        question: &str,
        document_text: &str,
    ) -> Result<GradeResult, DomainError>;
}

/// Judges whether a generation is supported by the passages
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GroundednessGrader: Send + Sync {
    async fn grade_groundedness(
        &self,
        documents: &[Document],
        generation: &str,
    ) -> Result<GradeResult, DomainError>;
}

/// Judges whether a generation addresses the question
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AnswerGrader: Send + Sync {
    async fn grade_adequacy(
        &self,
        question: &str,
        generation: &str,
    ) -> Result<GradeResult, DomainError>;
}

/// Rewrites a question into a form better suited to retrieval
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QuestionRewriter: Send + Sync {
    async fn rewrite_question(&self, question: &str) -> Result<String, DomainError>;
}

use async_trait::async_trait;

use super::Document;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Source of candidate passages for a question
///
/// Returning no passages is a normal result, not an error.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve passages for the question, best match first
    async fn retrieve(&self, question: &str) -> Result<Vec<Document>, DomainError>;
}

//! Workflow configuration

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

pub const DEFAULT_FALLBACK_MESSAGE: &str = "Sorry, I couldn't find an answer for your question.";

/// Settings fixed when the workflow is constructed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Maximum number of query rewrites before giving up
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Relevance grader calls allowed in flight at once
    #[serde(default = "default_grading_concurrency")]
    pub grading_concurrency: usize,
    /// Answer returned when the retry budget is exhausted
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
}

fn default_max_iterations() -> u32 {
    1
}

fn default_grading_concurrency() -> usize {
    4
}

fn default_fallback_message() -> String {
    DEFAULT_FALLBACK_MESSAGE.to_string()
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            grading_concurrency: default_grading_concurrency(),
            fallback_message: default_fallback_message(),
        }
    }
}

impl WorkflowConfig {
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_grading_concurrency(mut self, concurrency: usize) -> Self {
        self.grading_concurrency = concurrency;
        self
    }

    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.grading_concurrency == 0 {
            return Err(DomainError::configuration(
                "grading_concurrency must be greater than 0",
            ));
        }

        if self.fallback_message.trim().is_empty() {
            return Err(DomainError::configuration(
                "fallback_message must not be empty",
            ));
        }

        Ok(())
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::retrieval::Document;

/// How a run terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Grounded answer that addresses the question
    Answered,
    /// Retry budget spent; the generation is the fallback message
    Exhausted,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Answered => "answered",
            Self::Exhausted => "exhausted",
        }
    }
}

/// Final result of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowOutcome {
    pub run_id: Uuid,
    pub status: OutcomeStatus,
    pub generation: String,
    /// Supporting passages; always empty for the fallback message
    pub source_documents: Vec<Document>,
    /// Question as it stood when the run ended
    pub question: String,
    pub iterations: u32,
    pub retrieval_passes: u32,
}

impl WorkflowOutcome {
    pub fn is_answered(&self) -> bool {
        self.status == OutcomeStatus::Answered
    }
}

//! Decision tables of the two routers
//!
//! Both are pure functions of the grading results and the retry counter so they
//! can be checked exhaustively without any collaborator.

use super::{GenerateDecision, QualityDecision, WorkflowState};

/// Combined verdict of the groundedness and adequacy checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationVerdict {
    Accepted,
    NotGrounded,
    NotAdequate,
}

impl GenerationVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Route after filtering: generate if anything survived, otherwise rewrite
/// until the budget runs out.
pub fn decide_to_generate(state: &WorkflowState, max_iterations: u32) -> GenerateDecision {
    if state.has_documents() {
        GenerateDecision::Generate
    } else if state.budget_exhausted(max_iterations) {
        GenerateDecision::EndWithMessage
    } else {
        GenerateDecision::TransformQuery
    }
}

/// Route after generating: accept, retry with a rewritten question, or give up.
pub fn decide_generation_quality(
    verdict: GenerationVerdict,
    state: &WorkflowState,
    max_iterations: u32,
) -> QualityDecision {
    if verdict.is_accepted() {
        QualityDecision::Useful
    } else if state.budget_exhausted(max_iterations) {
        QualityDecision::EndWithMessage
    } else {
        QualityDecision::NotUseful
    }
}

use async_trait::async_trait;

use super::generator::format_context;
use super::prompts::{
    render, ADEQUACY_HUMAN_PROMPT, ADEQUACY_SYSTEM_PROMPT, GRADE_FORMAT_INSTRUCTIONS,
    GROUNDEDNESS_HUMAN_PROMPT, GROUNDEDNESS_SYSTEM_PROMPT, RELEVANCE_HUMAN_PROMPT,
    RELEVANCE_SYSTEM_PROMPT,
};
use super::LlmChain;
use crate::domain::grading::{AnswerGrader, GradeResult, GroundednessGrader, RelevanceGrader};
use crate::domain::retrieval::Document;
use crate::domain::DomainError;

fn system_prompt(template: &str) -> String {
    render(template, &[("format_instructions", GRADE_FORMAT_INSTRUCTIONS)])
}

/// Relevance of one passage to the question
#[derive(Debug, Clone)]
pub struct LlmRelevanceGrader {
    chain: LlmChain,
}

impl LlmRelevanceGrader {
    pub fn new(chain: LlmChain) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl RelevanceGrader for LlmRelevanceGrader {
    async fn grade_relevance(
        &self,
        question: &str,
        document_text: &str,
    ) -> Result<GradeResult, DomainError> {
        let human = render(
            RELEVANCE_HUMAN_PROMPT,
            &[("document", document_text), ("question", question)],
        );

        self.chain
            .grade("retrieval_grader", system_prompt(RELEVANCE_SYSTEM_PROMPT), human)
            .await
    }
}

/// Support of a generation by the passages
#[derive(Debug, Clone)]
pub struct LlmGroundednessGrader {
    chain: LlmChain,
}

impl LlmGroundednessGrader {
    pub fn new(chain: LlmChain) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl GroundednessGrader for LlmGroundednessGrader {
    async fn grade_groundedness(
        &self,
        documents: &[Document],
        generation: &str,
    ) -> Result<GradeResult, DomainError> {
        let human = render(
            GROUNDEDNESS_HUMAN_PROMPT,
            &[
                ("documents", &format_context(documents)),
                ("generation", generation),
            ],
        );

        self.chain
            .grade(
                "hallucination_grader",
                system_prompt(GROUNDEDNESS_SYSTEM_PROMPT),
                human,
            )
            .await
    }
}

/// Whether a generation resolves the question
#[derive(Debug, Clone)]
pub struct LlmAnswerGrader {
    chain: LlmChain,
}

impl LlmAnswerGrader {
    pub fn new(chain: LlmChain) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl AnswerGrader for LlmAnswerGrader {
    async fn grade_adequacy(
        &self,
        question: &str,
        generation: &str,
    ) -> Result<GradeResult, DomainError> {
        let human = render(
            ADEQUACY_HUMAN_PROMPT,
            &[("question", question), ("generation", generation)],
        );

        self.chain
            .grade("answer_grader", system_prompt(ADEQUACY_SYSTEM_PROMPT), human)
            .await
    }
}

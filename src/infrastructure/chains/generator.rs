use async_trait::async_trait;

use super::prompts::{render, ANSWER_PROMPT};
use super::LlmChain;
use crate::domain::grading::AnswerGenerator;
use crate::domain::retrieval::Document;
use crate::domain::DomainError;

/// Answers from the concatenated context passages
#[derive(Debug, Clone)]
pub struct LlmAnswerGenerator {
    chain: LlmChain,
}

impl LlmAnswerGenerator {
    pub fn new(chain: LlmChain) -> Self {
        Self { chain }
    }
}

/// Passages separated by blank lines, in order
pub fn format_context(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl AnswerGenerator for LlmAnswerGenerator {
    async fn generate(&self, context: &[Document], question: &str) -> Result<String, DomainError> {
        let prompt = render(
            ANSWER_PROMPT,
            &[("question", question), ("context", &format_context(context))],
        );

        self.chain.complete("rag_chain", None, prompt).await
    }
}

use async_trait::async_trait;

use super::prompts::{render, REWRITE_HUMAN_PROMPT, REWRITE_SYSTEM_PROMPT};
use super::LlmChain;
use crate::domain::grading::QuestionRewriter;
use crate::domain::DomainError;

/// Rephrases a question for retrieval
#[derive(Debug, Clone)]
pub struct LlmQuestionRewriter {
    chain: LlmChain,
}

impl LlmQuestionRewriter {
    pub fn new(chain: LlmChain) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl QuestionRewriter for LlmQuestionRewriter {
    async fn rewrite_question(&self, question: &str) -> Result<String, DomainError> {
        let human = render(REWRITE_HUMAN_PROMPT, &[("question", question)]);

        self.chain
            .complete("question_rewriter", Some(REWRITE_SYSTEM_PROMPT.to_string()), human)
            .await
    }
}

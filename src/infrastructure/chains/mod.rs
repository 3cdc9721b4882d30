//! Language-model backed collaborators
//!
//! Each collaborator wraps an [`LlmChain`]: a provider, a model name and a
//! sampling temperature.

mod chain;
mod generator;
mod graders;
pub mod prompts;
mod rewriter;

pub use chain::LlmChain;
pub use generator::{format_context, LlmAnswerGenerator};
pub use graders::{LlmAnswerGrader, LlmGroundednessGrader, LlmRelevanceGrader};
pub use rewriter::LlmQuestionRewriter;

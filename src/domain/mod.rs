//! Domain layer - Core types, collaborator seams and the workflow driver

pub mod error;
pub mod grading;
pub mod ingestion;
pub mod llm;
pub mod retrieval;
pub mod workflow;

pub use error::DomainError;
pub use grading::{
    AnswerGenerator, AnswerGrader, BinaryScore, GradeResult, GroundednessGrader, QuestionRewriter,
    RelevanceGrader,
};
pub use ingestion::{Chunk, ChunkingConfig, ChunkingStrategy};
pub use llm::{
    FinishReason, LlmProvider, LlmRequest, LlmRequestBuilder, LlmResponse, LlmResponseFormat,
    Message, MessageRole, Usage,
};
pub use retrieval::{Document, Retriever, SourceLocator};
pub use workflow::{
    AdaptiveRagWorkflow, Collaborators, NodeId, OutcomeStatus, WorkflowConfig, WorkflowError,
    WorkflowEvent, WorkflowEventBus, WorkflowOutcome, WorkflowState,
};

//! Wiring shared by the ask and chat commands

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::{AppConfig, LlmConfig};
use crate::domain::llm::LlmProvider;
use crate::domain::retrieval::Retriever;
use crate::domain::workflow::{AdaptiveRagWorkflow, Collaborators};
use crate::infrastructure::chains::{
    LlmAnswerGenerator, LlmAnswerGrader, LlmChain, LlmGroundednessGrader, LlmQuestionRewriter,
    LlmRelevanceGrader,
};
use crate::infrastructure::ingestion::DocumentLoader;
use crate::infrastructure::llm::LlmProviderFactory;
use crate::infrastructure::retrieval::InMemoryRetriever;

/// Language-model collaborators around a retriever
pub fn collaborators(
    provider: Arc<dyn LlmProvider>,
    llm: &LlmConfig,
    retriever: Arc<dyn Retriever>,
) -> Collaborators {
    let chain = LlmChain::new(Arc::clone(&provider), &llm.model, llm.temperature);
    let relevance_chain = LlmChain::new(provider, llm.relevance_model(), llm.temperature);

    Collaborators {
        retriever,
        generator: Arc::new(LlmAnswerGenerator::new(chain.clone())),
        relevance_grader: Arc::new(LlmRelevanceGrader::new(relevance_chain)),
        groundedness_grader: Arc::new(LlmGroundednessGrader::new(chain.clone())),
        answer_grader: Arc::new(LlmAnswerGrader::new(chain.clone())),
        rewriter: Arc::new(LlmQuestionRewriter::new(chain)),
    }
}

/// Index `file` and build a workflow answering from it
pub async fn build_workflow(config: &AppConfig, file: &Path) -> anyhow::Result<AdaptiveRagWorkflow> {
    config.validate().context("Invalid configuration")?;

    let documents = DocumentLoader::new(config.ingestion.clone())
        .load_file(file)
        .await
        .with_context(|| format!("Failed to index {}", file.display()))?;

    info!(passages = documents.len(), file = %file.display(), "Indexed document");

    let retriever = Arc::new(InMemoryRetriever::with_documents(
        config.retrieval.clone(),
        documents,
    ));
    let provider = LlmProviderFactory::create(&config.llm)?;

    Ok(AdaptiveRagWorkflow::new(
        collaborators(provider, &config.llm, retriever),
        config.workflow.clone(),
    ))
}

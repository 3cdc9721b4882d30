use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::grading::GradeResult;
use crate::domain::llm::{LlmProvider, LlmRequest};
use crate::domain::DomainError;

/// A model bound to a provider and sampling settings
#[derive(Debug, Clone)]
pub struct LlmChain {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
}

impl LlmChain {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Free-text completion; blank output is an error
    pub(super) async fn complete(
        &self,
        run_name: &'static str,
        system: Option<String>,
        human: String,
    ) -> Result<String, DomainError> {
        let mut builder = LlmRequest::builder();
        if let Some(system) = system {
            builder = builder.system(system);
        }
        let request = builder.user(human).temperature(self.temperature).build();

        debug!(run_name, model = %self.model, "Calling language model");
        let response = self.provider.chat(&self.model, request).await?;

        let text = response.content().trim();
        if text.is_empty() {
            return Err(DomainError::provider(run_name, "Empty response from LLM"));
        }

        Ok(text.to_string())
    }

    /// Binary grade in JSON-object mode, parsed strictly
    pub(super) async fn grade(
        &self,
        run_name: &'static str,
        system: String,
        human: String,
    ) -> Result<GradeResult, DomainError> {
        let request = LlmRequest::builder()
            .system(system)
            .user(human)
            .temperature(self.temperature)
            .json_object()
            .build();

        debug!(run_name, model = %self.model, "Calling grader model");
        let response = self.provider.chat(&self.model, request).await?;

        GradeResult::parse(response.content()).inspect_err(|e| {
            warn!(run_name, error = %e, "Grader returned an unusable verdict");
        })
    }
}

use std::sync::Arc;
use std::time::Duration;

use super::http_client::HttpClient;
use super::openai::{OpenAiProvider, DEFAULT_OPENAI_BASE_URL};
use crate::config::LlmConfig;
use crate::domain::{DomainError, LlmProvider};

/// Factory for creating LLM providers
#[derive(Debug)]
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create the chat provider described by configuration
    ///
    /// An API key is only mandatory for the hosted OpenAI endpoint; local
    /// OpenAI-compatible servers usually accept any bearer token.
    pub fn create(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, DomainError> {
        let base_url = config.base_url.trim_end_matches('/');

        if config.api_key.is_empty() && base_url == DEFAULT_OPENAI_BASE_URL {
            return Err(DomainError::configuration(
                "llm.api_key (or OPENAI_API_KEY) is required for api.openai.com",
            ));
        }

        let client = HttpClient::with_timeout(Duration::from_secs(config.timeout_secs))?;

        Ok(Arc::new(OpenAiProvider::with_base_url(
            client,
            config.api_key.as_str(),
            base_url,
        )))
    }

    /// Create an OpenAI provider directly
    pub fn create_openai(api_key: impl Into<String>) -> Arc<dyn LlmProvider> {
        Arc::new(OpenAiProvider::new(HttpClient::new(), api_key))
    }
}

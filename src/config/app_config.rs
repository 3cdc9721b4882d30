use std::fmt;
use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

use crate::domain::ingestion::ChunkingConfig;
use crate::domain::workflow::WorkflowConfig;
use crate::domain::DomainError;

const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub llm: LlmConfig,
    pub workflow: WorkflowConfig,
    pub retrieval: RetrievalConfig,
    pub ingestion: ChunkingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Chat completion endpoint settings
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Model used for relevance grading; `model` when unset
    pub relevance_model: Option<String>,
    pub temperature: f32,
    pub timeout_secs: u64,
}

/// Prometheus exporter settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve `/metrics` while the command runs
    pub enabled: bool,
    pub listen: String,
}

/// In-memory retriever settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub score_threshold: f32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            relevance_model: None,
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("model", &self.model)
            .field("relevance_model", &self.relevance_model)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl LlmConfig {
    pub fn relevance_model(&self) -> &str {
        self.relevance_model.as_deref().unwrap_or(&self.model)
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            score_threshold: 0.4,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: "127.0.0.1:9000".to_string(),
        }
    }
}

impl MetricsConfig {
    pub fn listen_addr(&self) -> Result<SocketAddr, DomainError> {
        self.listen.parse().map_err(|e| {
            DomainError::configuration(format!(
                "metrics.listen must be a socket address, got '{}': {}",
                self.listen, e
            ))
        })
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with(None)
    }

    /// Load layered configuration, with an optional extra file applied last
    /// before the environment
    pub fn load_with(extra: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        if let Some(path) = extra {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("RAG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app: Self = config.try_deserialize()?;

        if app.llm.api_key.is_empty() {
            if let Ok(key) = std::env::var(OPENAI_API_KEY_VAR) {
                app.llm.api_key = key;
            }
        }

        Ok(app)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.llm.model.trim().is_empty() {
            return Err(DomainError::configuration("llm.model must not be empty"));
        }

        if self.llm.timeout_secs == 0 {
            return Err(DomainError::configuration(
                "llm.timeout_secs must be greater than 0",
            ));
        }

        self.workflow.validate()?;

        if self.retrieval.top_k == 0 {
            return Err(DomainError::configuration(
                "retrieval.top_k must be greater than 0",
            ));
        }

        if !(0.0..=1.0).contains(&self.retrieval.score_threshold) {
            return Err(DomainError::configuration(format!(
                "retrieval.score_threshold must be within [0, 1], got {}",
                self.retrieval.score_threshold
            )));
        }

        if self.metrics.enabled {
            self.metrics.listen_addr()?;
        }

        self.ingestion
            .validate()
            .map_err(|e| DomainError::configuration(format!("ingestion: {}", e)))
    }
}

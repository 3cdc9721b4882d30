//! Infrastructure layer - External service implementations

pub mod chains;
pub mod ingestion;
pub mod llm;
pub mod logging;
pub mod observability;
pub mod retrieval;

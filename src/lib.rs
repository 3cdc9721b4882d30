//! Adaptive RAG
//!
//! Self-correcting question answering over a single document:
//! - Lexical retrieval over page-aware chunks
//! - Per-passage relevance grading with a bounded question rewrite loop
//! - Groundedness and adequacy checks on every generated answer
//! - Workflow progress published as events for rendering and metrics

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

//! Retrieval domain types

mod document;
mod retriever;

pub use document::{Document, SourceLocator};
pub use retriever::Retriever;

#[cfg(test)]
pub use retriever::MockRetriever;

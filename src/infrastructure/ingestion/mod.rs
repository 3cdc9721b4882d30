//! Document ingestion infrastructure

mod loader;
pub mod pdf;
mod recursive;

pub use loader::{DocumentLoader, PAGE_BREAK};
pub use recursive::RecursiveChunker;
